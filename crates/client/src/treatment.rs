//! Treatment requests between patients and doctors.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{endpoint, filters, ApiClient, ApiError, RequestBody};

/// A doctor's answer to a pending treatment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentResponse {
    Accepted,
    Rejected,
}

impl TreatmentResponse {
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentResponse::Accepted => "accepted",
            TreatmentResponse::Rejected => "rejected",
        }
    }
}

pub struct TreatmentApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn treatment(&self) -> TreatmentApi<'_> {
        TreatmentApi { client: self }
    }
}

impl TreatmentApi<'_> {
    /// Patient asks a doctor for treatment.
    pub async fn create(&self, request: &Value) -> Result<Value, ApiError> {
        self.client.post_json("/treatment-requests", request).await
    }

    /// Requests visible to the caller: their own as a patient, addressed to
    /// them as a doctor, all of them as an admin.
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let query = filters(&[("status", status)]);
        self.client
            .get_with_query("/treatment-requests", &query)
            .await
    }

    /// The answer travels as the `response` query parameter with no body.
    pub async fn respond(
        &self,
        request_id: &str,
        response: TreatmentResponse,
    ) -> Result<Value, ApiError> {
        self.client
            .request(
                reqwest::Method::PUT,
                &endpoint(&["treatment-requests", request_id, "respond"])?,
                RequestBody::Empty,
                &[("response", response.as_str().to_string())],
            )
            .await
    }

    pub async fn update_notes(
        &self,
        request_id: &str,
        treatment_notes: &str,
        status: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.client
            .put_json(
                &endpoint(&["treatment-requests", request_id, "notes"])?,
                &json!({ "treatment_notes": treatment_notes, "status": status }),
            )
            .await
    }
}
