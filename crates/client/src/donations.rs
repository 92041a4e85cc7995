//! Donation submission, tracking and admin review.
//!
//! Submission is public: donors do not need an account. The payment proof
//! screenshot travels in the same multipart form as the donation fields.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{endpoint, filters, ApiClient, ApiError};
use crate::upload::Upload;

/// Admin verdict on a submitted donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationDecision {
    Approved,
    Rejected,
}

impl DonationDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            DonationDecision::Approved => "approved",
            DonationDecision::Rejected => "rejected",
        }
    }
}

/// A donation as entered on the donor portal.
#[derive(Debug, Clone)]
pub struct DonationSubmission {
    pub patient_id: String,
    pub amount: f64,
    pub transaction_id: String,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    pub screenshot: Option<Upload>,
}

impl DonationSubmission {
    pub fn new(patient_id: impl Into<String>, amount: f64, transaction_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            amount,
            transaction_id: transaction_id.into(),
            donor_name: None,
            donor_email: None,
            donor_phone: None,
            screenshot: None,
        }
    }

    /// Multipart form with one text field per present value and the
    /// screenshot under `screenshot`.
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("patient_id", self.patient_id)
            .text("amount", self.amount.to_string())
            .text("transaction_id", self.transaction_id);

        let optional = [
            ("donor_name", self.donor_name),
            ("donor_email", self.donor_email),
            ("donor_phone", self.donor_phone),
        ];
        for (name, value) in optional {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                form = form.text(name, value);
            }
        }

        if let Some(screenshot) = self.screenshot {
            form = form.part("screenshot", screenshot.into_part()?);
        }
        Ok(form)
    }
}

pub struct DonationsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn donations(&self) -> DonationsApi<'_> {
        DonationsApi { client: self }
    }
}

impl DonationsApi<'_> {
    /// Bank and QR details shown to donors.
    pub async fn payment_info(&self) -> Result<Value, ApiError> {
        self.client.get("/donations/payment-info").await
    }

    /// Patients accepting donations.
    pub async fn patients(&self) -> Result<Vec<Value>, ApiError> {
        self.client.get("/donations/patients").await
    }

    pub async fn submit(&self, submission: DonationSubmission) -> Result<Value, ApiError> {
        if submission.amount <= 0.0 || !submission.amount.is_finite() {
            return Err(haven_core::CoreError::Validation(
                "amount: must be a positive number".into(),
            )
            .into());
        }
        self.client
            .post_multipart("/donations", submission.into_form()?)
            .await
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let query = filters(&[("status", status)]);
        self.client.get_with_query("/donations", &query).await
    }

    pub async fn get(&self, donation_id: &str) -> Result<Value, ApiError> {
        self.client.get(&endpoint(&["donations", donation_id])?).await
    }

    /// Public status lookup by the donor's payment transaction id.
    pub async fn track(&self, transaction_id: &str) -> Result<Value, ApiError> {
        self.client
            .get(&endpoint(&["donations", "track", transaction_id])?)
            .await
    }

    pub async fn approve(
        &self,
        donation_id: &str,
        decision: DonationDecision,
        admin_remarks: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.client
            .put_json(
                &endpoint(&["donations", donation_id, "approve"])?,
                &json!({ "status": decision, "admin_remarks": admin_remarks }),
            )
            .await
    }

    /// Receipt data for an approved donation. The backend answers 400 for
    /// any other status.
    pub async fn receipt(&self, donation_id: &str) -> Result<Value, ApiError> {
        self.client
            .get(&endpoint(&["donations", donation_id, "receipt"])?)
            .await
    }
}
