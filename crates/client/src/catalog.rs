//! Reference data maintained by admins: rehab centers and addiction types.

use serde_json::Value;

use crate::api::{endpoint, filters, ApiClient, ApiError};

pub struct RehabCentersApi<'a> {
    client: &'a ApiClient,
}

pub struct AddictionTypesApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn rehab_centers(&self) -> RehabCentersApi<'_> {
        RehabCentersApi { client: self }
    }

    pub fn addiction_types(&self) -> AddictionTypesApi<'_> {
        AddictionTypesApi { client: self }
    }
}

impl RehabCentersApi<'_> {
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let query = filters(&[("status", status)]);
        self.client.get_with_query("/rehab-centers", &query).await
    }

    pub async fn get(&self, center_id: &str) -> Result<Value, ApiError> {
        self.client.get(&endpoint(&["rehab-centers", center_id])?).await
    }

    pub async fn create(&self, center: &Value) -> Result<Value, ApiError> {
        self.client.post_json("/rehab-centers", center).await
    }

    pub async fn update(&self, center_id: &str, center: &Value) -> Result<Value, ApiError> {
        self.client
            .put_json(&endpoint(&["rehab-centers", center_id])?, center)
            .await
    }

    pub async fn delete(&self, center_id: &str) -> Result<Value, ApiError> {
        self.client
            .delete(&endpoint(&["rehab-centers", center_id])?)
            .await
    }
}

impl AddictionTypesApi<'_> {
    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        self.client.get("/addiction-types").await
    }

    pub async fn create(&self, addiction_type: &Value) -> Result<Value, ApiError> {
        self.client.post_json("/addiction-types", addiction_type).await
    }

    pub async fn update(&self, type_id: &str, addiction_type: &Value) -> Result<Value, ApiError> {
        self.client
            .put_json(&endpoint(&["addiction-types", type_id])?, addiction_type)
            .await
    }

    pub async fn delete(&self, type_id: &str) -> Result<Value, ApiError> {
        self.client
            .delete(&endpoint(&["addiction-types", type_id])?)
            .await
    }
}
