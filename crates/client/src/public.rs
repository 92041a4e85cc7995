//! Endpoints served without a token: landing page content and events.

use serde_json::Value;

use crate::api::{endpoint, ApiClient, ApiError};

pub struct PublicApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn public(&self) -> PublicApi<'_> {
        PublicApi { client: self }
    }
}

impl PublicApi<'_> {
    pub async fn site_settings(&self) -> Result<Value, ApiError> {
        self.client.get("/site-settings").await
    }

    pub async fn events(&self) -> Result<Vec<Value>, ApiError> {
        self.client.get("/events").await
    }

    pub async fn event(&self, event_id: &str) -> Result<Value, ApiError> {
        self.client.get(&endpoint(&["events", event_id])?).await
    }
}
