use haven_core::types::ProfileData;
use haven_core::UserProfile;
use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::upload::Upload;

pub struct DoctorsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn doctors(&self) -> DoctorsApi<'_> {
        DoctorsApi { client: self }
    }
}

impl DoctorsApi<'_> {
    /// Approved doctors a patient can choose from.
    pub async fn approved(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.client.get("/doctors").await
    }

    /// Returns `{ "document_url": ... }` for the stored file.
    pub async fn upload_verification_document(&self, file: Upload) -> Result<Value, ApiError> {
        self.client
            .post_multipart("/doctors/verification-document", file.into_form()?)
            .await
    }

    /// Merge keys into the caller's `profile_data`.
    pub async fn update_profile_data(&self, data: &ProfileData) -> Result<Value, ApiError> {
        self.client.put_json("/doctors/profile-data", data).await
    }
}
