//! `/admin/*` endpoints. Every call here needs an admin bearer token.

use haven_core::auth::{validate_input, UpdateProfileRequest};
use haven_core::{Role, UserProfile, UserStatus};
use serde_json::{json, Value};

use crate::api::{endpoint, filters, ApiClient, ApiError};
use crate::upload::Upload;

/// Default page size for the audit log, matching the dashboard.
pub const DEFAULT_AUDIT_LOG_LIMIT: u32 = 100;

pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi { client: self }
    }
}

impl AdminApi<'_> {
    /// All accounts, optionally filtered. Patient rows carry their donation
    /// history, so the rows stay untyped.
    pub async fn users(
        &self,
        status: Option<UserStatus>,
        role: Option<Role>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = filters(&[
            ("status", status.map(|s| s.as_str())),
            ("role", role.map(|r| r.as_str())),
        ]);
        self.client.get_with_query("/admin/users", &query).await
    }

    pub async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<Value, ApiError> {
        self.client
            .put_json(
                &endpoint(&["admin", "users", user_id, "status"])?,
                &json!({ "status": status }),
            )
            .await
    }

    pub async fn change_user_password(
        &self,
        user_id: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        self.client
            .put_json(
                &endpoint(&["admin", "users", user_id, "password"])?,
                &json!({ "new_password": new_password }),
            )
            .await
    }

    pub async fn update_admin_profile(
        &self,
        body: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        validate_input(body)?;
        self.client.put_json("/admin/profile", body).await
    }

    pub async fn analytics(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/analytics").await
    }

    pub async fn audit_logs(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client
            .get_with_query("/admin/audit-logs", &[("limit", limit.to_string())])
            .await
    }

    // ---- settings ----

    pub async fn payment_settings(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/payment-settings").await
    }

    pub async fn update_payment_settings(&self, settings: &Value) -> Result<Value, ApiError> {
        self.client.put_json("/admin/payment-settings", settings).await
    }

    pub async fn upload_qr_code(&self, file: Upload) -> Result<Value, ApiError> {
        self.client
            .post_multipart("/admin/payment-settings/qr-code", file.into_form()?)
            .await
    }

    pub async fn smtp_settings(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/smtp-settings").await
    }

    pub async fn update_smtp_settings(&self, settings: &Value) -> Result<Value, ApiError> {
        self.client.put_json("/admin/smtp-settings", settings).await
    }

    /// Site settings are readable without a token; only the update is
    /// admin-only.
    pub async fn site_settings(&self) -> Result<Value, ApiError> {
        self.client.get("/site-settings").await
    }

    pub async fn update_site_settings(&self, settings: &Value) -> Result<Value, ApiError> {
        self.client.put_json("/admin/site-settings", settings).await
    }

    // ---- events ----

    pub async fn events(&self) -> Result<Vec<Value>, ApiError> {
        self.client.get("/admin/events").await
    }

    pub async fn event(&self, event_id: &str) -> Result<Value, ApiError> {
        self.client.get(&endpoint(&["events", event_id])?).await
    }

    pub async fn create_event(&self, event: &Value) -> Result<Value, ApiError> {
        self.client.post_json("/admin/events", event).await
    }

    pub async fn update_event(&self, event_id: &str, event: &Value) -> Result<Value, ApiError> {
        self.client
            .put_json(&endpoint(&["admin", "events", event_id])?, event)
            .await
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<Value, ApiError> {
        self.client.delete(&endpoint(&["admin", "events", event_id])?).await
    }

    pub async fn upload_event_image(&self, event_id: &str, file: Upload) -> Result<Value, ApiError> {
        self.client
            .post_multipart(
                &endpoint(&["admin", "events", event_id, "upload-image"])?,
                file.into_form()?,
            )
            .await
    }
}
