//! `/auth/*` endpoints.
//!
//! Every call validates its payload locally first; a rejected payload never
//! reaches the network.

use haven_core::auth::{
    validate_input, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use haven_core::UserProfile;

use crate::api::{ApiClient, ApiError};

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }
}

impl AuthApi<'_> {
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        validate_input(&body)?;
        self.client.post_json("/auth/login", &body).await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<UserProfile, ApiError> {
        validate_input(body)?;
        self.client.post_json("/auth/register", body).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        validate_input(&body)?;
        self.client.post_json("/auth/forgot-password", &body).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        validate_input(&body)?;
        self.client.post_json("/auth/reset-password", &body).await
    }

    /// The account the current bearer token belongs to.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.client.get("/auth/me").await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        validate_input(&body)?;
        self.client.put_json("/auth/change-password", &body).await
    }

    pub async fn update_profile(
        &self,
        body: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        validate_input(body)?;
        self.client.put_json("/auth/profile", body).await
    }
}
