//! HTTP client for the HavenWelfare backend.
//!
//! Provides the authenticated request pipeline with its global 401 signal,
//! connection configuration, file uploads, and one thin wrapper per
//! backend resource group.

pub mod admin;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod doctors;
pub mod donations;
pub mod public;
pub mod treatment;
pub mod upload;

pub use api::{ApiClient, ApiError, NoToken, RequestBody, TokenSource};
pub use config::{ClientConfig, ConfigError};
pub use upload::Upload;
