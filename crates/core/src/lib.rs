//! HavenWelfare domain types.
//!
//! Shared by the API client, the session store and the CLI. This crate has
//! no internal dependencies and performs no I/O.

pub mod auth;
pub mod error;
pub mod navigation;
pub mod roles;
pub mod types;
pub mod user;

pub use error::CoreError;
pub use roles::{Role, UserStatus};
pub use user::UserProfile;
