//! Client-side session for HavenWelfare.
//!
//! - [`store::SessionStore`]: the single authoritative session, with its
//!   startup revalidation and the forced logout on 401.
//! - [`credentials::CredentialStore`]: the durable token and profile record.
//! - [`guard::guard`] and [`routes::navigate`]: who may see which page.

pub mod credentials;
pub mod guard;
pub mod policy;
pub mod routes;
pub mod storage;
pub mod store;

pub use credentials::{CredentialState, CredentialStore, Credentials};
pub use guard::{guard, GuardDecision};
pub use policy::{BackoffConfig, RevalidationMode, RevalidationPolicy};
pub use routes::{navigate, resolve, Route};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{SessionError, SessionSnapshot, SessionStore};
