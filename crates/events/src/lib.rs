//! Session event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SessionEvent`]: session transitions, plus the 401 signal raised by
//!   the API client and navigation requests for whoever renders pages.

pub mod bus;

pub use bus::{EventBus, LogoutReason, SessionEvent, SessionEventKind};
