//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`SessionEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` between the API client,
//! the session store and whatever renders the UI.

use chrono::{DateTime, Utc};
use haven_core::roles::{Role, LOGIN_PATH};
use haven_core::types::RecordId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Why the session went back to anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// A backend call answered 401.
    Unauthenticated,
    /// The startup "get current user" round-trip failed.
    RevalidationFailed,
    /// Durable storage held a partial or undecodable credential record.
    CorruptCredentials,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The backend rejected a request with 401. Emitted by the API client;
    /// `path` is the API path of the rejected request and `sent_at` the
    /// moment it left the client.
    Unauthenticated {
        path: String,
        sent_at: DateTime<Utc>,
    },
    /// Login succeeded or the startup revalidation confirmed the session.
    LoggedIn { user_id: RecordId, role: Role },
    /// Session cleared from memory and durable storage.
    LoggedOut { reason: LogoutReason },
    /// The cached profile was replaced.
    ProfileUpdated { user_id: RecordId },
    /// The presentation layer should move to `to`. `replace` means the
    /// current page must not stay in the back-navigation history.
    Navigate { to: String, replace: bool },
}

/// A session event with the time it was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(flatten)]
    pub kind: SessionEventKind,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn unauthenticated(path: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::new(SessionEventKind::Unauthenticated {
            path: path.into(),
            sent_at,
        })
    }

    pub fn logged_in(user_id: impl Into<RecordId>, role: Role) -> Self {
        Self::new(SessionEventKind::LoggedIn {
            user_id: user_id.into(),
            role,
        })
    }

    pub fn logged_out(reason: LogoutReason) -> Self {
        Self::new(SessionEventKind::LoggedOut { reason })
    }

    pub fn profile_updated(user_id: impl Into<RecordId>) -> Self {
        Self::new(SessionEventKind::ProfileUpdated {
            user_id: user_id.into(),
        })
    }

    /// Replace-navigation to the login screen.
    pub fn to_login() -> Self {
        Self::new(SessionEventKind::Navigate {
            to: LOGIN_PATH.to_string(),
            replace: true,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use haven_events::bus::{EventBus, SessionEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(SessionEvent::to_login());
/// ```
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!(event = ?event.kind, "Publishing session event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
