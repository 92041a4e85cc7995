//! The authoritative client-side session.
//!
//! [`SessionStore`] is created once per process and shared as
//! `Arc<SessionStore>`. It is the only component that mutates the
//! in-memory session or the durable credential record.
//!
//! Lifecycle: `new` (loading, token read from storage) then `initialize`
//! (startup revalidation, at most once) then any sequence of `login`,
//! `logout` and `update_user`.
//!
//! Invariants:
//! - `is_authenticated() == (token.is_some() && user.is_some())`.
//! - Durable storage holds both token and profile or neither.
//! - Memory and durable storage change together: every write to the
//!   credential record happens while the state lock is held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use haven_client::{ApiClient, ApiError};
use haven_core::auth::{LoginResponse, MessageResponse, RegisterRequest, UpdateProfileRequest};
use haven_core::{CoreError, Role, UserProfile};
use haven_events::{EventBus, LogoutReason, SessionEvent, SessionEventKind};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::credentials::{CredentialState, CredentialStore};
use crate::policy::RevalidationPolicy;
use crate::storage::StorageError;

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Credential storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Not logged in")]
    NotAuthenticated,
}

impl SessionError {
    /// Text suitable for showing to the user. Backend messages pass
    /// through verbatim.
    pub fn message(&self) -> String {
        match self {
            SessionError::Api(e) => e.message(),
            other => other.to_string(),
        }
    }
}

/// Read-only view of the session at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

#[derive(Debug)]
struct SessionState {
    token: Option<String>,
    user: Option<UserProfile>,
    loading: bool,
    /// When the current session was established. A 401 for a request sent
    /// before this instant belongs to an earlier session and is ignored.
    since: Option<DateTime<Utc>>,
}

pub struct SessionStore {
    api: ApiClient,
    credentials: Arc<CredentialStore>,
    bus: Arc<EventBus>,
    policy: RevalidationPolicy,
    state: Mutex<SessionState>,
    initialized: AtomicBool,
}

impl SessionStore {
    pub fn new(
        api: ApiClient,
        credentials: Arc<CredentialStore>,
        bus: Arc<EventBus>,
        policy: RevalidationPolicy,
    ) -> Self {
        let token = credentials.token();
        Self {
            api,
            credentials,
            bus,
            policy,
            state: Mutex::new(SessionState {
                token,
                user: None,
                loading: true,
                since: None,
            }),
            initialized: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            token: state.token.clone(),
            user: state.user.clone(),
            loading: state.loading,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.state();
        state.token.is_some() && state.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    // ---- startup ----

    /// Revalidate the stored session against the backend.
    ///
    /// Runs at most once; later calls return the current snapshot. Never
    /// fails: anything that prevents confirming the session ends in a full
    /// logout.
    pub async fn initialize(&self) -> SessionSnapshot {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session already initialized");
            return self.snapshot();
        }

        match self.credentials.load() {
            Ok(CredentialState::Absent) => {
                tracing::info!("No stored session");
                let mut state = self.state();
                state.token = None;
                state.user = None;
            }
            Ok(CredentialState::Corrupt) => {
                tracing::warn!("Stored session is incomplete, clearing it");
                self.logout_with(LogoutReason::CorruptCredentials, true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored session, clearing it");
                self.logout_with(LogoutReason::CorruptCredentials, true);
            }
            Ok(CredentialState::Present(stored)) => {
                self.state().token = Some(stored.token.clone());
                match self.revalidate().await {
                    Ok(user) => self.establish(stored.token, user),
                    Err(e) => {
                        tracing::warn!(error = %e, "Startup revalidation failed");
                        self.logout_with(LogoutReason::RevalidationFailed, true);
                    }
                }
            }
        }

        self.state().loading = false;
        self.snapshot()
    }

    async fn revalidate(&self) -> Result<UserProfile, SessionError> {
        let mut attempt = 1u32;
        let mut delay = self.policy.initial_delay();
        loop {
            match self.api.auth().me().await {
                Ok(user) => return Ok(user),
                Err(e) => match self.policy.retry_after(&e, attempt, delay) {
                    Some(wait) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = wait.as_millis() as u64,
                            error = %e,
                            "Revalidation attempt failed, retrying",
                        );
                        tokio::time::sleep(wait).await;
                        delay = self.policy.next_delay(delay);
                        attempt += 1;
                    }
                    None => return Err(e.into()),
                },
            }
        }
    }

    /// Persist and adopt a confirmed session.
    fn establish(&self, token: String, user: UserProfile) {
        let (user_id, role) = (user.id.clone(), user.role);
        {
            let mut state = self.state();
            if let Err(e) = self.credentials.save(&token, &user) {
                tracing::warn!(error = %e, "Failed to persist refreshed profile");
            }
            state.token = Some(token);
            state.user = Some(user);
            state.since = Some(Utc::now());
        }
        tracing::info!(user_id = %user_id, role = %role, "Session established");
        self.bus.publish(SessionEvent::logged_in(user_id, role));
    }

    // ---- transitions ----

    /// Exchange credentials for a session. On failure nothing changes and
    /// the backend's message is returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let LoginResponse { token, user } = self.api.auth().login(email, password).await?;

        {
            let mut state = self.state();
            self.credentials.save(&token, &user)?;
            state.token = Some(token);
            state.user = Some(user.clone());
            state.loading = false;
            state.since = Some(Utc::now());
        }

        tracing::info!(user_id = %user.id, role = %user.role, "Logged in");
        self.bus
            .publish(SessionEvent::logged_in(user.id.clone(), user.role));
        Ok(user)
    }

    /// Create an account. The session is untouched: new accounts wait for
    /// admin approval before they can log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, SessionError> {
        let user = self.api.auth().register(request).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Registered account");
        Ok(user)
    }

    /// Clear the session from memory and durable storage. Always succeeds
    /// and may be called repeatedly.
    pub fn logout(&self) {
        self.logout_with(LogoutReason::UserRequested, true);
    }

    fn logout_with(&self, reason: LogoutReason, announce: bool) {
        let had_session = {
            let mut state = self.state();
            let had = state.token.is_some() || state.user.is_some();
            state.token = None;
            state.user = None;
            state.since = None;
            if let Err(e) = self.credentials.clear() {
                tracing::error!(error = %e, "Failed to clear stored credentials");
            }
            had
        };

        if had_session && announce {
            tracing::info!(?reason, "Logged out");
            self.bus.publish(SessionEvent::logged_out(reason));
        }
    }

    /// Replace the cached profile in memory and storage. No network call.
    pub fn update_user(&self, user: UserProfile) -> Result<(), SessionError> {
        let user_id = user.id.clone();
        {
            let mut state = self.state();
            let token = state.token.as_deref().ok_or(SessionError::NotAuthenticated)?;
            self.credentials.save(token, &user)?;
            state.user = Some(user);
        }
        tracing::debug!(user_id = %user_id, "Profile updated");
        self.bus.publish(SessionEvent::profile_updated(user_id));
        Ok(())
    }

    // ---- profile screens ----

    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserProfile, SessionError> {
        if request.is_empty() {
            return Err(CoreError::Validation("nothing to update".into()).into());
        }
        let user = self.api.auth().update_profile(request).await?;
        self.update_user(user.clone())?;
        Ok(user)
    }

    /// Re-fetch the profile from the backend and cache it.
    pub async fn refresh_user(&self) -> Result<UserProfile, SessionError> {
        let user = self.api.auth().me().await?;
        self.update_user(user.clone())?;
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, SessionError> {
        Ok(self
            .api
            .auth()
            .change_password(current_password, new_password)
            .await?)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, SessionError> {
        Ok(self.api.auth().forgot_password(email).await?)
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, SessionError> {
        Ok(self.api.auth().reset_password(token, new_password).await?)
    }

    // ---- 401 handling ----

    /// React to a 401 signal from the API client: drop the session and ask
    /// the presentation layer to show the login screen. `sent_at` is when
    /// the rejected request was sent.
    pub fn handle_unauthenticated(&self, path: &str, sent_at: DateTime<Utc>) {
        let stale = self.state().since.is_some_and(|since| sent_at < since);
        if stale {
            tracing::debug!(path, "Ignoring 401 from before the current session");
            return;
        }
        tracing::warn!(path, "Backend rejected credentials, forcing logout");
        self.logout_with(LogoutReason::Unauthenticated, true);
        self.bus.publish(SessionEvent::to_login());
    }

    /// Start the background task that turns 401 signals into a forced
    /// logout. Subscribes before returning, so no signal published after
    /// this call is missed.
    pub fn spawn_listener(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Session listener stopped");
                        return;
                    }
                    received = rx.recv() => match received {
                        Ok(event) => {
                            if let SessionEventKind::Unauthenticated { path, sent_at } = &event.kind {
                                store.handle_unauthenticated(path, *sent_at);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session listener lagged");
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        })
    }
}
