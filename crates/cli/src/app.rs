//! Process-wide wiring: one bus, one credential file, one session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use haven_client::ApiClient;
use haven_events::{EventBus, LogoutReason, SessionEvent, SessionEventKind};
use haven_session::{CredentialStore, FileStorage, SessionStore};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CliConfig;

/// How long to wait for the session listener to react to a 401 before the
/// process exits.
const FORCED_LOGOUT_GRACE: Duration = Duration::from_millis(250);

pub struct App {
    pub store: Arc<SessionStore>,
    events: broadcast::Receiver<SessionEvent>,
    cancel: CancellationToken,
    listener: JoinHandle<()>,
}

impl App {
    /// Build the session over the credential file and revalidate it.
    pub async fn start(config: &CliConfig) -> anyhow::Result<Self> {
        let bus = Arc::new(EventBus::default());
        let storage = Arc::new(FileStorage::new(&config.credentials_path));
        let credentials = Arc::new(CredentialStore::new(storage));
        let api = ApiClient::new(&config.client, credentials.clone(), bus.clone())
            .context("Failed to build HTTP client")?;
        let store = Arc::new(SessionStore::new(
            api,
            credentials,
            bus.clone(),
            config.revalidation.clone(),
        ));

        let cancel = CancellationToken::new();
        let listener = store.spawn_listener(cancel.clone());
        let events = bus.subscribe();

        tracing::debug!(
            backend = %config.client.backend_url,
            credentials = %config.credentials_path.display(),
            "Starting session",
        );
        store.initialize().await;

        Ok(Self {
            store,
            events,
            cancel,
            listener,
        })
    }

    /// Whether a 401 during this run ended a live session. Waits briefly
    /// for the listener to finish the forced logout.
    pub async fn session_was_revoked(&mut self) -> bool {
        let mut revoked = false;
        let deadline = tokio::time::Instant::now() + FORCED_LOGOUT_GRACE;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Ok(event)) => match event.kind {
                    SessionEventKind::LoggedOut {
                        reason: LogoutReason::Unauthenticated,
                    } => revoked = true,
                    SessionEventKind::Navigate { .. } => return revoked,
                    _ => {}
                },
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return revoked,
            }
        }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.listener.await {
            tracing::warn!(error = %e, "Session listener ended abnormally");
        }
    }
}
