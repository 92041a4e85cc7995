//! The durable credential record: a bearer token and the cached profile.
//!
//! Both keys are written and cleared in a single storage call. A record
//! holding only one of them, or a profile that no longer decodes, is
//! reported as [`CredentialState::Corrupt`] so the session can wipe it.

use std::sync::Arc;

use haven_client::TokenSource;
use haven_core::UserProfile;

use crate::storage::{Storage, StorageError};

pub const TOKEN_KEY: &str = "haven.v1.token";
pub const USER_KEY: &str = "haven.v1.user";

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialState {
    Absent,
    Present(Credentials),
    Corrupt,
}

pub struct CredentialStore {
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Result<CredentialState, StorageError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        Ok(match (token, user) {
            (None, None) => CredentialState::Absent,
            (Some(token), Some(raw)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) if !token.is_empty() => CredentialState::Present(Credentials { token, user }),
                Ok(_) => CredentialState::Corrupt,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored profile no longer decodes");
                    CredentialState::Corrupt
                }
            },
            _ => CredentialState::Corrupt,
        })
    }

    /// The stored token, or `None` when storage cannot be read.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    pub fn save(&self, token: &str, user: &UserProfile) -> Result<(), StorageError> {
        let user = serde_json::to_string(user)?;
        self.storage
            .set_many(&[(TOKEN_KEY, token.to_string()), (USER_KEY, user)])
    }

    /// Replace the cached profile, keeping the stored token. Returns
    /// `false` without writing when no token is stored.
    pub fn save_user(&self, user: &UserProfile) -> Result<bool, StorageError> {
        match self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) {
            Some(token) => self.save(&token, user).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])
    }
}

impl TokenSource for CredentialStore {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}
