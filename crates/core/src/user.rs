//! The cached account profile held by the session.

use serde::{Deserialize, Deserializer, Serialize};

use crate::roles::{Role, UserStatus};
use crate::types::{ProfileData, RecordId, Timestamp};

/// Account profile as returned by `GET /api/auth/me` and embedded in the
/// login response.
///
/// Owned by the backend; the session keeps a cached copy that is refreshed
/// on startup and after explicit profile updates. Fields the backend adds
/// later are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Opaque per-role attributes. The backend sends `null` for accounts
    /// that never filled them in.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub profile_data: ProfileData,
}

impl UserProfile {
    /// Dashboard path the user is sent to after login.
    pub fn home_path(&self) -> &'static str {
        self.role.home_path()
    }

    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<ProfileData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ProfileData>::deserialize(deserializer)?.unwrap_or_default())
}
