//! Account roles and statuses.
//!
//! Role names must match the values the backend stores and returns in
//! `user.role`; status names match `user.status`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DOCTOR: &str = "doctor";
pub const ROLE_PATIENT: &str = "patient";

/// Path every unauthenticated or role-less visitor is sent to.
pub const ROOT_PATH: &str = "/";

/// Login screen path; the target of every forced logout.
pub const LOGIN_PATH: &str = "/login";

/// Closed set of account roles.
///
/// The role doubles as the routing key for the role's dashboard, see
/// [`Role::home_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Patient];

    /// Roles a visitor may pick on the registration screen. Admin accounts
    /// are seeded by the backend only.
    pub const SELF_REGISTRABLE: [Role; 2] = [Role::Doctor, Role::Patient];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Doctor => ROLE_DOCTOR,
            Role::Patient => ROLE_PATIENT,
        }
    }

    /// Canonical dashboard path for this role.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Doctor => "/doctor",
            Role::Patient => "/patient",
        }
    }

    pub fn is_self_registrable(self) -> bool {
        Self::SELF_REGISTRABLE.contains(&self)
    }
}

/// Home path for an optional role; visitors without a (known) role land on `/`.
pub fn home_path_for(role: Option<Role>) -> &'static str {
    role.map(Role::home_path).unwrap_or(ROOT_PATH)
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_DOCTOR => Ok(Role::Doctor),
            ROLE_PATIENT => Ok(Role::Patient),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// Account approval status. New doctor/patient accounts start `Pending`
/// and cannot log in until an admin approves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Rejected => "rejected",
            UserStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "rejected" => Ok(UserStatus::Rejected),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}
