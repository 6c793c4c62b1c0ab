//! The two principal roles and their wire names.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20260301000001_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_WORKER: &str = "worker";
pub const ROLE_SUPERVISOR: &str = "supervisor";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_WORKER, ROLE_SUPERVISOR];

/// Role of a principal, as far as the edit workflow is concerned.
///
/// Line workers get exactly one post-hoc edit per record; supervisors may
/// override that cap but must re-authenticate to do so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Supervisor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Worker => ROLE_WORKER,
            Role::Supervisor => ROLE_SUPERVISOR,
        }
    }

    pub fn is_supervisor(self) -> bool {
        matches!(self, Role::Supervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_WORKER => Ok(Role::Worker),
            ROLE_SUPERVISOR => Ok(Role::Supervisor),
            other => Err(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            )),
        }
    }
}
