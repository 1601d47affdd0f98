//! Well-known role names and the typed [`Role`] enum.
//!
//! The string constants must match the `ck_users_role` CHECK constraint in
//! `20260301000001_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PRODUCER: &str = "producer";
pub const ROLE_CREW: &str = "crew";
pub const ROLE_BROADCASTER: &str = "broadcaster";
pub const ROLE_INVESTOR: &str = "investor";

/// All valid role names, in the order they appear in the schema.
pub const VALID_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_PRODUCER,
    ROLE_CREW,
    ROLE_BROADCASTER,
    ROLE_INVESTOR,
];

/// A user's role. Every user has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Producer,
    Crew,
    Broadcaster,
    Investor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Producer => ROLE_PRODUCER,
            Role::Crew => ROLE_CREW,
            Role::Broadcaster => ROLE_BROADCASTER,
            Role::Investor => ROLE_INVESTOR,
        }
    }

    /// Admins and producers manage projects; everyone else only views.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Admin | Role::Producer)
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
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_PRODUCER => Ok(Role::Producer),
            ROLE_CREW => Ok(Role::Crew),
            ROLE_BROADCASTER => Ok(Role::Broadcaster),
            ROLE_INVESTOR => Ok(Role::Investor),
            other => Err(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            )),
        }
    }
}
