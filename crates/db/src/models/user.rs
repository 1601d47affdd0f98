//! User entity model and DTOs.

use dreamlight_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Id, name and role of a user, used for dropdowns and name resolution.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSummary {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// DTO for creating a new user. `password_hash` is produced by the caller.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Filters for the admin user list.
#[derive(Debug, Default)]
pub struct UserListFilter {
    pub role: Option<String>,
    /// Case-insensitive substring match on name or email.
    pub search: Option<String>,
}

/// Task and payment totals for one crew member.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub active_tasks: i64,
    /// Sum of honors already paid.
    pub total_earned: Money,
    /// Sum of honors for finished but unpaid tasks.
    pub pending_payment: Money,
}
