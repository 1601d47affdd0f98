//! Refresh session model.

use dreamlight_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from `refresh_sessions`. Only the SHA-256 hash of the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
