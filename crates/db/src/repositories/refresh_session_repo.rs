//! Repository for the `refresh_sessions` table.

use dreamlight_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::refresh_session::RefreshSession;

const COLUMNS: &str =
    "id, user_id, token_hash, user_agent, expires_at, revoked_at, created_at, updated_at";

/// Issues, consumes and revokes refresh tokens.
pub struct RefreshSessionRepo;

impl RefreshSessionRepo {
    /// Store a newly issued token hash for `user_id`.
    ///
    /// Dead sessions of the same user (expired or revoked) are deleted in the
    /// same transaction so the table does not grow with every login.
    pub async fn issue(
        pool: &PgPool,
        user_id: DbId,
        token_hash: &str,
        user_agent: Option<&str>,
        expires_at: Timestamp,
    ) -> Result<RefreshSession, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let pruned = sqlx::query(
            "DELETE FROM refresh_sessions
             WHERE user_id = $1 AND (revoked_at IS NOT NULL OR expires_at <= NOW())",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, user_agent, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, RefreshSession>(&query)
            .bind(user_id)
            .bind(token_hash)
            .bind(user_agent)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        if pruned > 0 {
            tracing::debug!(user_id, pruned, "Pruned dead refresh sessions");
        }
        Ok(session)
    }

    /// Revoke the live session matching `token_hash` and return it.
    ///
    /// A single `UPDATE` both checks and revokes, so a token can be
    /// exchanged at most once even under concurrent refreshes.
    pub async fn consume(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke every live session of a user, returning how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
