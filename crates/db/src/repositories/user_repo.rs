//! Repository for the `users` table.

use dreamlight_core::production::{PAYMENT_STATUS_PAID, PAYMENT_STATUS_UNPAID, WORK_STATUS_DONE};
use dreamlight_core::roles::ROLE_CREW;
use dreamlight_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{
    CreateUser, UpdateUser, User, UserListFilter, UserSummary, UserTaskStats,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role, is_active, \
                        failed_login_count, locked_until, last_login_at, created_at, updated_at";

/// `WHERE` clause for [`UserListFilter`]; `$1` is the role, `$2` the search term.
const LIST_FILTER: &str = "($1::TEXT IS NULL OR role = $1) \
     AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email, ignoring case.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Whether any user other than `exclude_id` already uses `email`, ignoring case.
    pub async fn email_taken(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// List users matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &UserListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE {LIST_FILTER}
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&filter.role)
            .bind(&filter.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count users matching `filter`.
    pub async fn count_filtered(pool: &PgPool, filter: &UserListFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM users WHERE {LIST_FILTER}");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(&filter.role)
            .bind(&filter.search)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Active users with the given role, ordered by name.
    pub async fn list_by_role(pool: &PgPool, role: &str) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email, role FROM users
             WHERE role = $1 AND is_active = true
             ORDER BY name",
        )
        .bind(role)
        .fetch_all(pool)
        .await
    }

    /// Active crew members with no assignment on the project, ordered by name.
    pub async fn list_unassigned_crew(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.email, u.role FROM users u
             WHERE u.role = $1 AND u.is_active = true
               AND NOT EXISTS (
                   SELECT 1 FROM project_crew pc WHERE pc.project_id = $2 AND pc.user_id = u.id
               )
             ORDER BY u.name",
        )
        .bind(ROLE_CREW)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a user. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a failed login, returning the new count.
    ///
    /// A lock that has already expired is cleared first, so counting starts
    /// again from 1.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE users SET
                failed_login_count = CASE
                    WHEN locked_until <= NOW() THEN 1
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE WHEN locked_until <= NOW() THEN NULL ELSE locked_until END
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset `failed_login_count` to 0, clear `locked_until`,
    /// and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Task counts and honor totals across every milestone assigned to a user.
    pub async fn task_stats(pool: &PgPool, user_id: DbId) -> Result<UserTaskStats, sqlx::Error> {
        sqlx::query_as::<_, UserTaskStats>(
            "SELECT
                COUNT(*) AS total_tasks,
                COUNT(*) FILTER (WHERE work_status = $2) AS completed_tasks,
                COUNT(*) FILTER (WHERE work_status <> $2) AS active_tasks,
                COALESCE(SUM(honor_amount) FILTER (WHERE payment_status = $3), 0) AS total_earned,
                COALESCE(SUM(honor_amount) FILTER (
                    WHERE payment_status = $4 AND work_status = $2
                ), 0) AS pending_payment
             FROM milestones
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(WORK_STATUS_DONE)
        .bind(PAYMENT_STATUS_PAID)
        .bind(PAYMENT_STATUS_UNPAID)
        .fetch_one(pool)
        .await
    }
}
