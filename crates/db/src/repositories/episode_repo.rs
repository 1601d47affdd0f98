//! Repository for the `episodes` table.

use dreamlight_core::types::DbId;
use sqlx::PgPool;

use crate::models::episode::{CreateEpisode, Episode, UpdateEpisode};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, producer_id, producer_name, title, episode_number, \
                       status, synopsis, airing_date, created_at, updated_at";

/// Provides CRUD operations for episodes.
pub struct EpisodeRepo;

impl EpisodeRepo {
    /// Insert a new episode, returning the created row.
    ///
    /// If `status` is `None` in the input, defaults to `Scripting`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateEpisode,
        producer_id: Option<DbId>,
        producer_name: Option<&str>,
    ) -> Result<Episode, sqlx::Error> {
        let query = format!(
            "INSERT INTO episodes
                (project_id, producer_id, producer_name, title, episode_number, status, synopsis, airing_date)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'Scripting'), $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Episode>(&query)
            .bind(input.project_id)
            .bind(producer_id)
            .bind(producer_name)
            .bind(&input.title)
            .bind(input.episode_number)
            .bind(&input.status)
            .bind(&input.synopsis)
            .bind(input.airing_date)
            .fetch_one(pool)
            .await
    }

    /// Find an episode by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Episode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM episodes WHERE id = $1");
        sqlx::query_as::<_, Episode>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All episodes of a project, in episode-number order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Episode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM episodes WHERE project_id = $1 ORDER BY episode_number"
        );
        sqlx::query_as::<_, Episode>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// All episodes of several projects, grouped by project then episode number.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<Episode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM episodes
             WHERE project_id = ANY($1)
             ORDER BY project_id, episode_number"
        );
        sqlx::query_as::<_, Episode>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }

    /// Whether another episode of the project already uses `episode_number`.
    pub async fn number_taken(
        pool: &PgPool,
        project_id: DbId,
        episode_number: i32,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM episodes
                WHERE project_id = $1 AND episode_number = $2
                  AND ($3::BIGINT IS NULL OR id <> $3)
             )",
        )
        .bind(project_id)
        .bind(episode_number)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Update an episode. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEpisode,
    ) -> Result<Option<Episode>, sqlx::Error> {
        let query = format!(
            "UPDATE episodes SET
                title = COALESCE($2, title),
                episode_number = COALESCE($3, episode_number),
                status = COALESCE($4, status),
                synopsis = COALESCE($5, synopsis),
                airing_date = COALESCE($6, airing_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Episode>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.episode_number)
            .bind(&input.status)
            .bind(&input.synopsis)
            .bind(input.airing_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete an episode and its milestones and assets. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM episodes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
