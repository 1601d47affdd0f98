//! Repository for the `projects` table.
//!
//! List queries take a [`ProjectScopeBinds`] so each role only ever sees the
//! projects it owns, funds, commissions, or is crewed on.

use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::production::PROJECT_STATUS_COMPLETED;
use dreamlight_core::types::DbId;
use sqlx::PgPool;

use super::PROJECT_SCOPE;
use crate::models::project::{
    CreateProject, Project, ProjectListFilter, ProjectParties, UpdateProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "p.id, p.title, p.client_id, p.client_name, p.investor_id, p.investor_name, \
                       p.producer_id, p.producer_name, p.type, p.total_budget_plan, p.target_income, \
                       p.start_date, p.deadline_date, p.description, p.global_status, \
                       p.created_at, p.updated_at";

/// Filter predicate for [`ProjectListFilter`], bound after the scope as `$5`..`$8`.
const LIST_FILTER: &str = "($5::TEXT IS NULL OR p.global_status = $5) \
     AND ($6::TEXT IS NULL OR p.type = $6) \
     AND ($7::BIGINT IS NULL OR p.client_id = $7) \
     AND ($8::BIGINT IS NULL OR p.investor_id = $8)";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// If `global_status` is `None` in the input, defaults to `Draft`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
        parties: &ProjectParties,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects AS p (
                title, client_id, client_name, investor_id, investor_name,
                producer_id, producer_name, type, total_budget_plan, target_income,
                start_date, deadline_date, description, global_status
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 0), COALESCE($10, 0),
                     $11, $12, $13, COALESCE($14, 'Draft'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.title)
            .bind(input.client_id)
            .bind(&parties.client_name)
            .bind(input.investor_id)
            .bind(&parties.investor_name)
            .bind(input.producer_id)
            .bind(&parties.producer_name)
            .bind(&input.project_type)
            .bind(input.total_budget_plan)
            .bind(input.target_income)
            .bind(input.start_date)
            .bind(input.deadline_date)
            .bind(&input.description)
            .bind(&input.global_status)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects p WHERE p.id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of the projects visible under `scope`, newest first.
    pub async fn list(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        filter: &ProjectListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p
             WHERE {PROJECT_SCOPE} AND {LIST_FILTER}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $9 OFFSET $10"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(&filter.global_status)
            .bind(&filter.project_type)
            .bind(filter.client_id)
            .bind(filter.investor_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count the projects [`Self::list`] would page through.
    pub async fn count(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        filter: &ProjectListFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM projects p WHERE {PROJECT_SCOPE} AND {LIST_FILTER}"
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(&filter.global_status)
            .bind(&filter.project_type)
            .bind(filter.client_id)
            .bind(filter.investor_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Every project visible under `scope`, soonest deadline first.
    pub async fn list_all_scoped(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p
             WHERE {PROJECT_SCOPE}
             ORDER BY p.deadline_date ASC NULLS LAST, p.id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .fetch_all(pool)
            .await
    }

    /// Ids of every project visible under `scope`.
    pub async fn scoped_ids(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!("SELECT p.id FROM projects p WHERE {PROJECT_SCOPE} ORDER BY p.id");
        let rows: Vec<(DbId,)> = sqlx::query_as(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The most recently created projects.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Non-completed projects a crew member is assigned to.
    pub async fn list_open_for_crew(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p
             JOIN project_crew pc ON pc.project_id = p.id
             WHERE pc.user_id = $1 AND p.global_status <> $2
             ORDER BY p.deadline_date ASC NULLS LAST, p.id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(PROJECT_STATUS_COMPLETED)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// A party present in `input` (an id or an explicit unassignment) also
    /// replaces its stored display name with the one in `parties`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
        parties: &ProjectParties,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects AS p SET
                title = COALESCE($2, title),
                client_id = CASE WHEN $16 THEN $3 ELSE client_id END,
                client_name = CASE WHEN $16 THEN $4 ELSE client_name END,
                investor_id = CASE WHEN $17 THEN $5 ELSE investor_id END,
                investor_name = CASE WHEN $17 THEN $6 ELSE investor_name END,
                producer_id = CASE WHEN $18 THEN $7 ELSE producer_id END,
                producer_name = CASE WHEN $18 THEN $8 ELSE producer_name END,
                type = COALESCE($9, type),
                total_budget_plan = COALESCE($10, total_budget_plan),
                target_income = COALESCE($11, target_income),
                start_date = COALESCE($12, start_date),
                deadline_date = COALESCE($13, deadline_date),
                description = COALESCE($14, description),
                global_status = COALESCE($15, global_status)
             WHERE p.id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.client_id)
            .bind(&parties.client_name)
            .bind(input.investor_id)
            .bind(&parties.investor_name)
            .bind(input.producer_id)
            .bind(&parties.producer_name)
            .bind(&input.project_type)
            .bind(input.total_budget_plan)
            .bind(input.target_income)
            .bind(input.start_date)
            .bind(input.deadline_date)
            .bind(&input.description)
            .bind(&input.global_status)
            .bind(input.client_id.is_some())
            .bind(input.investor_id.is_some())
            .bind(input.producer_id.is_some())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project and, through cascades, everything under it.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
