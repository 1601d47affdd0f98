//! Repository for the `project_crew` join table.

use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::types::DbId;
use sqlx::PgPool;

use super::PROJECT_SCOPE;
use crate::models::project_crew::{CrewMember, ProjectCrew};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, project_id, user_id, role_in_project, assigned_by, assigned_at, created_at, updated_at";

/// `SELECT ... FROM` for [`CrewMember`], aliasing projects as `p`.
const MEMBER_SELECT: &str = "SELECT pcr.id, pcr.project_id, pcr.user_id, pcr.role_in_project, \
            pcr.assigned_by, pcr.assigned_at, pcr.created_at, pcr.updated_at, \
            u.name AS user_name, u.email AS user_email, p.title AS project_title, \
            ab.name AS assigned_by_name \
     FROM project_crew pcr \
     JOIN users u ON u.id = pcr.user_id \
     JOIN projects p ON p.id = pcr.project_id \
     LEFT JOIN users ab ON ab.id = pcr.assigned_by";

/// Provides CRUD operations for crew assignments.
pub struct ProjectCrewRepo;

impl ProjectCrewRepo {
    /// Assign a crew member to a project, returning the created row.
    pub async fn assign(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        role_in_project: Option<&str>,
        assigned_by: DbId,
    ) -> Result<ProjectCrew, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_crew (project_id, user_id, role_in_project, assigned_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectCrew>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(role_in_project)
            .bind(assigned_by)
            .fetch_one(pool)
            .await
    }

    /// Assign several crew members in one transaction, skipping existing assignments.
    ///
    /// Returns the rows that were actually inserted.
    pub async fn assign_many(
        pool: &PgPool,
        project_id: DbId,
        user_ids: &[DbId],
        role_in_project: Option<&str>,
        assigned_by: DbId,
    ) -> Result<Vec<ProjectCrew>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(user_ids.len());

        let query = format!(
            "INSERT INTO project_crew (project_id, user_id, role_in_project, assigned_by)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (project_id, user_id) DO NOTHING
             RETURNING {COLUMNS}"
        );

        for user_id in user_ids {
            let row = sqlx::query_as::<_, ProjectCrew>(&query)
                .bind(project_id)
                .bind(user_id)
                .bind(role_in_project)
                .bind(assigned_by)
                .fetch_optional(&mut *tx)
                .await?;
            inserted.extend(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Find the assignment of a user on a project.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ProjectCrew>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_crew WHERE project_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, ProjectCrew>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user is assigned to the project.
    pub async fn is_assigned(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM project_crew WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Crew of one project, ordered by name.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<CrewMember>, sqlx::Error> {
        let query = format!("{MEMBER_SELECT} WHERE pcr.project_id = $1 ORDER BY u.name, pcr.id");
        sqlx::query_as::<_, CrewMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// One page of crew assignments across the projects visible under `scope`.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CrewMember>, sqlx::Error> {
        let query = format!(
            "{MEMBER_SELECT}
             WHERE {PROJECT_SCOPE}
             ORDER BY pcr.assigned_at DESC, pcr.id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, CrewMember>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count the assignments [`Self::list_scoped`] pages through.
    pub async fn count_scoped(pool: &PgPool, scope: &ProjectScopeBinds) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM project_crew pcr
             JOIN projects p ON p.id = pcr.project_id
             WHERE {PROJECT_SCOPE}"
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Change a crew member's role on a project.
    ///
    /// Returns `None` if the user is not assigned to the project.
    pub async fn update_role(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        role_in_project: Option<&str>,
    ) -> Result<Option<ProjectCrew>, sqlx::Error> {
        let query = format!(
            "UPDATE project_crew SET role_in_project = $3
             WHERE project_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectCrew>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(role_in_project)
            .fetch_optional(pool)
            .await
    }

    /// Remove a crew member from a project. Returns `true` if a row was removed.
    pub async fn remove(pool: &PgPool, project_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_crew WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
