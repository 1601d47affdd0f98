//! Repository for the `milestones` table.
//!
//! Besides CRUD, this is where progress is aggregated: one grouped query per
//! project or episode (or one for a batch of projects) yields the
//! [`PhaseCount`] rows the core turns into percentages.

use std::collections::HashMap;

use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::production::{
    PAYMENT_STATUS_PAID, PAYMENT_STATUS_UNPAID, WORK_STATUS_DONE, WORK_STATUS_IN_PROGRESS,
    WORK_STATUS_PENDING, WORK_STATUS_WAITING_APPROVAL,
};
use dreamlight_core::progress::PhaseCount;
use dreamlight_core::types::DbId;
use sqlx::{FromRow, PgPool};

use super::PROJECT_SCOPE;
use crate::models::milestone::{
    CreateMilestone, CrewPaymentStats, Milestone, MilestoneDetail, MilestoneListFilter,
    UpdateMilestone,
};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, project_id, episode_id, user_id, task_name, phase_category, \
                       work_status, honor_amount, payment_status, created_at, updated_at";

/// `SELECT ... FROM` for [`MilestoneDetail`], aliasing projects as `p`.
const DETAIL_SELECT: &str = "SELECT m.id, m.project_id, m.episode_id, m.user_id, m.task_name, \
            m.phase_category, m.work_status, m.honor_amount, m.payment_status, \
            m.created_at, m.updated_at, \
            u.name AS user_name, u.email AS user_email, \
            p.title AS project_title, p.deadline_date AS project_deadline, \
            e.title AS episode_title, e.episode_number AS episode_number \
     FROM milestones m \
     JOIN users u ON u.id = m.user_id \
     JOIN projects p ON p.id = m.project_id \
     LEFT JOIN episodes e ON e.id = m.episode_id";

/// Filter predicate for [`MilestoneListFilter`], bound after the scope as `$5`..`$10`.
const LIST_FILTER: &str = "($5::BIGINT IS NULL OR m.project_id = $5) \
     AND ($6::BIGINT IS NULL OR m.episode_id = $6) \
     AND ($7::BIGINT IS NULL OR m.user_id = $7) \
     AND ($8::TEXT IS NULL OR m.work_status = $8) \
     AND ($9::TEXT IS NULL OR m.phase_category = $9) \
     AND ($10::TEXT IS NULL OR m.payment_status = $10)";

#[derive(FromRow)]
struct PhaseCountRow {
    phase_category: String,
    total: i64,
    done: i64,
}

impl From<PhaseCountRow> for PhaseCount {
    fn from(row: PhaseCountRow) -> Self {
        PhaseCount {
            phase_category: row.phase_category,
            total: row.total,
            done: row.done,
        }
    }
}

#[derive(FromRow)]
struct ProjectPhaseCountRow {
    project_id: DbId,
    phase_category: String,
    total: i64,
    done: i64,
}

#[derive(FromRow)]
struct EpisodePhaseCountRow {
    episode_id: DbId,
    phase_category: String,
    total: i64,
    done: i64,
}

/// Provides CRUD and aggregate queries for milestones.
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// Insert a new milestone, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMilestone) -> Result<Milestone, sqlx::Error> {
        let query = format!(
            "INSERT INTO milestones
                (project_id, episode_id, user_id, task_name, phase_category,
                 work_status, honor_amount, payment_status)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'Pending'), COALESCE($7, 0), COALESCE($8, 'Unpaid'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(input.project_id)
            .bind(input.episode_id)
            .bind(input.user_id)
            .bind(&input.task_name)
            .bind(&input.phase_category)
            .bind(&input.work_status)
            .bind(input.honor_amount)
            .bind(&input.payment_status)
            .fetch_one(pool)
            .await
    }

    /// Find a milestone by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM milestones WHERE id = $1");
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a milestone with its display names.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MilestoneDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE m.id = $1");
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List milestones on projects visible under `scope`, newest first.
    pub async fn list(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        filter: &MilestoneListFilter,
    ) -> Result<Vec<MilestoneDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE {PROJECT_SCOPE} AND {LIST_FILTER}
             ORDER BY m.created_at DESC, m.id DESC"
        );
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(filter.project_id)
            .bind(filter.episode_id)
            .bind(filter.user_id)
            .bind(&filter.work_status)
            .bind(&filter.phase_category)
            .bind(&filter.payment_status)
            .fetch_all(pool)
            .await
    }

    /// Milestones of one project, oldest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<MilestoneDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE m.project_id = $1 ORDER BY m.created_at, m.id");
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Milestones of one episode, oldest first.
    pub async fn list_by_episode(
        pool: &PgPool,
        episode_id: DbId,
    ) -> Result<Vec<MilestoneDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE m.episode_id = $1 ORDER BY m.created_at, m.id");
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(episode_id)
            .fetch_all(pool)
            .await
    }

    /// A crew member's tasks.
    ///
    /// `history` selects finished tasks (most recently updated first);
    /// otherwise outstanding tasks are returned, soonest project deadline first.
    pub async fn list_for_crew(
        pool: &PgPool,
        user_id: DbId,
        history: bool,
    ) -> Result<Vec<MilestoneDetail>, sqlx::Error> {
        let query = if history {
            format!(
                "{DETAIL_SELECT}
                 WHERE m.user_id = $1 AND m.work_status = $2
                 ORDER BY m.updated_at DESC, m.id DESC"
            )
        } else {
            format!(
                "{DETAIL_SELECT}
                 WHERE m.user_id = $1 AND m.work_status <> $2
                 ORDER BY p.deadline_date ASC NULLS LAST, m.id"
            )
        };
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(user_id)
            .bind(WORK_STATUS_DONE)
            .fetch_all(pool)
            .await
    }

    /// Milestones in `Waiting Approval` on projects visible under `scope`.
    pub async fn list_waiting_approval(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
    ) -> Result<Vec<MilestoneDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE {PROJECT_SCOPE} AND m.work_status = $5
             ORDER BY m.updated_at ASC, m.id"
        );
        sqlx::query_as::<_, MilestoneDetail>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(WORK_STATUS_WAITING_APPROVAL)
            .fetch_all(pool)
            .await
    }

    /// Update a milestone. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMilestone,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "UPDATE milestones SET
                episode_id = COALESCE($2, episode_id),
                user_id = COALESCE($3, user_id),
                task_name = COALESCE($4, task_name),
                phase_category = COALESCE($5, phase_category),
                work_status = COALESCE($6, work_status),
                honor_amount = COALESCE($7, honor_amount),
                payment_status = COALESCE($8, payment_status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(input.episode_id)
            .bind(input.user_id)
            .bind(&input.task_name)
            .bind(&input.phase_category)
            .bind(&input.work_status)
            .bind(input.honor_amount)
            .bind(&input.payment_status)
            .fetch_optional(pool)
            .await
    }

    /// Set the work status of a milestone.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        work_status: &str,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "UPDATE milestones SET work_status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(work_status)
            .fetch_optional(pool)
            .await
    }

    /// Move a milestone from `from` to `to`.
    ///
    /// Returns `None` when the milestone does not exist or is not in `from`.
    pub async fn transition_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "UPDATE milestones SET work_status = $3
             WHERE id = $1 AND work_status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }

    /// Delete a milestone. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Outstanding (not `Done`) milestones assigned to a user, optionally within one project.
    pub async fn count_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM milestones
             WHERE user_id = $1
               AND ($2::BIGINT IS NULL OR project_id = $2)
               AND work_status IN ($3, $4, $5)",
        )
        .bind(user_id)
        .bind(project_id)
        .bind(WORK_STATUS_PENDING)
        .bind(WORK_STATUS_IN_PROGRESS)
        .bind(WORK_STATUS_WAITING_APPROVAL)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Honor totals and outstanding task count for a crew member.
    pub async fn payment_stats(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<CrewPaymentStats, sqlx::Error> {
        sqlx::query_as::<_, CrewPaymentStats>(
            "SELECT
                COALESCE(SUM(honor_amount) FILTER (WHERE payment_status = $2), 0) AS pending_payment,
                COALESCE(SUM(honor_amount) FILTER (WHERE payment_status = $3), 0) AS received_payment,
                COUNT(*) FILTER (WHERE work_status <> $4) AS active_task_count
             FROM milestones
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(PAYMENT_STATUS_UNPAID)
        .bind(PAYMENT_STATUS_PAID)
        .bind(WORK_STATUS_DONE)
        .fetch_one(pool)
        .await
    }

    /// Per-phase milestone counts for a project.
    pub async fn phase_counts_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<PhaseCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PhaseCountRow>(
            "SELECT phase_category,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE work_status = $2) AS done
             FROM milestones
             WHERE project_id = $1
             GROUP BY phase_category",
        )
        .bind(project_id)
        .bind(WORK_STATUS_DONE)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(PhaseCount::from).collect())
    }

    /// Per-phase milestone counts for an episode.
    pub async fn phase_counts_for_episode(
        pool: &PgPool,
        episode_id: DbId,
    ) -> Result<Vec<PhaseCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PhaseCountRow>(
            "SELECT phase_category,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE work_status = $2) AS done
             FROM milestones
             WHERE episode_id = $1
             GROUP BY phase_category",
        )
        .bind(episode_id)
        .bind(WORK_STATUS_DONE)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(PhaseCount::from).collect())
    }

    /// Per-phase milestone counts for many projects in one query, keyed by project.
    ///
    /// Projects without milestones are absent from the map.
    pub async fn phase_counts_for_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<PhaseCount>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectPhaseCountRow>(
            "SELECT project_id, phase_category,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE work_status = $2) AS done
             FROM milestones
             WHERE project_id = ANY($1)
             GROUP BY project_id, phase_category",
        )
        .bind(project_ids)
        .bind(WORK_STATUS_DONE)
        .fetch_all(pool)
        .await?;

        let mut counts: HashMap<DbId, Vec<PhaseCount>> = HashMap::new();
        for row in rows {
            counts.entry(row.project_id).or_default().push(PhaseCount {
                phase_category: row.phase_category,
                total: row.total,
                done: row.done,
            });
        }
        Ok(counts)
    }

    /// Per-phase milestone counts for many episodes, keyed by episode.
    ///
    /// Episodes without milestones are absent from the map.
    pub async fn phase_counts_for_episodes(
        pool: &PgPool,
        episode_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<PhaseCount>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, EpisodePhaseCountRow>(
            "SELECT episode_id, phase_category,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE work_status = $2) AS done
             FROM milestones
             WHERE episode_id = ANY($1)
             GROUP BY episode_id, phase_category",
        )
        .bind(episode_ids)
        .bind(WORK_STATUS_DONE)
        .fetch_all(pool)
        .await?;

        let mut counts: HashMap<DbId, Vec<PhaseCount>> = HashMap::new();
        for row in rows {
            counts.entry(row.episode_id).or_default().push(PhaseCount {
                phase_category: row.phase_category,
                total: row.total,
                done: row.done,
            });
        }
        Ok(counts)
    }
}
