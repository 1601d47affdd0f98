//! Aggregate queries for the role dashboards.

use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::production::{
    PAYMENT_STATUS_UNPAID, PROJECT_STATUS_COMPLETED, WORK_STATUS_DONE,
    WORK_STATUS_WAITING_APPROVAL,
};
use dreamlight_core::roles::ROLE_CREW;
use sqlx::PgPool;

use super::PROJECT_SCOPE;
use crate::models::dashboard::{AdminCounts, ProducerCounts};

/// Provides read-only dashboard aggregates.
pub struct DashboardRepo;

impl DashboardRepo {
    /// Project and crew counters across the whole studio.
    pub async fn admin_counts(pool: &PgPool) -> Result<AdminCounts, sqlx::Error> {
        sqlx::query_as::<_, AdminCounts>(
            "SELECT
                (SELECT COUNT(*) FROM projects) AS total_projects,
                (SELECT COUNT(*) FROM projects WHERE global_status <> $1) AS ongoing_projects,
                (SELECT COUNT(*) FROM users WHERE role = $2) AS total_crew",
        )
        .bind(PROJECT_STATUS_COMPLETED)
        .bind(ROLE_CREW)
        .fetch_one(pool)
        .await
    }

    /// Approval, payment and crew counters over the projects visible under `scope`.
    pub async fn producer_counts(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
    ) -> Result<ProducerCounts, sqlx::Error> {
        let query = format!(
            "WITH scoped AS (SELECT p.id FROM projects p WHERE {PROJECT_SCOPE})
             SELECT
                (SELECT COUNT(*) FROM milestones m
                 WHERE m.project_id IN (SELECT id FROM scoped) AND m.work_status = $5)
                    AS pending_approvals,
                COALESCE((SELECT SUM(m.honor_amount) FROM milestones m
                          WHERE m.project_id IN (SELECT id FROM scoped)
                            AND m.work_status = $6 AND m.payment_status = $7), 0)
                    AS pending_payments,
                (SELECT COUNT(DISTINCT pcr.user_id) FROM project_crew pcr
                 WHERE pcr.project_id IN (SELECT id FROM scoped))
                    AS total_assigned_crew"
        );
        sqlx::query_as::<_, ProducerCounts>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(WORK_STATUS_WAITING_APPROVAL)
            .bind(WORK_STATUS_DONE)
            .bind(PAYMENT_STATUS_UNPAID)
            .fetch_one(pool)
            .await
    }
}
