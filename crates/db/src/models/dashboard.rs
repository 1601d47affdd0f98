//! Aggregate rows backing the role dashboards.

use dreamlight_core::types::Money;
use serde::Serialize;
use sqlx::FromRow;

/// Studio-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct AdminCounts {
    pub total_projects: i64,
    /// Projects whose status is not `Completed`.
    pub ongoing_projects: i64,
    pub total_crew: i64,
}

/// Counters over the projects a producer manages.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct ProducerCounts {
    /// Milestones in `Waiting Approval`.
    pub pending_approvals: i64,
    /// Honors of `Done` milestones that are still `Unpaid`.
    pub pending_payments: Money,
    /// Distinct crew members assigned across the projects.
    pub total_assigned_crew: i64,
}
