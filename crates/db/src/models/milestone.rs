//! Milestone (crew task) model and DTOs.

use dreamlight_core::types::{Date, DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A milestone row from the `milestones` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Milestone {
    pub id: DbId,
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub user_id: DbId,
    pub task_name: String,
    pub phase_category: String,
    pub work_status: String,
    pub honor_amount: Money,
    pub payment_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A milestone joined with the names of its crew member, project and episode.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MilestoneDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub milestone: Milestone,
    pub user_name: String,
    pub user_email: String,
    pub project_title: String,
    pub project_deadline: Option<Date>,
    pub episode_title: Option<String>,
    pub episode_number: Option<i32>,
}

/// DTO for creating a new milestone.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMilestone {
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub user_id: DbId,
    pub task_name: String,
    pub phase_category: String,
    /// Defaults to `Pending` if omitted.
    pub work_status: Option<String>,
    /// Defaults to 0 if omitted.
    pub honor_amount: Option<Money>,
    /// Defaults to `Unpaid` if omitted.
    pub payment_status: Option<String>,
}

/// DTO for updating an existing milestone. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMilestone {
    pub episode_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub task_name: Option<String>,
    pub phase_category: Option<String>,
    pub work_status: Option<String>,
    pub honor_amount: Option<Money>,
    pub payment_status: Option<String>,
}

/// Filters for the milestone list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestoneListFilter {
    pub project_id: Option<DbId>,
    pub episode_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub work_status: Option<String>,
    pub phase_category: Option<String>,
    pub payment_status: Option<String>,
}

/// Honor totals for one crew member.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct CrewPaymentStats {
    /// Honors of tasks not yet paid.
    pub pending_payment: Money,
    /// Honors already paid out.
    pub received_payment: Money,
    /// Tasks that are not `Done`.
    pub active_task_count: i64,
}
