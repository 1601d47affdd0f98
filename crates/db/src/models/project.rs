//! Project entity model and DTOs.

use dreamlight_core::access::ProjectOwnership;
use dreamlight_core::progress::ProgressStats;
use dreamlight_core::types::{Date, DbId, Money, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub client_id: Option<DbId>,
    pub client_name: Option<String>,
    pub investor_id: Option<DbId>,
    pub investor_name: Option<String>,
    pub producer_id: Option<DbId>,
    pub producer_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub project_type: String,
    pub total_budget_plan: Money,
    pub target_income: Money,
    pub start_date: Option<Date>,
    pub deadline_date: Option<Date>,
    pub description: Option<String>,
    pub global_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn ownership(&self) -> ProjectOwnership {
        ProjectOwnership {
            producer_id: self.producer_id,
            client_id: self.client_id,
            investor_id: self.investor_id,
        }
    }
}

/// A project together with its per-phase completion.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithProgress {
    #[serde(flatten)]
    pub project: Project,
    pub progress_stats: ProgressStats,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub client_id: Option<DbId>,
    pub investor_id: Option<DbId>,
    pub producer_id: Option<DbId>,
    #[serde(rename = "type")]
    pub project_type: String,
    pub total_budget_plan: Option<Money>,
    pub target_income: Option<Money>,
    pub start_date: Option<Date>,
    pub deadline_date: Option<Date>,
    pub description: Option<String>,
    /// Defaults to `Draft` if omitted.
    pub global_status: Option<String>,
}

/// DTO for updating an existing project. All fields are optional.
///
/// The party ids distinguish an absent key (`None`, keep) from an explicit
/// `null` (`Some(None)`, unassign).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub client_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "present")]
    pub investor_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "present")]
    pub producer_id: Option<Option<DbId>>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub total_budget_plan: Option<Money>,
    pub target_income: Option<Money>,
    pub start_date: Option<Date>,
    pub deadline_date: Option<Date>,
    pub description: Option<String>,
    pub global_status: Option<String>,
}

/// Wrap any present value, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Display names resolved from the client/investor/producer user ids.
#[derive(Debug, Clone, Default)]
pub struct ProjectParties {
    pub client_name: Option<String>,
    pub investor_name: Option<String>,
    pub producer_name: Option<String>,
}

/// Filters for the project list. Scoping by role is applied separately.
#[derive(Debug, Clone, Default)]
pub struct ProjectListFilter {
    pub global_status: Option<String>,
    pub project_type: Option<String>,
    pub client_id: Option<DbId>,
    pub investor_id: Option<DbId>,
}
