//! Project crew assignment model and DTOs.

use dreamlight_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `project_crew` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectCrew {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role_in_project: Option<String>,
    pub assigned_by: Option<DbId>,
    pub assigned_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A crew assignment with the crew member's and project's display fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CrewMember {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: ProjectCrew,
    pub user_name: String,
    pub user_email: String,
    pub project_title: String,
    pub assigned_by_name: Option<String>,
}

/// DTO for assigning a single crew member.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignCrew {
    pub user_id: DbId,
    pub role_in_project: Option<String>,
}

/// DTO for assigning several crew members at once.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkAssignCrew {
    pub user_ids: Vec<DbId>,
    pub role_in_project: Option<String>,
}

/// DTO for changing a crew member's role in a project.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCrewRole {
    pub role_in_project: Option<String>,
}
