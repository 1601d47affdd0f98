//! Handlers for crew assignments nested under `/projects/{project_id}/crew`,
//! plus the per-user `/crew/{user_id}/projects` lookup.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dreamlight_core::roles::ROLE_CREW;
use dreamlight_core::types::DbId;
use dreamlight_db::models::project::Project;
use dreamlight_db::models::project_crew::{
    AssignCrew, BulkAssignCrew, CrewMember, ProjectCrew, UpdateCrewRole,
};
use dreamlight_db::models::user::UserSummary;
use dreamlight_db::repositories::{MilestoneRepo, ProjectCrewRepo, ProjectRepo, UserRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::access::{ensure_producer_access, load_project};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CrewCheck {
    pub is_assigned: bool,
    pub assignment: Option<ProjectCrew>,
}

#[derive(Debug, Serialize)]
pub struct BulkAssignResult {
    pub assigned: usize,
    pub skipped: usize,
    pub total: usize,
}

fn normalize_role(role: Option<String>) -> Option<String> {
    role.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}

/// GET /api/v1/projects/{project_id}/crew
pub async fn list(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CrewMember>>>> {
    ensure_producer_access(&state.pool, &user, project_id).await?;
    let crew = ProjectCrewRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: crew }))
}

/// GET /api/v1/projects/{project_id}/crew/available
///
/// Crew users not yet assigned to the project.
pub async fn available(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<UserSummary>>>> {
    load_project(&state.pool, project_id).await?;
    let users = UserRepo::list_unassigned_crew(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/projects/{project_id}/crew/check/{user_id}
pub async fn check(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((project_id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<CrewCheck>>> {
    let assignment = ProjectCrewRepo::find(&state.pool, project_id, user_id).await?;
    Ok(Json(DataResponse {
        data: CrewCheck {
            is_assigned: assignment.is_some(),
            assignment,
        },
    }))
}

/// POST /api/v1/projects/{project_id}/crew
pub async fn assign(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(project_id): Path<DbId>,
    Json(input): Json<AssignCrew>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectCrew>>)> {
    let project = load_project(&state.pool, project_id).await?;
    let user = UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::not_found("User", input.user_id))?;
    if user.role != ROLE_CREW {
        return Err(AppError::BadRequest(
            "Only crew members can be assigned to projects".into(),
        ));
    }
    if ProjectCrewRepo::is_assigned(&state.pool, project_id, user.id).await? {
        return Err(AppError::conflict(format!(
            "{} is already assigned to this project",
            user.name
        )));
    }

    let role = normalize_role(input.role_in_project);
    let assignment =
        ProjectCrewRepo::assign(&state.pool, project_id, user.id, role.as_deref(), admin.user_id)
            .await?;
    tracing::info!(
        project_id,
        user_id = user.id,
        assigned_by = admin.user_id,
        "{} assigned to {}",
        user.name,
        project.title
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}

/// POST /api/v1/projects/{project_id}/crew/bulk
///
/// Every id must belong to a crew user; ids already assigned are skipped.
pub async fn bulk_assign(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(project_id): Path<DbId>,
    Json(input): Json<BulkAssignCrew>,
) -> AppResult<(StatusCode, Json<DataResponse<BulkAssignResult>>)> {
    if input.user_ids.is_empty() {
        return Err(AppError::BadRequest(
            "user_ids must be a non-empty array".into(),
        ));
    }
    load_project(&state.pool, project_id).await?;

    let mut seen = HashSet::new();
    let user_ids: Vec<DbId> = input
        .user_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let crew_ids: HashSet<DbId> = UserRepo::list_by_role(&state.pool, ROLE_CREW)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    if user_ids.iter().any(|id| !crew_ids.contains(id)) {
        return Err(AppError::BadRequest(
            "Some user IDs are invalid or not crew members".into(),
        ));
    }

    let role = normalize_role(input.role_in_project);
    let inserted = ProjectCrewRepo::assign_many(
        &state.pool,
        project_id,
        &user_ids,
        role.as_deref(),
        admin.user_id,
    )
    .await?;

    let result = BulkAssignResult {
        assigned: inserted.len(),
        skipped: user_ids.len() - inserted.len(),
        total: user_ids.len(),
    };
    tracing::info!(
        project_id,
        assigned = result.assigned,
        skipped = result.skipped,
        "Bulk crew assignment"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// PUT /api/v1/projects/{project_id}/crew/{user_id}
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((project_id, user_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateCrewRole>,
) -> AppResult<Json<DataResponse<ProjectCrew>>> {
    let role = normalize_role(input.role_in_project);
    let assignment = ProjectCrewRepo::update_role(&state.pool, project_id, user_id, role.as_deref())
        .await?
        .ok_or(AppError::not_found("Crew assignment", user_id))?;
    Ok(Json(DataResponse { data: assignment }))
}

/// DELETE /api/v1/projects/{project_id}/crew/{user_id}
///
/// Refused while the crew member still has active milestones in the project.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((project_id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    if !ProjectCrewRepo::is_assigned(&state.pool, project_id, user_id).await? {
        return Err(AppError::not_found("Crew assignment", user_id));
    }

    let active = MilestoneRepo::count_active_for_user(&state.pool, user_id, Some(project_id)).await?;
    if active > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot remove crew member. They have {active} active task(s) in this project. \
             Please complete or reassign tasks first."
        )));
    }

    ProjectCrewRepo::remove(&state.pool, project_id, user_id).await?;
    tracing::info!(project_id, user_id, removed_by = admin.user_id, "Crew removed from project");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Crew member removed from the project"),
    }))
}

/// GET /api/v1/crew/{user_id}/projects
///
/// Non-completed projects of a crew member, nearest deadline first. Crew
/// users may only look up themselves.
pub async fn crew_projects(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    if !(user.role.is_manager() || user.user_id == user_id) {
        return Err(AppError::forbidden("You can only view your own projects"));
    }

    let target = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::not_found("User", user_id))?;
    if target.role != ROLE_CREW {
        return Err(AppError::BadRequest("User is not a crew member".into()));
    }

    let projects = ProjectRepo::list_open_for_crew(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}
