//! Handlers for the `/milestones` resource: crew tasks, their work status
//! and the producer approval loop.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dreamlight_core::access::{check_task_owner, project_filter_for};
use dreamlight_core::error::CoreError;
use dreamlight_core::production::{
    validate_payment_status, validate_phase, validate_work_status, WORK_STATUS_DONE,
    WORK_STATUS_IN_PROGRESS, WORK_STATUS_WAITING_APPROVAL,
};
use dreamlight_core::roles::{Role, ROLE_CREW};
use dreamlight_core::types::{DbId, Money};
use dreamlight_core::validation::{
    validate_non_negative_money, validate_required_text, MAX_TASK_NAME_LEN,
};
use dreamlight_db::models::milestone::{
    CreateMilestone, CrewPaymentStats, Milestone, MilestoneDetail, MilestoneListFilter,
    UpdateMilestone,
};
use dreamlight_db::repositories::{MilestoneRepo, ProjectCrewRepo, UserRepo};
use dreamlight_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::access::{
    ensure_crew_assignment, ensure_episode_in_project, ensure_producer_access,
    ensure_project_access,
};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireCrew, RequireManager};
use crate::query::TaskViewParams;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub work_status: Option<String>,
}

/// A crew member's task list with their honor totals.
#[derive(Debug, Serialize)]
pub struct CrewTasks {
    pub tasks: Vec<MilestoneDetail>,
    pub stats: CrewPaymentStats,
}

pub(crate) async fn crew_tasks(
    pool: &DbPool,
    user_id: DbId,
    history: bool,
) -> AppResult<CrewTasks> {
    let tasks = MilestoneRepo::list_for_crew(pool, user_id, history).await?;
    let stats = MilestoneRepo::payment_stats(pool, user_id).await?;
    Ok(CrewTasks { tasks, stats })
}

async fn find_milestone(state: &AppState, id: DbId) -> AppResult<Milestone> {
    MilestoneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Milestone", id))
}

/// The assignee must be a crew user assigned to the project.
async fn ensure_assignee(state: &AppState, project_id: DbId, user_id: DbId) -> AppResult<()> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::not_found("User", user_id))?;
    if user.role != ROLE_CREW {
        return Err(AppError::BadRequest(
            "Tasks can only be assigned to crew members".into(),
        ));
    }
    if !ProjectCrewRepo::is_assigned(&state.pool, project_id, user_id).await? {
        return Err(AppError::BadRequest(format!(
            "{} is not assigned to this project",
            user.name
        )));
    }
    Ok(())
}

fn validate_task_fields(
    task_name: Option<&str>,
    phase: Option<&str>,
    work_status: Option<&str>,
    payment_status: Option<&str>,
    honor_amount: Option<Money>,
) -> AppResult<()> {
    if let Some(name) = task_name {
        validate_required_text("Task name", name, MAX_TASK_NAME_LEN)?;
    }
    if let Some(phase) = phase {
        validate_phase(phase)?;
    }
    if let Some(status) = work_status {
        validate_work_status(status)?;
    }
    if let Some(status) = payment_status {
        validate_payment_status(status)?;
    }
    if let Some(amount) = honor_amount {
        validate_non_negative_money("Honor amount", amount)?;
    }
    Ok(())
}

/// GET /api/v1/milestones
///
/// Scoped to the caller's projects; crew only ever see their own tasks.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut filter): Query<MilestoneListFilter>,
) -> AppResult<Json<DataResponse<Vec<MilestoneDetail>>>> {
    if user.role == Role::Crew {
        filter.user_id = Some(user.user_id);
    }
    let scope = project_filter_for(user.user_id, user.role).binds();
    let milestones = MilestoneRepo::list(&state.pool, &scope, &filter).await?;
    Ok(Json(DataResponse { data: milestones }))
}

/// POST /api/v1/milestones
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(mut input): Json<CreateMilestone>,
) -> AppResult<(StatusCode, Json<DataResponse<Milestone>>)> {
    validate_task_fields(
        Some(&input.task_name),
        Some(&input.phase_category),
        input.work_status.as_deref(),
        input.payment_status.as_deref(),
        input.honor_amount,
    )?;
    input.task_name = input.task_name.trim().to_string();

    let project = ensure_producer_access(&state.pool, &user, input.project_id).await?;
    ensure_assignee(&state, project.id, input.user_id).await?;
    if let Some(episode_id) = input.episode_id {
        ensure_episode_in_project(&state.pool, project.id, episode_id).await?;
    }

    let milestone = MilestoneRepo::create(&state.pool, &input).await?;
    tracing::info!(
        milestone_id = milestone.id,
        project_id = project.id,
        assignee = milestone.user_id,
        "Milestone created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: milestone })))
}

/// GET /api/v1/milestones/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MilestoneDetail>>> {
    let milestone = MilestoneRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Milestone", id))?;
    ensure_project_access(&state.pool, &user, milestone.milestone.project_id).await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// PUT /api/v1/milestones/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateMilestone>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    let existing = find_milestone(&state, id).await?;
    ensure_producer_access(&state.pool, &user, existing.project_id).await?;

    validate_task_fields(
        input.task_name.as_deref(),
        input.phase_category.as_deref(),
        input.work_status.as_deref(),
        input.payment_status.as_deref(),
        input.honor_amount,
    )?;
    if let Some(name) = input.task_name.as_mut() {
        *name = name.trim().to_string();
    }
    if let Some(user_id) = input.user_id {
        if user_id != existing.user_id {
            ensure_assignee(&state, existing.project_id, user_id).await?;
        }
    }
    if let Some(episode_id) = input.episode_id {
        ensure_episode_in_project(&state.pool, existing.project_id, episode_id).await?;
    }

    let milestone = MilestoneRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Milestone", id))?;
    tracing::info!(milestone_id = id, updated_by = user.user_id, "Milestone updated");

    Ok(Json(DataResponse { data: milestone }))
}

/// DELETE /api/v1/milestones/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let existing = find_milestone(&state, id).await?;
    ensure_producer_access(&state.pool, &user, existing.project_id).await?;

    MilestoneRepo::delete(&state.pool, id).await?;
    tracing::info!(milestone_id = id, deleted_by = user.user_id, "Milestone deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Milestone deleted successfully"),
    }))
}

/// PATCH /api/v1/milestones/{id}/status
///
/// Crew move their own tasks on projects they are assigned to; producers and
/// admins move tasks of projects they manage.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<StatusUpdateRequest>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    let existing = find_milestone(&state, id).await?;
    check_task_owner(user.role, user.user_id, existing.user_id)?;
    if user.role.is_manager() {
        ensure_producer_access(&state.pool, &user, existing.project_id).await?;
    } else {
        ensure_crew_assignment(&state.pool, &user, existing.project_id).await?;
    }

    let work_status = input
        .work_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("work_status is required".into()))?;
    validate_work_status(work_status)?;

    let milestone = MilestoneRepo::update_status(&state.pool, id, work_status)
        .await?
        .ok_or(AppError::not_found("Milestone", id))?;
    tracing::info!(
        milestone_id = id,
        user_id = user.user_id,
        work_status,
        "Milestone status changed"
    );

    Ok(Json(DataResponse { data: milestone }))
}

async fn review(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    to: &str,
    verb: &str,
) -> AppResult<Milestone> {
    let existing = find_milestone(state, id).await?;
    ensure_producer_access(&state.pool, user, existing.project_id).await?;

    let milestone =
        MilestoneRepo::transition_status(&state.pool, id, WORK_STATUS_WAITING_APPROVAL, to)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!(
                    "Only tasks waiting for approval can be {verb}"
                )))
            })?;
    tracing::info!(milestone_id = id, reviewed_by = user.user_id, work_status = to, "Milestone {verb}");
    Ok(milestone)
}

/// POST /api/v1/milestones/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    let milestone = review(&state, &user, id, WORK_STATUS_DONE, "approved").await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// POST /api/v1/milestones/{id}/reject
///
/// Sends the task back to `In Progress`.
pub async fn reject(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    let milestone = review(&state, &user, id, WORK_STATUS_IN_PROGRESS, "rejected").await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// GET /api/v1/milestones/crew/my-tasks?view=active|history
pub async fn my_tasks(
    State(state): State<AppState>,
    RequireCrew(user): RequireCrew,
    Query(params): Query<TaskViewParams>,
) -> AppResult<Json<DataResponse<CrewTasks>>> {
    let tasks = crew_tasks(&state.pool, user.user_id, params.is_history()).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/milestones/pending-approvals
pub async fn pending_approvals(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
) -> AppResult<Json<DataResponse<Vec<MilestoneDetail>>>> {
    let scope = project_filter_for(user.user_id, user.role).binds();
    let milestones = MilestoneRepo::list_waiting_approval(&state.pool, &scope).await?;
    Ok(Json(DataResponse { data: milestones }))
}
