//! Handlers for the admin-only `/users` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::pagination::Page;
use dreamlight_core::progress::completion_rate;
use dreamlight_core::types::DbId;
use dreamlight_core::validation::{validate_email, validate_required_text, validate_role, MAX_NAME_LEN};
use dreamlight_db::models::milestone::{MilestoneDetail, MilestoneListFilter};
use dreamlight_db::models::user::{UpdateUser, UserListFilter, UserResponse, UserTaskStats};
use dreamlight_db::repositories::{MilestoneRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, MessageResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A user together with every milestone assigned to them.
#[derive(Debug, Serialize)]
pub struct UserWithMilestones {
    #[serde(flatten)]
    pub user: UserResponse,
    pub milestones: Vec<MilestoneDetail>,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    #[serde(flatten)]
    pub tasks: UserTaskStats,
    /// Percentage of tasks marked `Done`.
    pub completion_rate: u8,
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<PaginatedResponse<UserResponse>>> {
    if let Some(role) = params.role.as_deref() {
        validate_role(role)?;
    }
    let filter = UserListFilter {
        role: params.role,
        search: params.search.filter(|s| !s.trim().is_empty()),
    };
    let page = Page::new(params.page, params.limit);

    let users = UserRepo::list(&state.pool, &filter, page.limit, page.offset()).await?;
    let total = UserRepo::count_filtered(&state.pool, &filter).await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
        total,
        page,
    )))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserWithMilestones>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    let filter = MilestoneListFilter {
        user_id: Some(id),
        ..Default::default()
    };
    let milestones = MilestoneRepo::list(&state.pool, &ProjectScopeBinds::default(), &filter).await?;

    Ok(Json(DataResponse {
        data: UserWithMilestones {
            user: user.into(),
            milestones,
        },
    }))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if let Some(name) = input.name.as_mut() {
        validate_required_text("Name", name, MAX_NAME_LEN)?;
        *name = name.trim().to_string();
    }
    if let Some(role) = input.role.as_deref() {
        validate_role(role)?;
    }
    if let Some(email) = input.email.as_mut() {
        *email = email.trim().to_string();
        validate_email(email)?;
        if UserRepo::email_taken(&state.pool, email, Some(id)).await? {
            return Err(AppError::conflict("Email already in use"));
        }
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    tracing::info!(user_id = id, updated_by = admin.user_id, "User updated");
    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/users/{id}
///
/// Admins cannot delete themselves, and users with outstanding tasks are kept.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    if UserRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("User", id));
    }
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let active = MilestoneRepo::count_active_for_user(&state.pool, id, None).await?;
    if active > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete user with {active} active task(s). Please reassign or complete them first."
        )));
    }

    UserRepo::delete(&state.pool, id).await?;
    tracing::info!(user_id = id, deleted_by = admin.user_id, "User deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("User deleted successfully"),
    }))
}

/// GET /api/v1/users/{id}/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserStats>>> {
    if UserRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("User", id));
    }
    let tasks = UserRepo::task_stats(&state.pool, id).await?;
    let completion_rate = completion_rate(tasks.completed_tasks, tasks.total_tasks);

    Ok(Json(DataResponse {
        data: UserStats {
            tasks,
            completion_rate,
        },
    }))
}
