//! Handlers for the `/episodes` resource. Episodes only exist on Series projects.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dreamlight_core::production::{ensure_series_project, validate_episode_status};
use dreamlight_core::progress::{compute_progress_stats, ProgressStats};
use dreamlight_core::types::DbId;
use dreamlight_core::validation::{validate_episode_number, validate_required_text, MAX_TITLE_LEN};
use dreamlight_db::models::episode::{CreateEpisode, Episode, UpdateEpisode};
use dreamlight_db::models::milestone::MilestoneDetail;
use dreamlight_db::repositories::{EpisodeRepo, MilestoneRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::access::{ensure_producer_access, ensure_project_access};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EpisodeListParams {
    pub project_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeDetail {
    #[serde(flatten)]
    pub episode: Episode,
    pub milestones: Vec<MilestoneDetail>,
    pub progress_stats: ProgressStats,
}

async fn find_episode(state: &AppState, id: DbId) -> AppResult<Episode> {
    EpisodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Episode", id))
}

async fn ensure_number_free(
    state: &AppState,
    project_id: DbId,
    episode_number: i32,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if EpisodeRepo::number_taken(&state.pool, project_id, episode_number, exclude_id).await? {
        return Err(AppError::conflict(format!(
            "Episode {episode_number} already exists in this project"
        )));
    }
    Ok(())
}

/// GET /api/v1/episodes?project_id=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<EpisodeListParams>,
) -> AppResult<Json<DataResponse<Vec<Episode>>>> {
    let project_id = params
        .project_id
        .ok_or_else(|| AppError::BadRequest("project_id query parameter is required".into()))?;
    ensure_project_access(&state.pool, &user, project_id).await?;

    let episodes = EpisodeRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: episodes }))
}

/// POST /api/v1/episodes
///
/// The episode inherits the producer of its project.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(mut input): Json<CreateEpisode>,
) -> AppResult<(StatusCode, Json<DataResponse<Episode>>)> {
    validate_required_text("Title", &input.title, MAX_TITLE_LEN)?;
    input.title = input.title.trim().to_string();
    validate_episode_number(input.episode_number)?;
    if let Some(status) = input.status.as_deref() {
        validate_episode_status(status)?;
    }

    let project = ensure_producer_access(&state.pool, &user, input.project_id).await?;
    ensure_series_project(&project.project_type)?;
    ensure_number_free(&state, project.id, input.episode_number, None).await?;

    let episode = EpisodeRepo::create(
        &state.pool,
        &input,
        project.producer_id,
        project.producer_name.as_deref(),
    )
    .await?;
    tracing::info!(
        episode_id = episode.id,
        project_id = project.id,
        episode_number = episode.episode_number,
        "Episode created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: episode })))
}

/// GET /api/v1/episodes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EpisodeDetail>>> {
    let episode = find_episode(&state, id).await?;
    ensure_project_access(&state.pool, &user, episode.project_id).await?;

    let milestones = MilestoneRepo::list_by_episode(&state.pool, id).await?;
    let phase_counts = MilestoneRepo::phase_counts_for_episode(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: EpisodeDetail {
            episode,
            milestones,
            progress_stats: compute_progress_stats(&phase_counts),
        },
    }))
}

/// PUT /api/v1/episodes/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateEpisode>,
) -> AppResult<Json<DataResponse<Episode>>> {
    let existing = find_episode(&state, id).await?;
    ensure_producer_access(&state.pool, &user, existing.project_id).await?;

    if let Some(title) = input.title.as_mut() {
        validate_required_text("Title", title, MAX_TITLE_LEN)?;
        *title = title.trim().to_string();
    }
    if let Some(status) = input.status.as_deref() {
        validate_episode_status(status)?;
    }
    if let Some(number) = input.episode_number {
        validate_episode_number(number)?;
        if number != existing.episode_number {
            ensure_number_free(&state, existing.project_id, number, Some(id)).await?;
        }
    }

    let episode = EpisodeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Episode", id))?;
    tracing::info!(episode_id = id, updated_by = user.user_id, "Episode updated");

    Ok(Json(DataResponse { data: episode }))
}

/// DELETE /api/v1/episodes/{id}
///
/// Milestones and assets attached to the episode are removed with it.
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let existing = find_episode(&state, id).await?;
    ensure_producer_access(&state.pool, &user, existing.project_id).await?;

    EpisodeRepo::delete(&state.pool, id).await?;
    tracing::info!(episode_id = id, deleted_by = user.user_id, "Episode deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Episode deleted successfully"),
    }))
}
