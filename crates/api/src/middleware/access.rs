//! Per-resource project access checks.
//!
//! Each helper loads the project first (404 when it is missing), then asks
//! [`dreamlight_core::access`] for a verdict. The crew assignment lookup only
//! runs for crew users.

use dreamlight_core::access::{check_crew_assignment, check_producer_access, check_project_access};
use dreamlight_core::roles::Role;
use dreamlight_core::types::DbId;
use dreamlight_db::models::project::Project;
use dreamlight_db::repositories::{EpisodeRepo, ProjectCrewRepo, ProjectRepo};
use dreamlight_db::DbPool;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};

/// Load a project or fail with 404.
pub async fn load_project(pool: &DbPool, project_id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or(AppError::not_found("Project", project_id))
}

/// The episode exists and belongs to `project_id`; 400 otherwise.
pub async fn ensure_episode_in_project(
    pool: &DbPool,
    project_id: DbId,
    episode_id: DbId,
) -> AppResult<()> {
    match EpisodeRepo::find_by_id(pool, episode_id).await? {
        Some(episode) if episode.project_id == project_id => Ok(()),
        _ => Err(AppError::BadRequest(
            "Episode not found or does not belong to this project".into(),
        )),
    }
}

async fn crew_assigned(pool: &DbPool, user: &AuthUser, project_id: DbId) -> AppResult<bool> {
    if user.role != Role::Crew {
        return Ok(false);
    }
    Ok(ProjectCrewRepo::is_assigned(pool, project_id, user.user_id).await?)
}

/// The user may view the project.
pub async fn ensure_project_access(
    pool: &DbPool,
    user: &AuthUser,
    project_id: DbId,
) -> AppResult<Project> {
    let project = load_project(pool, project_id).await?;
    let assigned = crew_assigned(pool, user, project_id).await?;
    check_project_access(user.role, user.user_id, &project.ownership(), assigned)?;
    Ok(project)
}

/// The user may manage the project (admin, or its producer).
pub async fn ensure_producer_access(
    pool: &DbPool,
    user: &AuthUser,
    project_id: DbId,
) -> AppResult<Project> {
    let project = load_project(pool, project_id).await?;
    check_producer_access(user.role, user.user_id, &project.ownership())?;
    Ok(project)
}

/// The user may act on the project's tasks (admin, producer, or assigned crew).
pub async fn ensure_crew_assignment(
    pool: &DbPool,
    user: &AuthUser,
    project_id: DbId,
) -> AppResult<Project> {
    let project = load_project(pool, project_id).await?;
    let assigned = crew_assigned(pool, user, project_id).await?;
    check_crew_assignment(user.role, assigned)?;
    Ok(project)
}
