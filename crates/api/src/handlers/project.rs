//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dreamlight_core::access::{project_filter_for, ProjectScopeBinds};
use dreamlight_core::error::CoreError;
use dreamlight_core::pagination::Page;
use dreamlight_core::production::{
    validate_project_status, validate_project_type, DEFAULT_CLIENT_NAME, DEFAULT_INVESTOR_NAME,
};
use dreamlight_core::progress::{compute_progress_stats, ProgressStats};
use dreamlight_core::roles::{Role, ROLE_PRODUCER};
use dreamlight_core::types::{Date, DbId, Money, Timestamp};
use dreamlight_core::validation::{
    validate_date_order, validate_non_negative_money, validate_required_text, MAX_TITLE_LEN,
};
use dreamlight_db::models::asset::Asset;
use dreamlight_db::models::episode::Episode;
use dreamlight_db::models::finance::Finance;
use dreamlight_db::models::milestone::MilestoneDetail;
use dreamlight_db::models::project::{
    CreateProject, Project, ProjectListFilter, ProjectParties, ProjectWithProgress, UpdateProject,
};
use dreamlight_db::repositories::{
    AssetRepo, EpisodeRepo, FinanceRepo, MilestoneRepo, ProjectRepo, UserRepo,
};
use dreamlight_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::dashboard::{investor_overview, InvestorOverview};
use crate::middleware::access::{ensure_producer_access, ensure_project_access, load_project};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireBroadcaster, RequireInvestor, RequireManager};
use crate::response::{DataResponse, MessageResponse, PaginatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProjectListParams {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub client_id: Option<DbId>,
    pub investor_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A project with everything attached to it.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub episodes: Vec<Episode>,
    pub milestones: Vec<MilestoneDetail>,
    pub finances: Vec<Finance>,
    pub assets: Vec<Asset>,
    pub progress_stats: ProgressStats,
}

/// Project card shown to broadcasters.
#[derive(Debug, Serialize)]
pub struct BroadcasterProject {
    pub id: DbId,
    pub title: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub description: Option<String>,
    pub status: String,
    pub start_date: Option<Date>,
    pub deadline_date: Option<Date>,
    pub producer_id: Option<DbId>,
    pub producer_name: Option<String>,
    pub episode_count: usize,
    pub progress: ProgressStats,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pair each project with its per-phase progress, using one grouped query.
pub(crate) async fn attach_progress(
    pool: &DbPool,
    projects: Vec<Project>,
) -> AppResult<Vec<ProjectWithProgress>> {
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let counts = MilestoneRepo::phase_counts_for_projects(pool, &ids).await?;
    Ok(projects
        .into_iter()
        .map(|project| {
            let progress_stats = counts
                .get(&project.id)
                .map(|rows| compute_progress_stats(rows))
                .unwrap_or_default();
            ProjectWithProgress {
                project,
                progress_stats,
            }
        })
        .collect())
}

/// Resolve the display name of a party user; the user must exist.
async fn party_name(pool: &DbPool, label: &str, user_id: DbId) -> AppResult<(String, String)> {
    let user = UserRepo::find_by_id(pool, user_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "{label} user {user_id} not found"
        )))
    })?;
    Ok((user.name, user.role))
}

async fn producer_name(pool: &DbPool, producer_id: DbId) -> AppResult<String> {
    let (name, role) = party_name(pool, "Producer", producer_id).await?;
    if role != ROLE_PRODUCER {
        return Err(AppError::Core(CoreError::Validation(
            "Selected user is not a producer".into(),
        )));
    }
    Ok(name)
}

fn validate_money_fields(budget: Option<Money>, income: Option<Money>) -> AppResult<()> {
    if let Some(budget) = budget {
        validate_non_negative_money("Total budget plan", budget)?;
    }
    if let Some(income) = income {
        validate_non_negative_money("Target income", income)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Lists the projects visible to the caller's role, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<PaginatedResponse<ProjectWithProgress>>> {
    let scope = project_filter_for(user.user_id, user.role).binds();
    let filter = ProjectListFilter {
        global_status: params.status,
        project_type: params.project_type,
        client_id: params.client_id,
        investor_id: params.investor_id,
    };
    let page = Page::new(params.page, params.limit);

    let projects = ProjectRepo::list(&state.pool, &scope, &filter, page.limit, page.offset()).await?;
    let total = ProjectRepo::count(&state.pool, &scope, &filter).await?;
    let projects = attach_progress(&state.pool, projects).await?;

    Ok(Json(PaginatedResponse::new(projects, total, page)))
}

/// POST /api/v1/projects
///
/// A producer creating a project without naming a producer becomes its producer.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(mut input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    validate_required_text("Title", &input.title, MAX_TITLE_LEN)?;
    input.title = input.title.trim().to_string();
    validate_project_type(&input.project_type)?;
    if let Some(status) = input.global_status.as_deref() {
        validate_project_status(status)?;
    }
    validate_money_fields(input.total_budget_plan, input.target_income)?;
    validate_date_order(input.start_date, input.deadline_date)?;

    if input.producer_id.is_none() && user.role == Role::Producer {
        input.producer_id = Some(user.user_id);
    }

    let mut parties = ProjectParties {
        client_name: Some(DEFAULT_CLIENT_NAME.to_string()),
        investor_name: Some(DEFAULT_INVESTOR_NAME.to_string()),
        producer_name: None,
    };
    if let Some(client_id) = input.client_id {
        parties.client_name = Some(party_name(&state.pool, "Client", client_id).await?.0);
    }
    if let Some(investor_id) = input.investor_id {
        parties.investor_name = Some(party_name(&state.pool, "Investor", investor_id).await?.0);
    }
    if let Some(producer_id) = input.producer_id {
        parties.producer_name = Some(producer_name(&state.pool, producer_id).await?);
    }

    let project = ProjectRepo::create(&state.pool, &input, &parties).await?;
    tracing::info!(project_id = project.id, created_by = user.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = ensure_project_access(&state.pool, &user, id).await?;

    let episodes = EpisodeRepo::list_by_project(&state.pool, id).await?;
    let milestones = MilestoneRepo::list_by_project(&state.pool, id).await?;
    let finances = FinanceRepo::list_by_project(&state.pool, id).await?;
    let mut assets = AssetRepo::list_by_project(&state.pool, id).await?;
    if user.role == Role::Broadcaster {
        assets.retain(|a| a.is_public_to_broadcaster);
    }
    let phase_counts = MilestoneRepo::phase_counts_for_project(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: ProjectDetail {
            project,
            episodes,
            milestones,
            finances,
            assets,
            progress_stats: compute_progress_stats(&phase_counts),
        },
    }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    let existing = ensure_producer_access(&state.pool, &user, id).await?;

    if let Some(title) = input.title.as_mut() {
        validate_required_text("Title", title, MAX_TITLE_LEN)?;
        *title = title.trim().to_string();
    }
    if let Some(project_type) = input.project_type.as_deref() {
        validate_project_type(project_type)?;
    }
    if let Some(status) = input.global_status.as_deref() {
        validate_project_status(status)?;
    }
    validate_money_fields(input.total_budget_plan, input.target_income)?;
    validate_date_order(
        input.start_date.or(existing.start_date),
        input.deadline_date.or(existing.deadline_date),
    )?;

    // An explicit null unassigns the party and restores the default name.
    let mut parties = ProjectParties::default();
    match input.client_id {
        Some(Some(client_id)) => {
            parties.client_name = Some(party_name(&state.pool, "Client", client_id).await?.0);
        }
        Some(None) => parties.client_name = Some(DEFAULT_CLIENT_NAME.to_string()),
        None => {}
    }
    match input.investor_id {
        Some(Some(investor_id)) => {
            parties.investor_name =
                Some(party_name(&state.pool, "Investor", investor_id).await?.0);
        }
        Some(None) => parties.investor_name = Some(DEFAULT_INVESTOR_NAME.to_string()),
        None => {}
    }
    if let Some(Some(producer_id)) = input.producer_id {
        parties.producer_name = Some(producer_name(&state.pool, producer_id).await?);
    }

    let project = ProjectRepo::update(&state.pool, id, &input, &parties)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    tracing::info!(project_id = id, updated_by = user.user_id, "Project updated");

    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the project and, through cascades, its episodes, milestones,
/// finances, assets, and crew assignments.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    load_project(&state.pool, id).await?;
    ProjectRepo::delete(&state.pool, id).await?;
    tracing::info!(project_id = id, deleted_by = admin.user_id, "Project deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Project deleted successfully"),
    }))
}

/// GET /api/v1/projects/broadcaster/my-projects
pub async fn broadcaster_projects(
    State(state): State<AppState>,
    RequireBroadcaster(user): RequireBroadcaster,
) -> AppResult<Json<DataResponse<Vec<BroadcasterProject>>>> {
    let scope = ProjectScopeBinds {
        client_id: Some(user.user_id),
        ..Default::default()
    };
    let mut projects = ProjectRepo::list_all_scoped(&state.pool, &scope).await?;
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let episodes = EpisodeRepo::list_by_projects(&state.pool, &ids).await?;
    let projects = attach_progress(&state.pool, projects).await?;

    let cards = projects
        .into_iter()
        .map(|ProjectWithProgress { project, progress_stats }| BroadcasterProject {
            episode_count: episodes.iter().filter(|e| e.project_id == project.id).count(),
            id: project.id,
            title: project.title,
            project_type: project.project_type,
            description: project.description,
            status: project.global_status,
            start_date: project.start_date,
            deadline_date: project.deadline_date,
            producer_id: project.producer_id,
            producer_name: project.producer_name,
            progress: progress_stats,
            updated_at: project.updated_at,
        })
        .collect();

    Ok(Json(DataResponse { data: cards }))
}

/// GET /api/v1/projects/investor/my-investments
pub async fn investor_investments(
    State(state): State<AppState>,
    RequireInvestor(user): RequireInvestor,
) -> AppResult<Json<DataResponse<InvestorOverview>>> {
    let overview = investor_overview(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: overview }))
}
