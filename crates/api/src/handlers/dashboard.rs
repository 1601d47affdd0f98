//! Role dashboards under `/dashboard`.
//!
//! `GET /dashboard` dispatches on the caller's role; each role also has its
//! own route so the frontend can request a specific view.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dreamlight_core::access::{project_filter_for, ProjectScopeBinds};
use dreamlight_core::finance::{
    budget_health, burn_rate, roi_percentage, summarize, BudgetHealth,
};
use dreamlight_core::production::PROJECT_TYPE_SERIES;
use dreamlight_core::progress::{compute_progress_stats, overall_progress, PhaseCount, ProgressStats};
use dreamlight_core::roles::Role;
use dreamlight_core::types::{DbId, Money, Timestamp};
use dreamlight_db::models::dashboard::{AdminCounts, ProducerCounts};
use dreamlight_db::models::episode::Episode;
use dreamlight_db::models::project::{Project, ProjectWithProgress};
use dreamlight_db::models::project_crew::CrewMember;
use dreamlight_db::repositories::{
    DashboardRepo, EpisodeRepo, FinanceRepo, MilestoneRepo, ProjectCrewRepo, ProjectRepo,
};
use dreamlight_db::DbPool;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::milestone::{crew_tasks, CrewTasks};
use crate::handlers::project::attach_progress;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{
    RequireAdmin, RequireBroadcaster, RequireCrew, RequireInvestor, RequireManager,
};
use crate::query::{PaginationParams, TaskViewParams};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// Number of projects listed on the admin dashboard.
const RECENT_PROJECTS_LIMIT: i64 = 10;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    #[serde(flatten)]
    pub counts: AdminCounts,
    pub recent_projects: Vec<ProjectWithProgress>,
}

#[derive(Debug, Serialize)]
pub struct ProducerDashboard {
    pub my_projects: Vec<ProjectWithProgress>,
    pub total_projects: usize,
    #[serde(flatten)]
    pub counts: ProducerCounts,
}

/// One card on the broadcaster dashboard: an episode of a series, an empty
/// series, or a whole non-series project.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcasterItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub subtitle: String,
    pub status: String,
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub progress: ProgressStats,
    pub updated_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct InvestorProjectStats {
    pub project_id: DbId,
    pub title: String,
    pub budget: Money,
    /// Operational expenses plus paid crew honors.
    pub expense_real: Money,
    pub burn_rate: i64,
    pub production_progress: u8,
    pub status: BudgetHealth,
}

#[derive(Debug, Serialize)]
pub struct InvestorOverview {
    pub total_investment: Money,
    pub total_expense_real: Money,
    pub total_income_real: Money,
    pub total_ar: Money,
    pub roi_percentage: Money,
    pub project_stats: Vec<InvestorProjectStats>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Flatten client projects into dashboard cards, newest update first.
pub(crate) fn broadcaster_items(
    projects: &[Project],
    episodes: &[Episode],
    project_counts: &HashMap<DbId, Vec<PhaseCount>>,
    episode_counts: &HashMap<DbId, Vec<PhaseCount>>,
) -> Vec<BroadcasterItem> {
    let stats_for = |counts: &HashMap<DbId, Vec<PhaseCount>>, id: DbId| {
        counts
            .get(&id)
            .map(|rows| compute_progress_stats(rows))
            .unwrap_or_default()
    };

    let mut items = Vec::new();
    for project in projects {
        if project.project_type != PROJECT_TYPE_SERIES {
            items.push(BroadcasterItem {
                item_type: project.project_type.clone(),
                title: project.title.clone(),
                subtitle: project
                    .client_name
                    .clone()
                    .unwrap_or_else(|| "Single Project".to_string()),
                status: project.global_status.clone(),
                project_id: project.id,
                episode_id: None,
                progress: stats_for(project_counts, project.id),
                updated_at: project.updated_at,
            });
            continue;
        }

        let mut series: Vec<&Episode> = episodes
            .iter()
            .filter(|e| e.project_id == project.id)
            .collect();
        if series.is_empty() {
            items.push(BroadcasterItem {
                item_type: "Series (Empty)".to_string(),
                title: project.title.clone(),
                subtitle: "No Episodes Yet".to_string(),
                status: project.global_status.clone(),
                project_id: project.id,
                episode_id: None,
                progress: ProgressStats::default(),
                updated_at: project.updated_at,
            });
            continue;
        }

        series.sort_by_key(|e| e.episode_number);
        for episode in series {
            items.push(BroadcasterItem {
                item_type: "Episode".to_string(),
                title: format!("Eps {}: {}", episode.episode_number, episode.title),
                subtitle: project.title.clone(),
                status: episode.status.clone(),
                project_id: project.id,
                episode_id: Some(episode.id),
                progress: stats_for(episode_counts, episode.id),
                updated_at: episode.updated_at,
            });
        }
    }

    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    items
}

/// Investment, real spend and per-project burn for an investor's projects.
pub(crate) async fn investor_overview(pool: &DbPool, investor_id: DbId) -> AppResult<InvestorOverview> {
    let scope = ProjectScopeBinds {
        investor_id: Some(investor_id),
        ..Default::default()
    };
    let projects = ProjectRepo::list_all_scoped(pool, &scope).await?;
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();

    let (totals, crew_paid) = FinanceRepo::totals(pool, &ids).await?;
    let summary = summarize(totals, crew_paid);
    let per_project: HashMap<DbId, Money> = FinanceRepo::totals_by_project(pool, &ids)
        .await?
        .into_iter()
        .map(|t| (t.project_id, t.expense + t.crew_paid))
        .collect();
    let phase_counts = MilestoneRepo::phase_counts_for_projects(pool, &ids).await?;

    let total_investment: Money = projects.iter().map(|p| p.total_budget_plan).sum();

    let project_stats = projects
        .into_iter()
        .map(|p| {
            let expense_real = per_project.get(&p.id).copied().unwrap_or_default();
            let burn = burn_rate(expense_real, p.total_budget_plan);
            let progress = phase_counts
                .get(&p.id)
                .map(|rows| overall_progress(rows))
                .unwrap_or(0);
            InvestorProjectStats {
                project_id: p.id,
                title: p.title,
                budget: p.total_budget_plan,
                expense_real,
                burn_rate: burn,
                production_progress: progress,
                status: budget_health(burn, progress),
            }
        })
        .collect();

    Ok(InvestorOverview {
        total_investment,
        total_expense_real: summary.total_expense_with_crew,
        total_income_real: summary.total_income,
        total_ar: summary.pending_ar,
        roi_percentage: roi_percentage(summary.net_profit, total_investment),
        project_stats,
    })
}

async fn admin_view(state: &AppState) -> AppResult<AdminDashboard> {
    let counts = DashboardRepo::admin_counts(&state.pool).await?;
    let recent = ProjectRepo::list_recent(&state.pool, RECENT_PROJECTS_LIMIT).await?;
    Ok(AdminDashboard {
        counts,
        recent_projects: attach_progress(&state.pool, recent).await?,
    })
}

async fn producer_view(state: &AppState, producer_id: DbId) -> AppResult<ProducerDashboard> {
    let scope = ProjectScopeBinds {
        producer_id: Some(producer_id),
        ..Default::default()
    };
    let projects = ProjectRepo::list_all_scoped(&state.pool, &scope).await?;
    let counts = DashboardRepo::producer_counts(&state.pool, &scope).await?;
    let my_projects = attach_progress(&state.pool, projects).await?;
    Ok(ProducerDashboard {
        total_projects: my_projects.len(),
        my_projects,
        counts,
    })
}

async fn broadcaster_view(state: &AppState, client_id: DbId) -> AppResult<Vec<BroadcasterItem>> {
    let scope = ProjectScopeBinds {
        client_id: Some(client_id),
        ..Default::default()
    };
    let projects = ProjectRepo::list_all_scoped(&state.pool, &scope).await?;
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let episodes = EpisodeRepo::list_by_projects(&state.pool, &ids).await?;
    let episode_ids: Vec<DbId> = episodes.iter().map(|e| e.id).collect();

    let project_counts = MilestoneRepo::phase_counts_for_projects(&state.pool, &ids).await?;
    let episode_counts = MilestoneRepo::phase_counts_for_episodes(&state.pool, &episode_ids).await?;

    Ok(broadcaster_items(
        &projects,
        &episodes,
        &project_counts,
        &episode_counts,
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(view): Query<TaskViewParams>,
) -> AppResult<Response> {
    let response = match user.role {
        Role::Admin => Json(DataResponse {
            data: admin_view(&state).await?,
        })
        .into_response(),
        Role::Producer => Json(DataResponse {
            data: producer_view(&state, user.user_id).await?,
        })
        .into_response(),
        Role::Crew => Json(DataResponse {
            data: crew_tasks(&state.pool, user.user_id, view.is_history()).await?,
        })
        .into_response(),
        Role::Broadcaster => Json(DataResponse {
            data: broadcaster_view(&state, user.user_id).await?,
        })
        .into_response(),
        Role::Investor => Json(DataResponse {
            data: investor_overview(&state.pool, user.user_id).await?,
        })
        .into_response(),
    };
    Ok(response)
}

/// GET /api/v1/dashboard/admin
pub async fn admin(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<AdminDashboard>>> {
    Ok(Json(DataResponse {
        data: admin_view(&state).await?,
    }))
}

/// GET /api/v1/dashboard/producer
pub async fn producer(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
) -> AppResult<Json<DataResponse<ProducerDashboard>>> {
    Ok(Json(DataResponse {
        data: producer_view(&state, user.user_id).await?,
    }))
}

/// GET /api/v1/dashboard/producer/crew
///
/// Crew assignments across the caller's projects; admins see every project.
pub async fn producer_crew(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<CrewMember>>> {
    let scope = project_filter_for(user.user_id, user.role).binds();
    let page = params.page();
    let crew = ProjectCrewRepo::list_scoped(&state.pool, &scope, page.limit, page.offset()).await?;
    let total = ProjectCrewRepo::count_scoped(&state.pool, &scope).await?;
    Ok(Json(PaginatedResponse::new(crew, total, page)))
}

/// GET /api/v1/dashboard/crew?view=active|history
pub async fn crew(
    State(state): State<AppState>,
    RequireCrew(user): RequireCrew,
    Query(view): Query<TaskViewParams>,
) -> AppResult<Json<DataResponse<CrewTasks>>> {
    Ok(Json(DataResponse {
        data: crew_tasks(&state.pool, user.user_id, view.is_history()).await?,
    }))
}

/// GET /api/v1/dashboard/broadcaster
pub async fn broadcaster(
    State(state): State<AppState>,
    RequireBroadcaster(user): RequireBroadcaster,
) -> AppResult<Json<DataResponse<Vec<BroadcasterItem>>>> {
    Ok(Json(DataResponse {
        data: broadcaster_view(&state, user.user_id).await?,
    }))
}

/// GET /api/v1/dashboard/investor
pub async fn investor(
    State(state): State<AppState>,
    RequireInvestor(user): RequireInvestor,
) -> AppResult<Json<DataResponse<InvestorOverview>>> {
    Ok(Json(DataResponse {
        data: investor_overview(&state.pool, user.user_id).await?,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn project(id: DbId, project_type: &str, minutes_ago: i64) -> Project {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Project {
            id,
            title: format!("Project {id}"),
            client_id: Some(7),
            client_name: Some("Channel Seven".to_string()),
            investor_id: None,
            investor_name: None,
            producer_id: None,
            producer_name: None,
            project_type: project_type.to_string(),
            total_budget_plan: Decimal::ZERO,
            target_income: Decimal::ZERO,
            start_date: None,
            deadline_date: None,
            description: None,
            global_status: "In Progress".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn episode(id: DbId, project_id: DbId, number: i32, minutes_ago: i64) -> Episode {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Episode {
            id,
            project_id,
            producer_id: None,
            producer_name: None,
            title: format!("Chapter {number}"),
            episode_number: number,
            status: "Filming".to_string(),
            synopsis: None,
            airing_date: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn series_expand_into_episode_cards() {
        let projects = vec![project(1, "Series", 30)];
        let episodes = vec![episode(11, 1, 2, 5), episode(10, 1, 1, 10)];
        let mut episode_counts = HashMap::new();
        episode_counts.insert(
            10,
            vec![PhaseCount {
                phase_category: "Production".to_string(),
                total: 4,
                done: 1,
            }],
        );

        let items = broadcaster_items(&projects, &episodes, &HashMap::new(), &episode_counts);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Eps 2: Chapter 2");
        assert_eq!(items[0].subtitle, "Project 1");
        assert_eq!(items[0].item_type, "Episode");
        assert_eq!(items[1].episode_id, Some(10));
        assert_eq!(items[1].progress.production, 25);
    }

    #[test]
    fn empty_series_gets_placeholder_card() {
        let projects = vec![project(2, "Series", 0)];
        let items = broadcaster_items(&projects, &[], &HashMap::new(), &HashMap::new());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type, "Series (Empty)");
        assert_eq!(items[0].subtitle, "No Episodes Yet");
        assert_eq!(items[0].progress, ProgressStats::default());
        assert_eq!(items[0].episode_id, None);
    }

    #[test]
    fn single_projects_use_client_name_and_sort_by_update() {
        let mut movie = project(3, "Movie", 60);
        movie.client_name = None;
        let tvc = project(4, "TVC", 1);

        let items = broadcaster_items(&[movie, tvc], &[], &HashMap::new(), &HashMap::new());

        assert_eq!(items[0].project_id, 4);
        assert_eq!(items[0].subtitle, "Channel Seven");
        assert_eq!(items[1].item_type, "Movie");
        assert_eq!(items[1].subtitle, "Single Project");
    }
}
