//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod asset_repo;
pub mod dashboard_repo;
pub mod episode_repo;
pub mod finance_repo;
pub mod milestone_repo;
pub mod project_crew_repo;
pub mod project_repo;
pub mod refresh_session_repo;
pub mod user_repo;

pub use asset_repo::AssetRepo;
pub use dashboard_repo::DashboardRepo;
pub use episode_repo::EpisodeRepo;
pub use finance_repo::{FinanceRepo, PayCrewOutcome};
pub use milestone_repo::MilestoneRepo;
pub use project_crew_repo::ProjectCrewRepo;
pub use project_repo::ProjectRepo;
pub use refresh_session_repo::RefreshSessionRepo;
pub use user_repo::UserRepo;

/// Predicate restricting a `projects p` alias to a
/// [`dreamlight_core::access::ProjectScopeBinds`], using placeholders
/// `$1`..`$4` (producer, client, investor, crew member).
pub(crate) const PROJECT_SCOPE: &str = "($1::BIGINT IS NULL OR p.producer_id = $1) \
     AND ($2::BIGINT IS NULL OR p.client_id = $2) \
     AND ($3::BIGINT IS NULL OR p.investor_id = $3) \
     AND ($4::BIGINT IS NULL OR EXISTS ( \
          SELECT 1 FROM project_crew pc WHERE pc.project_id = p.id AND pc.user_id = $4))";
