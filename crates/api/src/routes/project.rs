//! Route definitions for the `/projects` resource.
//!
//! Also nests crew assignment routes under `/projects/{id}/crew`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{project, project_crew};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create
/// GET    /broadcaster/my-projects       -> broadcaster_projects
/// GET    /investor/my-investments       -> investor_investments
/// GET    /{id}                          -> get_by_id
/// PUT    /{id}                          -> update
/// DELETE /{id}                          -> delete
///
/// GET    /{id}/crew                     -> list
/// POST   /{id}/crew                     -> assign
/// GET    /{id}/crew/available           -> available
/// GET    /{id}/crew/check/{user_id}     -> check
/// POST   /{id}/crew/bulk                -> bulk_assign
/// PUT    /{id}/crew/{user_id}           -> update_role
/// DELETE /{id}/crew/{user_id}           -> remove
/// ```
pub fn router() -> Router<AppState> {
    let crew_routes = Router::new()
        .route("/", get(project_crew::list).post(project_crew::assign))
        .route("/available", get(project_crew::available))
        .route("/check/{user_id}", get(project_crew::check))
        .route("/bulk", post(project_crew::bulk_assign))
        .route(
            "/{user_id}",
            put(project_crew::update_role).delete(project_crew::remove),
        );

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/broadcaster/my-projects",
            get(project::broadcaster_projects),
        )
        .route(
            "/investor/my-investments",
            get(project::investor_investments),
        )
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .nest("/{id}/crew", crew_routes)
}

/// Routes mounted at `/crew`.
///
/// ```text
/// GET /{user_id}/projects  -> crew_projects
/// ```
pub fn crew_router() -> Router<AppState> {
    Router::new().route("/{user_id}/projects", get(project_crew::crew_projects))
}
