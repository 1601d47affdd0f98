//! Route definitions for the `/milestones` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::milestone;
use crate::state::AppState;

/// Routes mounted at `/milestones`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /crew/my-tasks       -> my_tasks (crew)
/// GET    /pending-approvals   -> pending_approvals
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete
/// PATCH  /{id}/status         -> update_status
/// POST   /{id}/approve        -> approve
/// POST   /{id}/reject         -> reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(milestone::list).post(milestone::create))
        .route("/crew/my-tasks", get(milestone::my_tasks))
        .route("/pending-approvals", get(milestone::pending_approvals))
        .route(
            "/{id}",
            get(milestone::get_by_id)
                .put(milestone::update)
                .delete(milestone::delete),
        )
        .route("/{id}/status", patch(milestone::update_status))
        .route("/{id}/approve", post(milestone::approve))
        .route("/{id}/reject", post(milestone::reject))
}
