//! Route definitions for the admin-only `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /            -> list
/// GET    /{id}        -> get_by_id
/// PUT    /{id}        -> update
/// DELETE /{id}        -> delete
/// GET    /{id}/stats  -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user::list))
        .route(
            "/{id}",
            get(user::get_by_id).put(user::update).delete(user::delete),
        )
        .route("/{id}/stats", get(user::stats))
}
