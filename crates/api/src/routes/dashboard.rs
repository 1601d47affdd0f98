//! Route definitions for the `/dashboard` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET /                -> dashboard (dispatches on role)
/// GET /admin           -> admin
/// GET /producer        -> producer
/// GET /producer/crew   -> producer_crew
/// GET /crew            -> crew
/// GET /broadcaster     -> broadcaster
/// GET /investor        -> investor
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/admin", get(dashboard::admin))
        .route("/producer", get(dashboard::producer))
        .route("/producer/crew", get(dashboard::producer_crew))
        .route("/crew", get(dashboard::crew))
        .route("/broadcaster", get(dashboard::broadcaster))
        .route("/investor", get(dashboard::investor))
}
