//! Route definitions for the `/finance` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::finance;
use crate::state::AppState;

/// Routes mounted at `/finance`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /summary          -> summary
/// GET    /payroll/pending  -> pending_payroll
/// POST   /pay-crew         -> pay_crew
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(finance::list).post(finance::create))
        .route("/summary", get(finance::summary))
        .route("/payroll/pending", get(finance::pending_payroll))
        .route("/pay-crew", post(finance::pay_crew))
        .route(
            "/{id}",
            get(finance::get_by_id)
                .put(finance::update)
                .delete(finance::delete),
        )
}
