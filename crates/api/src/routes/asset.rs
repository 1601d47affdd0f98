//! Route definitions for the `/assets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::asset;
use crate::state::AppState;

/// Routes mounted at `/assets`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> upload (multipart)
/// POST   /links                   -> create_link
/// GET    /broadcaster/my-files    -> broadcaster_files
/// GET    /{id}                    -> get_by_id
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete
/// GET    /{id}/download           -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(asset::list).post(asset::upload))
        .route("/links", post(asset::create_link))
        .route("/broadcaster/my-files", get(asset::broadcaster_files))
        .route(
            "/{id}",
            get(asset::get_by_id)
                .put(asset::update)
                .delete(asset::delete),
        )
        .route("/{id}/download", get(asset::download))
}
