pub mod asset;
pub mod auth;
pub mod dashboard;
pub mod episode;
pub mod finance;
pub mod health;
pub mod milestone;
pub mod project;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                              login (public)
/// /auth/refresh                            refresh (public)
/// /auth/logout                             logout
/// /auth/me                                 current user
/// /auth/profile                            update own name/email
/// /auth/password                           change own password
/// /auth/register                           create account (admin)
///
/// /users                                   list (admin)
/// /users/{id}                              get, update, delete (admin)
/// /users/{id}/stats                        task and honor totals (admin)
///
/// /projects                                list, create
/// /projects/broadcaster/my-projects        client projects (broadcaster)
/// /projects/investor/my-investments        investment overview (investor)
/// /projects/{id}                           get, update, delete
/// /projects/{id}/crew                      list, assign
/// /projects/{id}/crew/available            unassigned crew (admin)
/// /projects/{id}/crew/check/{user_id}      assignment lookup
/// /projects/{id}/crew/bulk                 bulk assign (admin)
/// /projects/{id}/crew/{user_id}            update role, remove (admin)
///
/// /crew/{user_id}/projects                 open projects of a crew member
///
/// /episodes                                list (?project_id), create
/// /episodes/{id}                           get, update, delete
///
/// /milestones                              list, create
/// /milestones/crew/my-tasks                own tasks (crew)
/// /milestones/pending-approvals            waiting approval
/// /milestones/{id}                         get, update, delete
/// /milestones/{id}/status                  change work status (PATCH)
/// /milestones/{id}/approve                 approve (POST)
/// /milestones/{id}/reject                  reject (POST)
///
/// /finance                                 list, create
/// /finance/summary                         financial summary
/// /finance/payroll/pending                 unpaid finished tasks
/// /finance/pay-crew                        pay a crew honor (POST)
/// /finance/{id}                            get, update, delete
///
/// /assets                                  list, upload (multipart)
/// /assets/links                            add external link
/// /assets/broadcaster/my-files             public files (broadcaster)
/// /assets/{id}                             get, update, delete
/// /assets/{id}/download                    stream file
///
/// /dashboard                               role dashboard
/// /dashboard/{admin,producer,crew,broadcaster,investor}
/// /dashboard/producer/crew                 crew across managed projects
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", user::router())
        .nest("/projects", project::router())
        .nest("/crew", project::crew_router())
        .nest("/episodes", episode::router())
        .nest("/milestones", milestone::router())
        .nest("/finance", finance::router())
        .nest("/assets", asset::router())
        .nest("/dashboard", dashboard::router())
}
