//! HTTP-level integration tests for projects and crew assignments.
//!
//! Covers role-scoped listing, creation defaults, validation, per-project
//! access, and the `/projects/{id}/crew` endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_project, create_user, delete, get, post_json, put_json, user_with_token,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn producer_becomes_producer_of_own_project(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (producer, token) = user_with_token(&app, &pool, "Paula", "producer").await;

    let response = post_json(
        app,
        "/api/v1/projects",
        json!({ "title": "  Night Shift  ", "type": "Movie", "total_budget_plan": 150000 }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["title"], "Night Shift");
    assert_eq!(data["type"], "Movie");
    assert_eq!(data["global_status"], "Draft");
    assert_eq!(data["producer_id"], producer.id);
    assert_eq!(data["producer_name"], "Paula");
    assert_eq!(data["client_name"], "Internal Project");
    assert_eq!(data["investor_name"], "Internal Funding");
    assert_eq!(data["total_budget_plan"], 150000.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn project_parties_resolve_names(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let client = create_user(&pool, "Channel Nine", "broadcaster").await;
    let investor = create_user(&pool, "Big Fund", "investor").await;
    let producer = create_user(&pool, "Pete", "producer").await;

    let response = post_json(
        app,
        "/api/v1/projects",
        json!({
            "title": "Harbor Lights",
            "type": "Series",
            "client_id": client.id,
            "investor_id": investor.id,
            "producer_id": producer.id
        }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["client_name"], "Channel Nine");
    assert_eq!(json["data"]["investor_name"], "Big Fund");
    assert_eq!(json["data"]["producer_name"], "Pete");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn producer_id_must_name_a_producer(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let crew = create_user(&pool, "Cam", "crew").await;

    let response = post_json(
        app,
        "/api/v1/projects",
        json!({ "title": "Wrong Hands", "type": "TVC", "producer_id": crew.id }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn project_validation_errors_return_400(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;

    let cases = [
        json!({ "title": "", "type": "Movie" }),
        json!({ "title": "Odd", "type": "Podcast" }),
        json!({ "title": "Late", "type": "Event", "start_date": "2025-06-01", "deadline_date": "2025-05-01" }),
        json!({ "title": "Broke", "type": "Movie", "total_budget_plan": -5 }),
        json!({ "title": "Status", "type": "Movie", "global_status": "Archived" }),
    ];
    for body in cases {
        let response = post_json(app.clone(), "/api/v1/projects", body.clone(), Some(&token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn crew_cannot_create_projects(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_crew, token) = user_with_token(&app, &pool, "Cora", "crew").await;

    let response = post_json(
        app,
        "/api/v1/projects",
        json!({ "title": "Nope", "type": "Movie" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Scoping and access
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_is_scoped_to_the_callers_projects(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, admin_token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (_p1, p1_token) = user_with_token(&app, &pool, "Prod One", "producer").await;
    let (_p2, p2_token) = user_with_token(&app, &pool, "Prod Two", "producer").await;

    create_project(app.clone(), &p1_token, json!({ "title": "A", "type": "Movie" })).await;
    create_project(app.clone(), &p1_token, json!({ "title": "B", "type": "Series" })).await;
    create_project(app.clone(), &p2_token, json!({ "title": "C", "type": "Event" })).await;

    let json = body_json(get(app.clone(), "/api/v1/projects", Some(&p1_token)).await).await;
    assert_eq!(json["total"], 2);

    let json = body_json(get(app.clone(), "/api/v1/projects", Some(&p2_token)).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["title"], "C");
    assert!(json["data"][0]["progress_stats"].is_object());

    let json = body_json(get(app.clone(), "/api/v1/projects", Some(&admin_token)).await).await;
    assert_eq!(json["total"], 3);

    let json = body_json(get(app, "/api/v1/projects?type=Series", Some(&admin_token)).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["title"], "B");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_paginates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    for i in 0..3 {
        create_project(app.clone(), &token, json!({ "title": format!("P{i}"), "type": "Movie" })).await;
    }

    let json = body_json(get(app, "/api/v1/projects?page=2&limit=2", Some(&token)).await).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["page"], 2);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn huge_page_number_returns_an_empty_page(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    create_project(app.clone(), &token, json!({ "title": "Only", "type": "Movie" })).await;

    let response = get(app, "/api/v1/projects?page=9223372036854775807", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["page"], i64::MAX);
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn broadcaster_sees_only_client_projects(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, admin_token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (client, client_token) = user_with_token(&app, &pool, "Station", "broadcaster").await;
    let (_other, other_token) = user_with_token(&app, &pool, "Other Station", "broadcaster").await;

    let id = create_project(
        app.clone(),
        &admin_token,
        json!({ "title": "Morning Show", "type": "Series", "client_id": client.id }),
    )
    .await;

    let response = get(app.clone(), &format!("/api/v1/projects/{id}"), Some(&client_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Morning Show");
    assert!(json["data"]["episodes"].is_array());
    assert!(json["data"]["assets"].is_array());

    let response = get(app.clone(), &format!("/api/v1/projects/{id}"), Some(&other_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(
        get(app, "/api/v1/projects/broadcaster/my-projects", Some(&client_token)).await,
    )
    .await;
    let cards = json["data"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["status"], "Draft");
    assert_eq!(cards[0]["episode_count"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_project_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;

    let response = get(app, "/api/v1/projects/999999", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn producer_cannot_update_someone_elses_project(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_p1, p1_token) = user_with_token(&app, &pool, "Owner", "producer").await;
    let (_p2, p2_token) = user_with_token(&app, &pool, "Intruder", "producer").await;
    let id = create_project(app.clone(), &p1_token, json!({ "title": "Mine", "type": "Movie" })).await;

    let response = put_json(
        app.clone(),
        &format!("/api/v1/projects/{id}"),
        json!({ "title": "Ours" }),
        Some(&p2_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json(
        app,
        &format!("/api/v1/projects/{id}"),
        json!({ "global_status": "In Progress" }),
        Some(&p1_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["global_status"], "In Progress");
    assert_eq!(json["data"]["title"], "Mine");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn null_party_ids_unassign_and_restore_default_names(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (client, client_token) = user_with_token(&app, &pool, "Channel Nine", "broadcaster").await;
    let investor = create_user(&pool, "Big Fund", "investor").await;
    let producer = create_user(&pool, "Pete", "producer").await;
    let id = create_project(
        app.clone(),
        &token,
        json!({
            "title": "Harbor Lights",
            "type": "Movie",
            "client_id": client.id,
            "investor_id": investor.id,
            "producer_id": producer.id
        }),
    )
    .await;
    let uri = format!("/api/v1/projects/{id}");

    let response = get(app.clone(), &uri, Some(&client_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Absent keys leave the parties alone.
    let response = put_json(app.clone(), &uri, json!({ "title": "Harbor Nights" }), Some(&token)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["client_id"], client.id);
    assert_eq!(json["data"]["producer_name"], "Pete");

    let response = put_json(
        app.clone(),
        &uri,
        json!({ "client_id": null, "investor_id": null, "producer_id": null }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["client_id"].is_null());
    assert_eq!(json["data"]["client_name"], "Internal Project");
    assert!(json["data"]["investor_id"].is_null());
    assert_eq!(json["data"]["investor_name"], "Internal Funding");
    assert!(json["data"]["producer_id"].is_null());
    assert!(json["data"]["producer_name"].is_null());
    assert_eq!(json["data"]["title"], "Harbor Nights");

    let response = get(app, &uri, Some(&client_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_checks_dates_against_stored_values(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let id = create_project(
        app.clone(),
        &token,
        json!({ "title": "Dated", "type": "Movie", "start_date": "2025-03-01" }),
    )
    .await;

    let response = put_json(
        app,
        &format!("/api/v1/projects/{id}"),
        json!({ "deadline_date": "2025-02-01" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_admin_deletes_projects(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, admin_token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (_producer, producer_token) = user_with_token(&app, &pool, "Prod", "producer").await;
    let id = create_project(app.clone(), &producer_token, json!({ "title": "Gone", "type": "TVC" })).await;

    let response = delete(app.clone(), &format!("/api/v1/projects/{id}"), Some(&producer_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(app.clone(), &format!("/api/v1/projects/{id}"), Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, &format!("/api/v1/projects/{id}"), Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Crew assignments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn assign_crew_and_reject_duplicates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let crew = create_user(&pool, "Gaffer", "crew").await;
    let producer = create_user(&pool, "Prod", "producer").await;
    let id = create_project(app.clone(), &token, json!({ "title": "Set", "type": "Movie" })).await;
    let uri = format!("/api/v1/projects/{id}/crew");

    let response = post_json(
        app.clone(),
        &uri,
        json!({ "user_id": crew.id, "role_in_project": " Lighting " }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["role_in_project"], "Lighting");

    let response = post_json(app.clone(), &uri, json!({ "user_id": crew.id }), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(app.clone(), &uri, json!({ "user_id": producer.id }), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(app.clone(), &uri, Some(&token)).await).await;
    let members = json["data"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_name"], "Gaffer");

    let json = body_json(
        get(app, &format!("{uri}/check/{}", crew.id), Some(&token)).await,
    )
    .await;
    assert_eq!(json["data"]["is_assigned"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bulk_assign_skips_existing_assignments(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let a = create_user(&pool, "Crew A", "crew").await;
    let b = create_user(&pool, "Crew B", "crew").await;
    let c = create_user(&pool, "Crew C", "crew").await;
    let id = create_project(app.clone(), &token, json!({ "title": "Bulk", "type": "Event" })).await;
    let uri = format!("/api/v1/projects/{id}/crew");

    post_json(app.clone(), &uri, json!({ "user_id": a.id }), Some(&token)).await;

    let response = post_json(
        app.clone(),
        &format!("{uri}/bulk"),
        json!({ "user_ids": [a.id, b.id, c.id, b.id] }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["assigned"], 2);
    assert_eq!(json["data"]["skipped"], 1);
    assert_eq!(json["data"]["total"], 3);

    let response = post_json(app.clone(), &format!("{uri}/bulk"), json!({ "user_ids": [] }), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(app, &format!("{uri}/available"), Some(&token)).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn crew_projects_lists_assignments(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, admin_token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (crew, crew_token) = user_with_token(&app, &pool, "Sound", "crew").await;
    let (other, _other_token) = user_with_token(&app, &pool, "Camera", "crew").await;
    let id = create_project(app.clone(), &admin_token, json!({ "title": "Docu", "type": "Movie" })).await;
    create_project(app.clone(), &admin_token, json!({ "title": "Elsewhere", "type": "Movie" })).await;

    post_json(
        app.clone(),
        &format!("/api/v1/projects/{id}/crew"),
        json!({ "user_id": crew.id }),
        Some(&admin_token),
    )
    .await;

    let response = get(app.clone(), &format!("/api/v1/crew/{}/projects", crew.id), Some(&crew_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let projects = json["data"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["title"], "Docu");

    // Crew may only look up themselves.
    let response = get(app.clone(), &format!("/api/v1/crew/{}/projects", other.id), Some(&crew_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The assigned crew member now sees the project in their list.
    let json = body_json(get(app, "/api/v1/projects", Some(&crew_token)).await).await;
    assert_eq!(json["total"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_and_remove_crew_assignment(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let crew = create_user(&pool, "Grip", "crew").await;
    let id = create_project(app.clone(), &token, json!({ "title": "Rig", "type": "TVC" })).await;
    let uri = format!("/api/v1/projects/{id}/crew");
    post_json(app.clone(), &uri, json!({ "user_id": crew.id }), Some(&token)).await;

    let response = put_json(
        app.clone(),
        &format!("{uri}/{}", crew.id),
        json!({ "role_in_project": "Key Grip" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["role_in_project"], "Key Grip");

    let response = delete(app.clone(), &format!("{uri}/{}", crew.id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete(app, &format!("{uri}/{}", crew.id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
