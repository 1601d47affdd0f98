//! HTTP-level integration tests for asset uploads, external links, downloads
//! and broadcaster visibility.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_bytes, body_json, create_project, delete, get, post_json, put_json, user_with_token};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

const BOUNDARY: &str = "dreamlight-test-boundary";

/// Encode text fields plus one file part as `multipart/form-data`.
fn multipart_body(fields: &[(&str, &str)], file_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: axum::Router,
    token: &str,
    fields: &[(&str, &str)],
    file_name: &str,
    contents: &[u8],
) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/assets")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file_name, contents)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_then_download_streams_the_file(pool: PgPool) {
    let upload_dir = tempfile::tempdir().expect("create temp dir");
    let app = common::build_test_app_with_uploads(pool.clone(), upload_dir.path());
    let (_producer, token) = user_with_token(&app, &pool, "Prod", "producer").await;
    let project_id = create_project(app.clone(), &token, json!({ "title": "Docs", "type": "Movie" })).await;
    let project = project_id.to_string();

    let response = upload(
        app.clone(),
        &token,
        &[("project_id", &project), ("category", "Script")],
        "Final Draft.pdf",
        b"%PDF-1.4 test",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let asset_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["file_name"], "Final Draft.pdf");
    assert_eq!(json["data"]["file_type"], "application/pdf");
    assert_eq!(json["data"]["file_size"], 13);
    assert_eq!(json["data"]["is_external"], false);

    let stored = upload_dir.path().join(format!("project_{project_id}"));
    assert_eq!(std::fs::read_dir(&stored).unwrap().count(), 1);

    let response = get(app.clone(), &format!("/api/v1/assets/{asset_id}/download"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Final Draft.pdf\""
    );
    assert_eq!(body_bytes(response).await, b"%PDF-1.4 test");

    let response = delete(app, &format!("/api/v1/assets/{asset_id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(&stored).unwrap().count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_extension_outside_category(pool: PgPool) {
    let upload_dir = tempfile::tempdir().expect("create temp dir");
    let app = common::build_test_app_with_uploads(pool.clone(), upload_dir.path());
    let (_producer, token) = user_with_token(&app, &pool, "Prod", "producer").await;
    let project_id = create_project(app.clone(), &token, json!({ "title": "Docs", "type": "Movie" })).await;
    let project = project_id.to_string();

    let response = upload(
        app.clone(),
        &token,
        &[("project_id", &project), ("category", "Contract")],
        "clip.mp4",
        b"not really a video",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(app, &token, &[("category", "Script")], "notes.txt", b"notes").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn external_links_detect_type_and_cannot_be_downloaded(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_producer, token) = user_with_token(&app, &pool, "Prod", "producer").await;
    let project_id = create_project(app.clone(), &token, json!({ "title": "Links", "type": "TVC" })).await;

    let response = post_json(
        app.clone(),
        "/api/v1/assets/links",
        json!({
            "project_id": project_id,
            "file_name": "Rough cut",
            "external_url": "https://www.youtube.com/watch?v=abc123",
            "category": "Preview Video"
        }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let asset_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["is_external"], true);
    assert_eq!(json["data"]["link_type"], "youtube");

    let response = get(app.clone(), &format!("/api/v1/assets/{asset_id}/download"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/api/v1/assets/links",
        json!({ "project_id": project_id, "file_name": "Bad", "external_url": "ftp://files.example.com/a" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn assets_reject_episodes_of_other_projects(pool: PgPool) {
    let upload_dir = tempfile::tempdir().expect("create temp dir");
    let app = common::build_test_app_with_uploads(pool.clone(), upload_dir.path());
    let (_producer, token) = user_with_token(&app, &pool, "Prod", "producer").await;
    let project_id = create_project(app.clone(), &token, json!({ "title": "Docs", "type": "Series" })).await;
    let other_id = create_project(app.clone(), &token, json!({ "title": "Other", "type": "Series" })).await;
    let response = post_json(
        app.clone(),
        "/api/v1/episodes",
        json!({ "project_id": other_id, "title": "Pilot", "episode_number": 1 }),
        Some(&token),
    )
    .await;
    let foreign_episode = body_json(response).await["data"]["id"].as_i64().unwrap().to_string();
    let project = project_id.to_string();

    let response = upload(
        app.clone(),
        &token,
        &[("project_id", &project), ("episode_id", &foreign_episode), ("category", "Script")],
        "pilot.pdf",
        b"%PDF-1.4 pilot",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!upload_dir.path().join(format!("project_{project_id}")).exists());

    let response = post_json(
        app,
        "/api/v1/assets/links",
        json!({
            "project_id": project_id,
            "episode_id": foreign_episode.parse::<i64>().unwrap(),
            "file_name": "Pilot cut",
            "external_url": "https://vimeo.com/12345"
        }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn broadcasters_only_see_public_assets_of_their_projects(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_admin, admin_token) = user_with_token(&app, &pool, "Admin", "admin").await;
    let (client, client_token) = user_with_token(&app, &pool, "Station", "broadcaster").await;
    let project_id = create_project(
        app.clone(),
        &admin_token,
        json!({ "title": "Weekly", "type": "Series", "client_id": client.id }),
    )
    .await;

    let mut ids = Vec::new();
    for (name, public) in [("Trailer", true), ("Budget sheet", false)] {
        let response = post_json(
            app.clone(),
            "/api/v1/assets/links",
            json!({
                "project_id": project_id,
                "file_name": name,
                "external_url": "https://drive.google.com/file/d/xyz",
                "is_public_to_broadcaster": public
            }),
            Some(&admin_token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(body_json(response).await["data"]["id"].as_i64().unwrap());
    }

    let json = body_json(get(app.clone(), "/api/v1/assets", Some(&client_token)).await).await;
    let assets = json["data"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["file_name"], "Trailer");

    let response = get(app.clone(), &format!("/api/v1/assets/{}", ids[1]), Some(&client_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(
        get(app.clone(), "/api/v1/assets/broadcaster/my-files", Some(&client_token)).await,
    )
    .await;
    assert_eq!(json["data"]["files"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["grouped"]["others"].as_array().unwrap().len(), 1);

    let json = body_json(get(app, "/api/v1/assets", Some(&admin_token)).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn asset_metadata_update_checks_ownership(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_owner, owner_token) = user_with_token(&app, &pool, "Owner", "producer").await;
    let (_other, other_token) = user_with_token(&app, &pool, "Other", "producer").await;
    let project_id = create_project(app.clone(), &owner_token, json!({ "title": "Mine", "type": "Movie" })).await;

    let response = post_json(
        app.clone(),
        "/api/v1/assets/links",
        json!({ "project_id": project_id, "file_name": "Deck", "external_url": "https://www.dropbox.com/s/deck" }),
        Some(&owner_token),
    )
    .await;
    let asset_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json(
        app.clone(),
        &format!("/api/v1/assets/{asset_id}"),
        json!({ "is_public_to_broadcaster": true }),
        Some(&other_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json(
        app,
        &format!("/api/v1/assets/{asset_id}"),
        json!({ "file_name": "Pitch deck", "category": "Contract" }),
        Some(&owner_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["file_name"], "Pitch deck");
    assert_eq!(json["data"]["category"], "Contract");
    assert_eq!(json["data"]["link_type"], "dropbox");
}
