//! Handlers for the `/assets` resource: uploaded files stored under
//! `UPLOAD_DIR/project_<id>/` and external links to hosted files.

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use dreamlight_core::access::{check_asset_owner, check_asset_visibility, project_filter_for, ProjectScopeBinds};
use dreamlight_core::assets::{
    detect_link_type, file_extension, group_by_category, stored_file_name,
    validate_asset_source, validate_external_url, validate_upload_extension,
};
use dreamlight_core::production::{validate_asset_category, validate_link_type, ASSET_CATEGORY_OTHER};
use dreamlight_core::roles::Role;
use dreamlight_core::types::DbId;
use dreamlight_core::validation::{validate_required_text, MAX_TITLE_LEN};
use dreamlight_db::models::asset::{Asset, AssetDetail, AssetListFilter, CreateAsset, UpdateAsset};
use dreamlight_db::repositories::AssetRepo;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::middleware::access::{
    ensure_episode_in_project, ensure_producer_access, ensure_project_access,
};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireBroadcaster, RequireManager};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub file_name: String,
    pub external_url: String,
    pub category: Option<String>,
    /// Detected from the URL when omitted.
    pub link_type: Option<String>,
    #[serde(default)]
    pub is_public_to_broadcaster: bool,
}

/// Public files of a broadcaster, flat and grouped by category.
#[derive(Debug, Serialize)]
pub struct BroadcasterFiles {
    pub files: Vec<AssetDetail>,
    pub grouped: BTreeMap<&'static str, Vec<AssetDetail>>,
}

/// Fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    project_id: Option<DbId>,
    episode_id: Option<DbId>,
    category: Option<String>,
    is_public_to_broadcaster: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn content_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("txt") => "text/plain",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mxf") => "application/mxf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("zip") => "application/zip",
        Some("rar") => "application/vnd.rar",
        _ => "application/octet-stream",
    }
}

fn parse_id(field: &str, value: &str) -> AppResult<DbId> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.file = Some((file_name, data.to_vec()));
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "project_id" => form.project_id = Some(parse_id("project_id", &text)?),
            "episode_id" if !text.trim().is_empty() => {
                form.episode_id = Some(parse_id("episode_id", &text)?)
            }
            "category" if !text.trim().is_empty() => form.category = Some(text.trim().to_string()),
            "is_public_to_broadcaster" => form.is_public_to_broadcaster = parse_flag(&text),
            _ => {}
        }
    }

    Ok(form)
}

/// Load an asset the caller may see.
async fn visible_asset(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<AssetDetail> {
    let detail = AssetRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Asset", id))?;
    check_asset_visibility(
        user.role,
        user.user_id,
        detail.project_client_id,
        detail.asset.is_public_to_broadcaster,
    )?;
    ensure_project_access(&state.pool, user, detail.asset.project_id).await?;
    Ok(detail)
}

/// Managers must manage the asset's project unless they uploaded it.
async fn ensure_can_modify(state: &AppState, user: &AuthUser, asset: &Asset) -> AppResult<()> {
    check_asset_owner(user.role, user.user_id, asset.uploaded_by)?;
    if asset.uploaded_by != user.user_id {
        ensure_producer_access(&state.pool, user, asset.project_id).await?;
    }
    Ok(())
}

async fn remove_stored_file(path: &str) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path, error = %e, "Failed to remove stored asset file");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/assets
///
/// Broadcasters only see public assets of projects they are the client of.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<AssetListFilter>,
) -> AppResult<Json<DataResponse<Vec<AssetDetail>>>> {
    let scope = project_filter_for(user.user_id, user.role).binds();
    let public_only = user.role == Role::Broadcaster;
    let assets = AssetRepo::list(&state.pool, &scope, &filter, public_only).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// POST /api/v1/assets (multipart)
///
/// Fields: `file`, `project_id`, `episode_id`, `category`,
/// `is_public_to_broadcaster`.
pub async fn upload(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Asset>>)> {
    let form = read_upload_form(multipart).await?;

    let (original_name, data) = form
        .file
        .ok_or_else(|| AppError::BadRequest("Please upload a file".into()))?;
    let project_id = form
        .project_id
        .ok_or_else(|| AppError::BadRequest("project_id is required".into()))?;
    let category = form.category.unwrap_or_else(|| ASSET_CATEGORY_OTHER.to_string());
    validate_asset_category(&category)?;
    validate_upload_extension(&original_name, Some(&category))?;

    ensure_producer_access(&state.pool, &user, project_id).await?;
    if let Some(episode_id) = form.episode_id {
        ensure_episode_in_project(&state.pool, project_id, episode_id).await?;
    }

    let dir = state.project_upload_dir(project_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload directory: {e}")))?;

    let unique = uuid::Uuid::new_v4().simple().to_string();
    let file_path = dir.join(stored_file_name(&original_name, &unique));
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;
    let file_path = file_path.to_string_lossy().to_string();

    let input = CreateAsset {
        project_id,
        episode_id: form.episode_id,
        file_name: original_name.clone(),
        file_path: Some(file_path.clone()),
        file_type: Some(content_type_for(&original_name).to_string()),
        file_size: Some(data.len() as i64),
        category,
        is_public_to_broadcaster: form.is_public_to_broadcaster,
        is_external: false,
        external_url: None,
        link_type: None,
        uploaded_by: user.user_id,
    };

    let asset = match AssetRepo::create(&state.pool, &input).await {
        Ok(asset) => asset,
        Err(e) => {
            remove_stored_file(&file_path).await;
            return Err(e.into());
        }
    };
    tracing::info!(
        asset_id = asset.id,
        project_id,
        file_size = data.len(),
        uploaded_by = user.user_id,
        "Asset uploaded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// POST /api/v1/assets/links
pub async fn create_link(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CreateLinkRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Asset>>)> {
    let file_name = input.file_name.trim();
    validate_required_text("File name", file_name, MAX_TITLE_LEN)?;
    let external_url = input.external_url.trim();
    validate_external_url(external_url)?;
    validate_asset_source(None, Some(external_url))?;
    let category = input
        .category
        .unwrap_or_else(|| ASSET_CATEGORY_OTHER.to_string());
    validate_asset_category(&category)?;
    let link_type = match input.link_type.as_deref() {
        Some(link_type) => {
            validate_link_type(link_type)?;
            link_type.to_string()
        }
        None => detect_link_type(external_url).to_string(),
    };

    ensure_producer_access(&state.pool, &user, input.project_id).await?;
    if let Some(episode_id) = input.episode_id {
        ensure_episode_in_project(&state.pool, input.project_id, episode_id).await?;
    }

    let asset = AssetRepo::create(
        &state.pool,
        &CreateAsset {
            project_id: input.project_id,
            episode_id: input.episode_id,
            file_name: file_name.to_string(),
            file_path: None,
            file_type: None,
            file_size: None,
            category,
            is_public_to_broadcaster: input.is_public_to_broadcaster,
            is_external: true,
            external_url: Some(external_url.to_string()),
            link_type: Some(link_type),
            uploaded_by: user.user_id,
        },
    )
    .await?;
    tracing::info!(
        asset_id = asset.id,
        project_id = asset.project_id,
        link_type = asset.link_type.as_deref().unwrap_or_default(),
        "External asset linked"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// GET /api/v1/assets/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AssetDetail>>> {
    let asset = visible_asset(&state, &user, id).await?;
    Ok(Json(DataResponse { data: asset }))
}

/// PUT /api/v1/assets/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateAsset>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let existing = AssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Asset", id))?;
    ensure_can_modify(&state, &user, &existing).await?;

    if let Some(file_name) = input.file_name.as_mut() {
        validate_required_text("File name", file_name, MAX_TITLE_LEN)?;
        *file_name = file_name.trim().to_string();
    }
    if let Some(category) = input.category.as_deref() {
        validate_asset_category(category)?;
    }

    let asset = AssetRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Asset", id))?;
    tracing::info!(asset_id = id, updated_by = user.user_id, "Asset updated");

    Ok(Json(DataResponse { data: asset }))
}

/// DELETE /api/v1/assets/{id}
///
/// The stored file is removed after the row; a missing file is only logged.
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let existing = AssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Asset", id))?;
    ensure_can_modify(&state, &user, &existing).await?;

    if let Some(asset) = AssetRepo::delete(&state.pool, id).await? {
        if let Some(path) = asset.file_path.as_deref().filter(|_| !asset.is_external) {
            remove_stored_file(path).await;
        }
    }
    tracing::info!(asset_id = id, deleted_by = user.user_id, "Asset deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Asset deleted successfully"),
    }))
}

/// GET /api/v1/assets/{id}/download
///
/// Streams the stored file as an attachment. External links cannot be downloaded.
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = visible_asset(&state, &user, id).await?;
    let asset = detail.asset;

    let file_path = match asset.file_path.as_deref() {
        Some(path) if !asset.is_external => path.to_string(),
        _ => {
            return Err(AppError::BadRequest(
                "External links cannot be downloaded".into(),
            ))
        }
    };

    let file = match tokio::fs::File::open(FsPath::new(&file_path)).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found("Asset file", id))
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };
    let length = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();

    let content_type = asset
        .file_type
        .clone()
        .unwrap_or_else(|| content_type_for(&asset.file_name).to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        asset.file_name.replace(['"', '\\'], "_")
    );
    tracing::debug!(asset_id = id, user_id = user.user_id, length, "Asset download");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}

/// GET /api/v1/assets/broadcaster/my-files
pub async fn broadcaster_files(
    State(state): State<AppState>,
    RequireBroadcaster(user): RequireBroadcaster,
) -> AppResult<Json<DataResponse<BroadcasterFiles>>> {
    let scope = ProjectScopeBinds {
        client_id: Some(user.user_id),
        ..Default::default()
    };
    let files = AssetRepo::list(&state.pool, &scope, &AssetListFilter::default(), true).await?;
    let grouped = group_by_category(files.clone(), |a| a.asset.category.as_str());

    Ok(Json(DataResponse {
        data: BroadcasterFiles { files, grouped },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("cut.MP4"), "video/mp4");
        assert_eq!(content_type_for("script.pdf"), "application/pdf");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn form_flags_accept_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("On"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn form_ids_must_be_numeric() {
        assert_eq!(parse_id("project_id", " 42 ").unwrap(), 42);
        assert!(parse_id("project_id", "abc").is_err());
    }
}
