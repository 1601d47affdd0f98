//! Asset (uploaded file or external link) model and DTOs.

use dreamlight_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An asset row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub file_name: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub category: String,
    pub is_public_to_broadcaster: bool,
    pub is_external: bool,
    pub external_url: Option<String>,
    pub link_type: Option<String>,
    pub uploaded_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An asset joined with its project, episode and uploader names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub asset: Asset,
    pub project_title: String,
    pub project_client_id: Option<DbId>,
    pub episode_title: Option<String>,
    pub uploader_name: Option<String>,
}

/// DTO for inserting an asset. Built by the upload and link handlers.
#[derive(Debug, Clone)]
pub struct CreateAsset {
    pub project_id: DbId,
    pub episode_id: Option<DbId>,
    pub file_name: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub category: String,
    pub is_public_to_broadcaster: bool,
    pub is_external: bool,
    pub external_url: Option<String>,
    pub link_type: Option<String>,
    pub uploaded_by: DbId,
}

/// DTO for updating asset metadata. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAsset {
    pub file_name: Option<String>,
    pub category: Option<String>,
    pub is_public_to_broadcaster: Option<bool>,
}

/// Filters for the asset list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetListFilter {
    pub project_id: Option<DbId>,
    pub episode_id: Option<DbId>,
    pub category: Option<String>,
}
