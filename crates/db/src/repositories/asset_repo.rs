//! Repository for the `assets` table.

use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::types::DbId;
use sqlx::PgPool;

use super::PROJECT_SCOPE;
use crate::models::asset::{Asset, AssetDetail, AssetListFilter, CreateAsset, UpdateAsset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, episode_id, file_name, file_path, file_type, file_size, \
                       category, is_public_to_broadcaster, is_external, external_url, link_type, \
                       uploaded_by, created_at, updated_at";

/// `SELECT ... FROM` for [`AssetDetail`], aliasing projects as `p`.
const DETAIL_SELECT: &str = "SELECT a.id, a.project_id, a.episode_id, a.file_name, a.file_path, \
            a.file_type, a.file_size, a.category, a.is_public_to_broadcaster, a.is_external, \
            a.external_url, a.link_type, a.uploaded_by, a.created_at, a.updated_at, \
            p.title AS project_title, p.client_id AS project_client_id, \
            e.title AS episode_title, u.name AS uploader_name \
     FROM assets a \
     JOIN projects p ON p.id = a.project_id \
     LEFT JOIN episodes e ON e.id = a.episode_id \
     LEFT JOIN users u ON u.id = a.uploaded_by";

/// Filter predicate for [`AssetListFilter`], bound after the scope as `$5`..`$8`.
const LIST_FILTER: &str = "($5::BIGINT IS NULL OR a.project_id = $5) \
     AND ($6::BIGINT IS NULL OR a.episode_id = $6) \
     AND ($7::TEXT IS NULL OR a.category = $7) \
     AND ($8::BOOLEAN IS NULL OR a.is_public_to_broadcaster = $8)";

/// Provides CRUD operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Insert a new asset, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAsset) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets
                (project_id, episode_id, file_name, file_path, file_type, file_size, category,
                 is_public_to_broadcaster, is_external, external_url, link_type, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(input.project_id)
            .bind(input.episode_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(&input.file_type)
            .bind(input.file_size)
            .bind(&input.category)
            .bind(input.is_public_to_broadcaster)
            .bind(input.is_external)
            .bind(&input.external_url)
            .bind(&input.link_type)
            .bind(input.uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Find an asset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset with its project, episode and uploader names.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<AssetDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE a.id = $1");
        sqlx::query_as::<_, AssetDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List assets on projects visible under `scope`, newest first.
    ///
    /// `public_only` restricts the result to assets shared with broadcasters.
    pub async fn list(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        filter: &AssetListFilter,
        public_only: bool,
    ) -> Result<Vec<AssetDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE {PROJECT_SCOPE} AND {LIST_FILTER}
             ORDER BY a.created_at DESC, a.id DESC"
        );
        sqlx::query_as::<_, AssetDetail>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(filter.project_id)
            .bind(filter.episode_id)
            .bind(&filter.category)
            .bind(public_only.then_some(true))
            .fetch_all(pool)
            .await
    }

    /// Assets of one project, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets WHERE project_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update asset metadata. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAsset,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET
                file_name = COALESCE($2, file_name),
                category = COALESCE($3, category),
                is_public_to_broadcaster = COALESCE($4, is_public_to_broadcaster)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(&input.file_name)
            .bind(&input.category)
            .bind(input.is_public_to_broadcaster)
            .fetch_optional(pool)
            .await
    }

    /// Delete an asset row, returning it so the caller can remove the file.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("DELETE FROM assets WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
