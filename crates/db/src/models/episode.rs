//! Episode entity model and DTOs.

use dreamlight_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An episode row from the `episodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Episode {
    pub id: DbId,
    pub project_id: DbId,
    pub producer_id: Option<DbId>,
    pub producer_name: Option<String>,
    pub title: String,
    pub episode_number: i32,
    pub status: String,
    pub synopsis: Option<String>,
    pub airing_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new episode.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEpisode {
    pub project_id: DbId,
    pub title: String,
    pub episode_number: i32,
    /// Defaults to `Scripting` if omitted.
    pub status: Option<String>,
    pub synopsis: Option<String>,
    pub airing_date: Option<Date>,
}

/// DTO for updating an existing episode. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEpisode {
    pub title: Option<String>,
    pub episode_number: Option<i32>,
    pub status: Option<String>,
    pub synopsis: Option<String>,
    pub airing_date: Option<Date>,
}
