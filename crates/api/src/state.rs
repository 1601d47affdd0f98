use std::path::PathBuf;
use std::sync::Arc;

use dreamlight_core::assets::project_dir_name;
use dreamlight_core::types::DbId;
use dreamlight_db::DbPool;

use crate::config::ServerConfig;

/// Handler state: the connection pool and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    /// Directory holding uploaded files of one project.
    pub fn project_upload_dir(&self, project_id: DbId) -> PathBuf {
        self.config.upload_dir.join(project_dir_name(project_id))
    }
}
