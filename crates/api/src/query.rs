//! Shared query parameter types for API handlers.

use dreamlight_core::pagination::Page;
use serde::Deserialize;

/// Generic pagination parameters (`?page=&limit=`).
///
/// Values are clamped through [`Page::new`]: page ≥ 1, 1 ≤ limit ≤ 100.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// `?view=active|history` selector for crew task lists.
#[derive(Debug, Default, Deserialize)]
pub struct TaskViewParams {
    pub view: Option<String>,
}

impl TaskViewParams {
    pub fn is_history(&self) -> bool {
        self.view.as_deref() == Some("history")
    }
}
