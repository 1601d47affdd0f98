//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Paginated lists use
//! [`PaginatedResponse`], which adds `total`, `page` and `total_pages`.

use dreamlight_core::pagination::Page;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "total", "page", "total_pages" }` envelope for paged lists.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            data,
            total,
            page: page.page,
            total_pages: page.total_pages(total),
        }
    }
}

/// `{ "message": ... }` payload for endpoints that only acknowledge an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
