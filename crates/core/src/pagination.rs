//! Page/limit arithmetic for paginated list endpoints.

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolved pagination window for a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Clamp user-supplied `?page=&limit=` values.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            limit: clamp_limit(limit),
        }
    }

    /// Rows to skip. Saturates for absurdly large pages, which then read
    /// past the end and come back empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        total_pages(total, self.limit)
    }
}

/// Pages are 1-based; anything below 1 becomes 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// `ceil(total / limit)`; 0 when there are no rows.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        let page = Page::new(None, None);
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn values_are_clamped() {
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-4)), 1);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(25)), 25);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn offset_of_huge_page_saturates() {
        assert_eq!(Page::new(Some(i64::MAX), Some(100)).offset(), i64::MAX);
        assert_eq!(Page::new(Some(i64::MAX), Some(1)).offset(), i64::MAX - 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(Page::new(None, Some(3)).total_pages(7), 3);
    }
}
