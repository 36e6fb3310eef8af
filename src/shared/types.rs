use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Clamped page window derived from 1-indexed `page` / `page_size` inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let limit = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).max(1);
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        let w = PageWindow::new(None, None);
        assert_eq!(w.offset, 0);
        assert_eq!(w.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_window_clamps() {
        let w = PageWindow::new(Some(0), Some(10_000));
        assert_eq!(w.offset, 0);
        assert_eq!(w.limit, MAX_PAGE_SIZE);

        let w = PageWindow::new(Some(3), Some(10));
        assert_eq!(w.offset, 20);
        assert_eq!(w.limit, 10);
    }
}
