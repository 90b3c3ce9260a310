//! Pagination DTOs shared by the list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for paginated list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
pub struct PaginationParams {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Number of items per page (max 100)
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub page_size: u32,
}

impl PaginationParams {
    /// Clamps out-of-range values to safe defaults.
    ///
    /// Validation already rejects bad input at the extractor; this is the
    /// backstop for params built in code.
    pub fn normalize(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.page_size == 0 || self.page_size > 100 {
            self.page_size = default_page_size();
        }
        self
    }

    /// Row offset for the backing query.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Row limit for the backing query.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

/// Generic paged response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    /// The data items for this page
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number (1-based)
    #[schema(example = 1)]
    pub page: u32,

    /// Number of items per page
    #[schema(example = 20)]
    pub page_size: u32,

    /// Total number of items across all pages
    #[schema(example = 100)]
    pub total_items: u64,

    /// Total number of pages
    #[schema(example = 5)]
    pub total_pages: u32,

    /// Whether there is a next page
    #[schema(example = true)]
    pub has_next: bool,

    /// Whether there is a previous page
    #[schema(example = false)]
    pub has_prev: bool,
}

impl<T> PagedResponse<T> {
    /// Wraps one page of data with metadata derived from the total row count.
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(params.page_size)) as u32;
        Self {
            data,
            pagination: PaginationMeta {
                page: params.page,
                page_size: params.page_size,
                total_items,
                total_pages,
                has_next: params.page < total_pages,
                has_prev: params.page > 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let params = PaginationParams {
            page: 3,
            page_size: 25,
        };
        assert_eq!(params.offset(), 50);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_first_page_has_zero_offset() {
        let params = PaginationParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_normalize_clamps_invalid_values() {
        let params = PaginationParams {
            page: 0,
            page_size: 500,
        }
        .normalize();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 20);
    }

    #[test]
    fn test_paged_response_metadata() {
        let params = PaginationParams {
            page: 2,
            page_size: 10,
        };
        let response = PagedResponse::new(vec![1, 2, 3], &params, 45);

        assert_eq!(response.data.len(), 3);
        assert_eq!(response.pagination.total_items, 45);
        assert_eq!(response.pagination.total_pages, 5);
        assert!(response.pagination.has_next);
        assert!(response.pagination.has_prev);
    }

    #[test]
    fn test_paged_response_last_page() {
        let params = PaginationParams {
            page: 5,
            page_size: 10,
        };
        let response = PagedResponse::new(vec![0; 5], &params, 45);

        assert!(!response.pagination.has_next);
        assert!(response.pagination.has_prev);
    }

    #[test]
    fn test_paged_response_empty() {
        let params = PaginationParams::default();
        let response = PagedResponse::<i32>::new(vec![], &params, 0);

        assert_eq!(response.pagination.total_pages, 0);
        assert!(!response.pagination.has_next);
        assert!(!response.pagination.has_prev);
    }
}
