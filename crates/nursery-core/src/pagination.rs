//! Page-based pagination for list endpoints.
//!
//! List endpoints accept `?page=N&limit=M` (flattened into their filter
//! structs) and answer with `{ data, meta }`:
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 42, "page": 2, "limit": 10, "total_pages": 5, "has_more": true }
//! }
//! ```
//!
//! Query strings reach serde as text when a struct is `#[serde(flatten)]`ed,
//! so numeric fields go through [`deserialize_optional_i64`], which also maps
//! empty values (`?page=`) to `None`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub use crate::serde::deserialize_optional_i64;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching rows
    pub total: i64,
    /// Current page (1-indexed)
    pub page: i64,
    /// Items per page after clamping
    pub limit: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let page = params.page();
        let total = total.max(0);
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            has_more: params.offset() + limit < total,
        }
    }
}

/// Query parameters for paginated lists.
///
/// `limit` is clamped to `[1, 100]` and `page` to a minimum of 1.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PaginationParams {
        PaginationParams { page, limit }
    }

    #[test]
    fn test_defaults() {
        let p = PaginationParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(None, Some(0)).limit(), 1);
        assert_eq!(params(None, Some(-3)).limit(), 1);
        assert_eq!(params(None, Some(250)).limit(), 100);
        assert_eq!(params(None, Some(100)).limit(), 100);
    }

    #[test]
    fn test_page_below_one_is_first_page() {
        let p = params(Some(-2), Some(20));
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset_from_page() {
        assert_eq!(params(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_meta_counts_pages() {
        let meta = PaginationMeta::new(42, &params(Some(2), Some(10)));
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_more);

        let last = PaginationMeta::new(42, &params(Some(5), Some(10)));
        assert!(!last.has_more);
    }

    #[test]
    fn test_meta_empty_result() {
        let meta = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_deserialize_from_query_strings() {
        let p: PaginationParams = serde_json::from_str(r#"{"page":"4","limit":""}"#).unwrap();
        assert_eq!(p.page, Some(4));
        assert_eq!(p.limit, None);
    }
}
