//! Pagination types shared by every listing

use serde::{Deserialize, Serialize};

/// Default page size of the listing pages (a 3x3 card grid)
pub const DEFAULT_PER_PAGE: u32 = 9;

/// Largest page size a caller may request
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping out-of-range values
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Index of the first item of the page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.per_page as usize)
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: usize, params: &ListParams) -> Self {
        let per_page = params.per_page.max(1) as usize;
        let total_pages = total.div_ceil(per_page) as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
        }
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0, &ListParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 1000);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, MAX_PER_PAGE);

        let params = ListParams::new(3, 0);
        assert_eq!(params.per_page, 1);
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn test_total_pages() {
        let params = ListParams::new(1, 9);
        assert_eq!(PagedResult::<u8>::new(vec![], 0, &params).total_pages, 0);
        assert_eq!(PagedResult::<u8>::new(vec![], 9, &params).total_pages, 1);
        assert_eq!(PagedResult::<u8>::new(vec![], 10, &params).total_pages, 2);
    }

    #[test]
    fn test_navigation_flags() {
        let result = PagedResult::new(vec![1, 2], 20, &ListParams::new(2, 9));
        assert!(result.has_prev());
        assert!(result.has_next());

        let last = PagedResult::new(vec![1], 19, &ListParams::new(3, 9));
        assert!(!last.has_next());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let result = PagedResult::new(vec![1, 2, 3], 12, &ListParams::new(2, 3)).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20, 30]);
        assert_eq!(result.total, 12);
        assert_eq!(result.total_pages, 4);
    }
}
