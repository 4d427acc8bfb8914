//! Common API utilities and shared types

use serde::{Deserialize, Serialize};

use crate::models::{ListParams, DEFAULT_PER_PAGE};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size of the listing pages
pub fn default_page_size() -> u32 {
    DEFAULT_PER_PAGE
}

/// Basic pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl From<PaginationQuery> for ListParams {
    fn from(query: PaginationQuery) -> Self {
        ListParams::new(query.page, query.page_size)
    }
}

/// Body of a successful mutation without payload
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
