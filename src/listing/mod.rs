//! Listing logic
//!
//! Filtering, sorting and pagination of already-loaded content. Everything
//! here is pure: services fetch the published rows (through the cache) and
//! hand them to these functions together with the visitor's query.

pub mod blog;
pub mod events;
pub mod gallery;

pub use blog::{BlogQuery, BlogSort};
pub use events::{EventQuery, EventSort, Period};
pub use gallery::GalleryQuery;

use crate::models::{ListParams, PagedResult};

/// Cut one page out of `items`
///
/// A page past the end yields no items but keeps the real totals.
pub fn paginate<T>(items: Vec<T>, params: &ListParams) -> PagedResult<T> {
    let total = items.len();
    let page: Vec<T> = items
        .into_iter()
        .skip(params.offset())
        .take(params.per_page as usize)
        .collect();
    PagedResult::new(page, total, params)
}

/// Normalise a filter value: `None`, blank and `"all"` mean no filter
pub(crate) fn active_filter(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Whether an optional slug satisfies a filter
pub(crate) fn slug_matches(filter: Option<&str>, slug: Option<&str>) -> bool {
    match active_filter(filter) {
        Some(wanted) => slug.is_some_and(|s| s.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

/// Case-insensitive substring search over several fields
pub(crate) fn search_matches<'a>(
    needle: Option<&str>,
    fields: impl IntoIterator<Item = &'a str>,
) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}
