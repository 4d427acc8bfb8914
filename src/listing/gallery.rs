//! Gallery listing

use serde::{Deserialize, Serialize};

use super::{active_filter, paginate, slug_matches};
use crate::models::{GalleryItem, ListParams, PagedResult};
use chrono::Datelike;

/// Filters of the gallery page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryQuery {
    /// Event slug
    pub event: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
}

impl GalleryQuery {
    pub fn matches(&self, item: &GalleryItem) -> bool {
        let event_ok = match active_filter(self.event.as_deref()) {
            Some(slug) => item.event_slug.eq_ignore_ascii_case(slug),
            None => true,
        };
        let year_ok = self
            .year
            .map_or(true, |year| item.event_starts_at.year() == year);

        event_ok
            && year_ok
            && slug_matches(
                self.category.as_deref(),
                item.category.as_ref().map(|c| c.slug.as_str()),
            )
    }
}

/// Filter and paginate gallery photos, keeping the repository order
pub fn list_gallery(
    items: Vec<GalleryItem>,
    query: &GalleryQuery,
    params: &ListParams,
) -> PagedResult<GalleryItem> {
    let matching: Vec<GalleryItem> = items.into_iter().filter(|i| query.matches(i)).collect();
    paginate(matching, params)
}

/// Distinct event years present in the gallery, most recent first
pub fn gallery_years(items: &[GalleryItem]) -> Vec<i32> {
    let mut years: Vec<i32> = items.iter().map(|i| i.event_starts_at.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}
