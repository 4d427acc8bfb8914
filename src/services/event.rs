//! Event service
//!
//! Published events and the photo gallery. Cached under `events:*`, which
//! registrations invalidate since they move the seat counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{QueryCache, QueryState};
use crate::db::repositories::EventRepository;
use crate::listing::events::list_events;
use crate::listing::gallery::{gallery_years, list_gallery};
use crate::listing::{EventQuery, GalleryQuery};
use crate::models::{Event, GalleryItem, ListParams, PagedResult};

/// One page of the gallery plus the years available for the year filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryPage {
    #[serde(flatten)]
    pub photos: PagedResult<GalleryItem>,
    pub years: Vec<i32>,
}

pub struct EventService {
    events: Arc<dyn EventRepository>,
    cache: QueryCache,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>, cache: QueryCache) -> Self {
        Self { events, cache }
    }

    /// Published events matching the query, one page of them
    pub async fn list(&self, query: &EventQuery, params: &ListParams) -> QueryState<PagedResult<Event>> {
        self.list_at(query, params, Utc::now()).await
    }

    /// [`list`](Self::list) with an explicit reference time for the period filter
    pub async fn list_at(
        &self,
        query: &EventQuery,
        params: &ListParams,
        now: DateTime<Utc>,
    ) -> QueryState<PagedResult<Event>> {
        let state: QueryState<Vec<Event>> = self
            .cache
            .query("events:list", || self.events.list_published())
            .await;
        state.map(|events| list_events(events, query, params, now))
    }

    /// A published event with its speakers and gallery
    pub async fn get(&self, slug: &str) -> QueryState<Option<Event>> {
        let key = format!("events:slug:{}", slug);
        self.cache
            .query(&key, || async move {
                let event = self.events.get_by_slug(slug).await?;
                Ok(event.filter(|e| e.is_published))
            })
            .await
    }

    /// Photos of published events, filtered and paginated
    pub async fn gallery(&self, query: &GalleryQuery, params: &ListParams) -> QueryState<GalleryPage> {
        let state: QueryState<Vec<GalleryItem>> = self
            .cache
            .query("events:gallery", || self.events.list_gallery())
            .await;
        state.map(|items| GalleryPage {
            years: gallery_years(&items),
            photos: list_gallery(items, query, params),
        })
    }
}
