//! Event repository
//!
//! Events are read with their category, speakers and gallery. The
//! registration counter on the event row is the source for remaining
//! capacity; registrations book seats against it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;

use super::taxonomy::categories_by_id;
use crate::db::{placeholders, DynDatabasePool};
use crate::models::{Event, GalleryImage, GalleryItem, Speaker};
use crate::with_pool;

/// Event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// List published events with relations, most recent start first
    async fn list_published(&self) -> Result<Vec<Event>>;

    /// Get an event by slug, published or not
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    /// Get an event by ID, published or not
    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// Photos of every published event, newest event first
    async fn list_gallery(&self) -> Result<Vec<GalleryItem>>;
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    slug: String,
    title: String,
    summary: Option<String>,
    description: String,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    cover_image_url: Option<String>,
    category_id: Option<i64>,
    capacity: Option<i64>,
    registration_count: i64,
    registration_open: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            summary: row.summary,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            cover_image_url: row.cover_image_url,
            category_id: row.category_id,
            category: None,
            capacity: row.capacity,
            registration_count: row.registration_count,
            registration_open: row.registration_open,
            is_published: row.is_published,
            speakers: Vec::new(),
            gallery: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct GalleryRow {
    #[sqlx(flatten)]
    image: GalleryImage,
    event_slug: String,
    event_title: String,
    event_starts_at: DateTime<Utc>,
    event_category_id: Option<i64>,
}

/// SQLx-based event repository
pub struct SqlxEventRepository {
    pool: DynDatabasePool,
}

impl SqlxEventRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }

    async fn hydrate(&self, rows: Vec<EventRow>) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = rows.into_iter().map(Event::from).collect();
        if events.is_empty() {
            return Ok(events);
        }

        let mut category_ids: Vec<i64> = events.iter().filter_map(|e| e.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let event_ids: Vec<i64> = events.iter().map(|e| e.id).collect();

        let categories = categories_by_id(&self.pool, &category_ids).await?;
        let mut speakers = self.speakers_by_event(&event_ids).await?;
        let mut gallery = self.gallery_by_event(&event_ids).await?;

        for event in &mut events {
            event.category = event.category_id.and_then(|id| categories.get(&id).cloned());
            event.speakers = speakers.remove(&event.id).unwrap_or_default();
            event.gallery = gallery.remove(&event.id).unwrap_or_default();
        }

        Ok(events)
    }

    async fn speakers_by_event(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Speaker>>> {
        let sql = format!(
            "SELECT * FROM event_speakers WHERE event_id IN ({}) ORDER BY sort_order, id",
            placeholders(ids.len())
        );
        let rows = with_pool!(self.pool, |p| {
            let mut query = sqlx::query_as::<_, Speaker>(&sql);
            for id in ids {
                query = query.bind(*id);
            }
            query.fetch_all(p).await.context("Failed to load speakers")?
        });

        let mut grouped: HashMap<i64, Vec<Speaker>> = HashMap::new();
        for speaker in rows {
            grouped.entry(speaker.event_id).or_default().push(speaker);
        }
        Ok(grouped)
    }

    async fn gallery_by_event(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<GalleryImage>>> {
        let sql = format!(
            "SELECT * FROM event_gallery_images WHERE event_id IN ({}) ORDER BY sort_order, id",
            placeholders(ids.len())
        );
        let rows = with_pool!(self.pool, |p| {
            let mut query = sqlx::query_as::<_, GalleryImage>(&sql);
            for id in ids {
                query = query.bind(*id);
            }
            query.fetch_all(p).await.context("Failed to load gallery images")?
        });

        let mut grouped: HashMap<i64, Vec<GalleryImage>> = HashMap::new();
        for image in rows {
            grouped.entry(image.event_id).or_default().push(image);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn list_published(&self) -> Result<Vec<Event>> {
        let rows = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, EventRow>(
                "SELECT * FROM events WHERE is_published = ? ORDER BY starts_at DESC, id DESC",
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list published events")?
        });
        self.hydrate(rows).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let row = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE slug = ?")
                .bind(slug)
                .fetch_optional(p)
                .await
                .context("Failed to get event by slug")?
        });
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let row = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = ?")
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get event by id")?
        });
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_gallery(&self) -> Result<Vec<GalleryItem>> {
        let rows = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, GalleryRow>(
                r#"SELECT g.id, g.event_id, g.image_url, g.caption, g.sort_order, g.created_at,
                          e.slug AS event_slug, e.title AS event_title,
                          e.starts_at AS event_starts_at, e.category_id AS event_category_id
                   FROM event_gallery_images g
                   INNER JOIN events e ON e.id = g.event_id
                   WHERE e.is_published = ?
                   ORDER BY e.starts_at DESC, g.sort_order, g.id"#,
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list gallery")?
        });

        let mut category_ids: Vec<i64> = rows.iter().filter_map(|r| r.event_category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let categories = categories_by_id(&self.pool, &category_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| GalleryItem {
                category: row.event_category_id.and_then(|id| categories.get(&id).cloned()),
                image: row.image,
                event_slug: row.event_slug,
                event_title: row.event_title,
                event_starts_at: row.event_starts_at,
            })
            .collect())
    }
}
