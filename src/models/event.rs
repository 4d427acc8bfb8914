//! Event model
//!
//! Events carry their speakers and photo gallery, both joined on read.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Category;

/// Event with its joined relations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Maximum number of seats, `None` for unlimited
    pub capacity: Option<i64>,
    pub registration_count: i64,
    pub registration_open: bool,
    pub is_published: bool,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// An event is upcoming until it ends (or starts, when it has no end)
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }

    /// Remaining seats, `None` when capacity is unlimited
    pub fn spots_left(&self) -> Option<i64> {
        self.capacity
            .map(|capacity| (capacity - self.registration_count).max(0))
    }

    /// Whether visitors can still register
    pub fn accepts_registrations(&self, now: DateTime<Utc>) -> bool {
        self.is_published
            && self.registration_open
            && self.starts_at >= now
            && self.spots_left() != Some(0)
    }

    pub fn year(&self) -> i32 {
        self.starts_at.year()
    }
}

/// Speaker of an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Speaker {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub sort_order: i64,
}

/// Photo from an event gallery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct GalleryImage {
    pub id: i64,
    pub event_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// Gallery photo flattened with the event it belongs to, as listed on the
/// gallery page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryItem {
    #[serde(flatten)]
    pub image: GalleryImage,
    pub event_slug: String,
    pub event_title: String,
    pub event_starts_at: DateTime<Utc>,
    pub category: Option<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(starts_at: DateTime<Utc>, capacity: Option<i64>, registered: i64) -> Event {
        Event {
            id: 1,
            slug: "atelier".to_string(),
            title: "Atelier".to_string(),
            summary: None,
            description: String::new(),
            location: None,
            starts_at,
            ends_at: None,
            cover_image_url: None,
            category_id: None,
            category: None,
            capacity,
            registration_count: registered,
            registration_open: true,
            is_published: true,
            speakers: Vec::new(),
            gallery: Vec::new(),
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[test]
    fn test_spots_left() {
        let now = Utc::now();
        assert_eq!(event(now, None, 10).spots_left(), None);
        assert_eq!(event(now, Some(20), 5).spots_left(), Some(15));
        assert_eq!(event(now, Some(20), 25).spots_left(), Some(0));
    }

    #[test]
    fn test_is_upcoming_uses_end_date() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let mut running = event(now - Duration::hours(2), None, 0);
        assert!(!running.is_upcoming(now));

        running.ends_at = Some(now + Duration::hours(1));
        assert!(running.is_upcoming(now));
    }

    #[test]
    fn test_accepts_registrations() {
        let now = Utc::now();
        assert!(event(now + Duration::days(3), Some(10), 2).accepts_registrations(now));
        assert!(!event(now + Duration::days(3), Some(10), 10).accepts_registrations(now));
        assert!(!event(now - Duration::days(3), None, 0).accepts_registrations(now));

        let mut closed = event(now + Duration::days(3), None, 0);
        closed.registration_open = false;
        assert!(!closed.accepts_registrations(now));
    }
}
