//! "About" page content: team, testimonials, history timeline and objectives

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub sort_order: i64,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Testimonial {
    pub id: i64,
    pub author_name: String,
    pub author_role: Option<String>,
    pub content: String,
    pub photo_url: Option<String>,
    /// Star rating from 1 to 5
    pub rating: Option<i64>,
    pub sort_order: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Milestone in the association's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TimelineEntry {
    pub id: i64,
    /// Free-form label such as "2019" or "Printemps 2021"
    pub year: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i64,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Objective {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Icon name understood by the front end
    pub icon: Option<String>,
    pub sort_order: i64,
    pub is_published: bool,
}

/// Everything the about page shows, fetched in one call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AboutOverview {
    pub team: Vec<TeamMember>,
    pub testimonials: Vec<Testimonial>,
    pub timeline: Vec<TimelineEntry>,
    pub objectives: Vec<Objective>,
}
