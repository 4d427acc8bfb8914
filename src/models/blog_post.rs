//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Rubrique, Tag};

/// Publication status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid post status: {}", s)),
        }
    }
}

impl TryFrom<String> for PostStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Blog post with its joined relations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    /// Markdown source
    pub content: String,
    /// Rendered HTML, filled in by the blog service
    #[serde(default)]
    pub content_html: String,
    pub cover_image_url: Option<String>,
    pub author_name: Option<String>,
    pub category_id: Option<i64>,
    pub rubrique_id: Option<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub rubrique: Option<Rubrique>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    /// Estimated reading time, filled in by the blog service
    #[serde(default)]
    pub reading_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Date shown on the post card: publication date, or creation date for
    /// posts published without one
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|t| t.slug.eq_ignore_ascii_case(slug))
    }
}
