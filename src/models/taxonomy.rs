//! Taxonomy models
//!
//! Categories classify both blog posts and events (`kind` tells which),
//! rubriques are the editorial sections of the blog, and tags are free-form
//! labels attached to posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a category classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    #[default]
    Blog,
    Event,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Blog => "blog",
            CategoryKind::Event => "event",
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blog" => Ok(Self::Blog),
            "event" | "events" => Ok(Self::Event),
            _ => Err(format!("Invalid category kind: {}", s)),
        }
    }
}

impl TryFrom<String> for CategoryKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Category {
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub kind: CategoryKind,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// Editorial section of the blog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Rubrique {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    /// Accent colour used by the site for badges
    pub color: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Tag with the number of published posts carrying it, for the tag cloud
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TagWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tag: Tag,
    pub post_count: i64,
}

/// A tag as attached to a post, carrying the post it was joined from
#[derive(Debug, Clone, FromRow)]
pub struct PostTag {
    pub blog_post_id: i64,
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostTag> for Tag {
    fn from(row: PostTag) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_kind_parse() {
        assert_eq!("blog".parse::<CategoryKind>().unwrap(), CategoryKind::Blog);
        assert_eq!("Events".parse::<CategoryKind>().unwrap(), CategoryKind::Event);
        assert!("gallery".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn test_category_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&CategoryKind::Event).unwrap(), "\"event\"");
    }
}
