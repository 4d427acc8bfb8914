//! Blog post repository
//!
//! Reads `blog_posts` with their category, rubrique and tags joined in, and
//! maintains the denormalised view/like/comment counters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;

use super::taxonomy::{categories_by_id, rubriques_by_id, tags_by_post};
use crate::db::DynDatabasePool;
use crate::models::{BlogPost, PostStatus};
use crate::with_pool;

/// Blog post repository trait
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// List published posts, newest first, with relations
    async fn list_published(&self) -> Result<Vec<BlogPost>>;

    /// Get a post by slug, whatever its status
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// Get a post by ID, whatever its status
    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    /// Increment the view counter, returning whether the post is published
    async fn increment_view(&self, id: i64) -> Result<bool>;

    /// Add `delta` to the like counter (never below zero) and return the new value
    async fn adjust_like_count(&self, id: i64, delta: i64) -> Result<i64>;
}

#[derive(Debug, FromRow)]
struct BlogPostRow {
    id: i64,
    slug: String,
    title: String,
    excerpt: Option<String>,
    content: String,
    cover_image_url: Option<String>,
    author_name: Option<String>,
    category_id: Option<i64>,
    rubrique_id: Option<i64>,
    #[sqlx(try_from = "String")]
    status: PostStatus,
    published_at: Option<DateTime<Utc>>,
    view_count: i64,
    like_count: i64,
    comment_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            content: row.content,
            content_html: String::new(),
            cover_image_url: row.cover_image_url,
            author_name: row.author_name,
            category_id: row.category_id,
            rubrique_id: row.rubrique_id,
            category: None,
            rubrique: None,
            tags: Vec::new(),
            status: row.status,
            published_at: row.published_at,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            reading_minutes: 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, cover_image_url, author_name, \
    category_id, rubrique_id, status, published_at, view_count, like_count, comment_count, \
    created_at, updated_at";

/// SQLx-based blog post repository
pub struct SqlxBlogPostRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogPostRepository> {
        Arc::new(Self::new(pool))
    }

    /// Attach category, rubrique and tags to the given rows
    async fn hydrate(&self, rows: Vec<BlogPostRow>) -> Result<Vec<BlogPost>> {
        let mut posts: Vec<BlogPost> = rows.into_iter().map(BlogPost::from).collect();
        if posts.is_empty() {
            return Ok(posts);
        }

        let mut category_ids: Vec<i64> = posts.iter().filter_map(|p| p.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let mut rubrique_ids: Vec<i64> = posts.iter().filter_map(|p| p.rubrique_id).collect();
        rubrique_ids.sort_unstable();
        rubrique_ids.dedup();
        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

        let categories = categories_by_id(&self.pool, &category_ids).await?;
        let rubriques = rubriques_by_id(&self.pool, &rubrique_ids).await?;
        let mut tags = tags_by_post(&self.pool, &post_ids).await?;

        for post in &mut posts {
            post.category = post.category_id.and_then(|id| categories.get(&id).cloned());
            post.rubrique = post.rubrique_id.and_then(|id| rubriques.get(&id).cloned());
            post.tags = tags.remove(&post.id).unwrap_or_default();
        }

        Ok(posts)
    }

    async fn get_one(&self, column: &str, value: QueryValue<'_>) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE {} = ?", POST_COLUMNS, column);
        let row = with_pool!(self.pool, |p| {
            let query = sqlx::query_as::<_, BlogPostRow>(&sql);
            let query = match value {
                QueryValue::Id(id) => query.bind(id),
                QueryValue::Slug(slug) => query.bind(slug),
            };
            query
                .fetch_optional(p)
                .await
                .with_context(|| format!("Failed to get blog post by {}", column))?
        });

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

enum QueryValue<'a> {
    Id(i64),
    Slug(&'a str),
}

#[async_trait]
impl BlogPostRepository for SqlxBlogPostRepository {
    async fn list_published(&self) -> Result<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts WHERE status = 'published' \
             ORDER BY COALESCE(published_at, created_at) DESC, id DESC",
            POST_COLUMNS
        );
        let rows = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, BlogPostRow>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list published blog posts")?
        });
        self.hydrate(rows).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.get_one("slug", QueryValue::Slug(slug)).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        self.get_one("id", QueryValue::Id(id)).await
    }

    async fn increment_view(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(
                "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = ? AND status = 'published'",
            )
            .bind(id)
            .execute(p)
            .await
            .context("Failed to increment view count")?
            .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn adjust_like_count(&self, id: i64, delta: i64) -> Result<i64> {
        let count = with_pool!(self.pool, |p| {
            sqlx::query(
                "UPDATE blog_posts SET like_count = CASE WHEN like_count + ? < 0 THEN 0 ELSE like_count + ? END WHERE id = ?",
            )
            .bind(delta)
            .bind(delta)
            .bind(id)
            .execute(p)
            .await
            .context("Failed to update like count")?;

            sqlx::query_scalar::<_, i64>("SELECT like_count FROM blog_posts WHERE id = ?")
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to read like count")?
                .unwrap_or(0)
        });
        Ok(count)
    }
}
