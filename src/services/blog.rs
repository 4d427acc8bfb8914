//! Blog service
//!
//! Listing and reading published posts, view counting and likes. Published
//! posts are cached as one list under `blog:list`; a single post under
//! `blog:slug:<slug>`. Likes invalidate `blog:*` since they change counters
//! shown on both.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{MarkdownRenderer, ServiceError};
use crate::cache::{QueryCache, QueryState};
use crate::db::repositories::{BlogPostRepository, CommentRepository};
use crate::listing::blog::{list_posts, related_posts};
use crate::listing::BlogQuery;
use crate::models::{BlogPost, LikeStatus, ListParams, PagedResult};

/// Number of related posts shown under a post
pub const RELATED_LIMIT: usize = 3;

/// Length of excerpts generated for posts without one
const EXCERPT_CHARS: usize = 180;

/// A post as shown on its own page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub related: Vec<BlogPost>,
}

pub struct BlogService {
    posts: Arc<dyn BlogPostRepository>,
    likes: Arc<dyn CommentRepository>,
    cache: QueryCache,
    renderer: MarkdownRenderer,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn BlogPostRepository>,
        likes: Arc<dyn CommentRepository>,
        cache: QueryCache,
    ) -> Self {
        Self {
            posts,
            likes,
            cache,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Fill the derived fields; HTML only for the detail page
    fn prepare(&self, mut post: BlogPost, with_html: bool) -> BlogPost {
        post.reading_minutes = self.renderer.reading_minutes(&post.content);
        if post.excerpt.as_deref().map_or(true, |e| e.trim().is_empty()) {
            post.excerpt = Some(self.renderer.excerpt(&post.content, EXCERPT_CHARS));
        }
        if with_html {
            post.content_html = self.renderer.render(&post.content);
        }
        post
    }

    async fn load_list(&self) -> anyhow::Result<Vec<BlogPost>> {
        let posts = self.posts.list_published().await?;
        Ok(posts.into_iter().map(|p| self.prepare(p, false)).collect())
    }

    async fn published_posts(&self) -> anyhow::Result<Vec<BlogPost>> {
        self.cache.get_or_load("blog:list", || self.load_list()).await
    }

    /// Published posts matching the query, one page of them
    pub async fn list(&self, query: &BlogQuery, params: &ListParams) -> QueryState<PagedResult<BlogPost>> {
        let state: QueryState<Vec<BlogPost>> =
            self.cache.query("blog:list", || self.load_list()).await;
        state.map(|posts| list_posts(posts, query, params))
    }

    /// A published post with rendered content and related posts
    ///
    /// Drafts and archived posts read as absent.
    pub async fn get(&self, slug: &str) -> QueryState<Option<BlogPostDetail>> {
        let key = format!("blog:slug:{}", slug);
        self.cache
            .query(&key, || async move {
                let Some(post) = self.posts.get_by_slug(slug).await? else {
                    return Ok(None);
                };
                if !post.is_published() {
                    return Ok(None);
                }
                let all = self.published_posts().await?;
                let related = related_posts(&all, &post, RELATED_LIMIT);
                Ok(Some(BlogPostDetail {
                    post: self.prepare(post, true),
                    related,
                }))
            })
            .await
    }

    /// Count one view of a published post
    pub async fn record_view(&self, id: i64) -> Result<(), ServiceError> {
        if self.posts.increment_view(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Blog post {}", id)))
        }
    }

    async fn require_published(&self, id: i64) -> Result<BlogPost, ServiceError> {
        match self.posts.get_by_id(id).await? {
            Some(post) if post.is_published() => Ok(post),
            _ => Err(ServiceError::NotFound(format!("Blog post {}", id))),
        }
    }

    /// Whether this visitor likes the post, and the current like count
    pub async fn like_status(&self, id: i64, fingerprint: &str) -> Result<LikeStatus, ServiceError> {
        let post = self.require_published(id).await?;
        let liked = self.likes.has_liked(id, fingerprint).await?;
        Ok(LikeStatus {
            liked,
            like_count: post.like_count,
        })
    }

    /// Like the post, or take the like back if the visitor already liked it
    pub async fn toggle_like(&self, id: i64, fingerprint: &str) -> Result<LikeStatus, ServiceError> {
        self.require_published(id).await?;

        let status = if self.likes.has_liked(id, fingerprint).await? {
            let removed = self.likes.remove_like(id, fingerprint).await?;
            let delta = if removed { -1 } else { 0 };
            LikeStatus {
                liked: false,
                like_count: self.posts.adjust_like_count(id, delta).await?,
            }
        } else {
            let added = self.likes.add_like(id, fingerprint).await?;
            let delta = if added { 1 } else { 0 };
            LikeStatus {
                liked: true,
                like_count: self.posts.adjust_like_count(id, delta).await?,
            }
        };

        tracing::debug!(post_id = id, liked = status.liked, "Like toggled");
        self.cache.invalidate("blog:*").await;
        Ok(status)
    }
}
