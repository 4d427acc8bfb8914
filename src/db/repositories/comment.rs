//! Comment and like repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::{is_unique_violation, DynDatabasePool, InsertedId};
use crate::models::{Comment, CommentStatus, CreateCommentInput};
use crate::with_pool;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment on a post with the given moderation status
    ///
    /// An approved comment bumps the post's `comment_count` in the same
    /// transaction.
    async fn create(
        &self,
        blog_post_id: i64,
        input: &CreateCommentInput,
        status: CommentStatus,
        fingerprint: Option<&str>,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Approved comments of a post, oldest first
    async fn list_approved_for_post(&self, blog_post_id: i64) -> Result<Vec<Comment>>;

    /// Check whether a visitor already liked a post
    async fn has_liked(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool>;

    /// Record a like, returning `false` if the visitor had already liked the post
    async fn add_like(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool>;

    /// Remove a like, returning `false` if there was none
    async fn remove_like(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool>;
}

/// SQLx-based comment repository
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        blog_post_id: i64,
        input: &CreateCommentInput,
        status: CommentStatus,
        fingerprint: Option<&str>,
    ) -> Result<Comment> {
        let comment = with_pool!(self.pool, |p| {
            let mut tx = p.begin().await.context("Failed to begin transaction")?;

            let id = sqlx::query(
                r#"INSERT INTO comments (blog_post_id, parent_id, author_name, author_email, content, status, fingerprint)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(blog_post_id)
            .bind(input.parent_id)
            .bind(&input.author_name)
            .bind(&input.author_email)
            .bind(&input.content)
            .bind(status.as_str())
            .bind(fingerprint)
            .execute(&mut *tx)
            .await
            .context("Failed to create comment")?
            .inserted_id();

            if status == CommentStatus::Approved {
                sqlx::query("UPDATE blog_posts SET comment_count = comment_count + 1 WHERE id = ?")
                    .bind(blog_post_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update comment count")?;
            }

            let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to read comment back")?;

            tx.commit().await.context("Failed to commit comment")?;
            comment
        });
        Ok(comment)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let comment = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get comment")?
        });
        Ok(comment)
    }

    async fn list_approved_for_post(&self, blog_post_id: i64) -> Result<Vec<Comment>> {
        let comments = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Comment>(
                "SELECT * FROM comments WHERE blog_post_id = ? AND status = ? ORDER BY created_at ASC, id ASC",
            )
            .bind(blog_post_id)
            .bind(CommentStatus::Approved.as_str())
            .fetch_all(p)
            .await
            .context("Failed to list comments")?
        });
        Ok(comments)
    }

    async fn has_liked(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool> {
        let count = with_pool!(self.pool, |p| {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM likes WHERE blog_post_id = ? AND fingerprint = ?",
            )
            .bind(blog_post_id)
            .bind(fingerprint)
            .fetch_one(p)
            .await
            .context("Failed to check like")?
        });
        Ok(count > 0)
    }

    async fn add_like(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool> {
        let result = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO likes (blog_post_id, fingerprint) VALUES (?, ?)")
                .bind(blog_post_id)
                .bind(fingerprint)
                .execute(p)
                .await
                .map(|r| r.rows_affected())
        });
        match result {
            Ok(affected) => Ok(affected > 0),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e).context("Failed to add like"),
        }
    }

    async fn remove_like(&self, blog_post_id: i64, fingerprint: &str) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM likes WHERE blog_post_id = ? AND fingerprint = ?")
                .bind(blog_post_id)
                .bind(fingerprint)
                .execute(p)
                .await
                .context("Failed to remove like")?
                .rows_affected()
        });
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{insert_post, migrated_pool};

    fn input(parent_id: Option<i64>, content: &str) -> CreateCommentInput {
        CreateCommentInput {
            parent_id,
            author_name: "Ana".to_string(),
            author_email: Some("ana@example.com".to_string()),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_approved() {
        let pool = migrated_pool().await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, None).await;
        let repo = SqlxCommentRepository::new(pool.clone());

        let root = repo
            .create(post, &input(None, "Premier"), CommentStatus::Approved, Some("fp"))
            .await
            .unwrap();
        assert_eq!(root.blog_post_id, post);
        assert_eq!(root.fingerprint.as_deref(), Some("fp"));

        repo.create(post, &input(Some(root.id), "Réponse"), CommentStatus::Approved, None)
            .await
            .unwrap();
        repo.create(post, &input(None, "En attente"), CommentStatus::Pending, None)
            .await
            .unwrap();

        let listed = repo.list_approved_for_post(post).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].parent_id, Some(root.id));
        assert!(listed.iter().all(|c| c.status == CommentStatus::Approved));
    }

    async fn comment_count(pool: &DynDatabasePool, post: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT comment_count FROM blog_posts WHERE id = ?")
            .bind(post)
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_only_approved_comments_are_counted() {
        let pool = migrated_pool().await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, None).await;
        let repo = SqlxCommentRepository::new(pool.clone());

        repo.create(post, &input(None, "Publié"), CommentStatus::Approved, None)
            .await
            .unwrap();
        repo.create(post, &input(None, "En attente"), CommentStatus::Pending, None)
            .await
            .unwrap();

        assert_eq!(comment_count(&pool, post).await, 1);
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_count_update_fails() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        let post = insert_post(sqlite, "a", "published", None, None).await;
        sqlx::query(
            "CREATE TRIGGER reject_count BEFORE UPDATE OF comment_count ON blog_posts BEGIN SELECT RAISE(ABORT, 'counter locked'); END",
        )
        .execute(sqlite)
        .await
        .unwrap();
        let repo = SqlxCommentRepository::new(pool.clone());

        let result = repo
            .create(post, &input(None, "Perdu"), CommentStatus::Approved, None)
            .await;

        assert!(result.is_err());
        assert!(repo.list_approved_for_post(post).await.unwrap().is_empty());
        assert_eq!(comment_count(&pool, post).await, 0);
    }

    #[tokio::test]
    async fn test_likes_are_unique_per_fingerprint() {
        let pool = migrated_pool().await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, None).await;
        let repo = SqlxCommentRepository::new(pool.clone());

        assert!(!repo.has_liked(post, "fp").await.unwrap());
        assert!(repo.add_like(post, "fp").await.unwrap());
        assert!(!repo.add_like(post, "fp").await.unwrap());
        assert!(repo.has_liked(post, "fp").await.unwrap());
        assert!(!repo.has_liked(post, "other").await.unwrap());

        assert!(repo.remove_like(post, "fp").await.unwrap());
        assert!(!repo.remove_like(post, "fp").await.unwrap());
    }
}
