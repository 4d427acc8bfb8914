//! Comment service
//!
//! Threaded comments under blog posts. Reads are cached per post under
//! `comments:post:<id>`.

use std::collections::HashMap;
use std::sync::Arc;

use super::{optional_text, require_email, require_length, ServiceError};
use crate::cache::{QueryCache, QueryState};
use crate::db::repositories::{BlogPostRepository, CommentRepository};
use crate::models::{Comment, CommentStatus, CommentThread, CreateCommentInput};

pub const MAX_AUTHOR_NAME: usize = 80;
pub const MAX_CONTENT: usize = 2000;

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn BlogPostRepository>,
    cache: QueryCache,
    require_approval: bool,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn BlogPostRepository>,
        cache: QueryCache,
        require_approval: bool,
    ) -> Self {
        Self {
            comments,
            posts,
            cache,
            require_approval,
        }
    }

    /// Approved comments of a post as threads, oldest first
    pub async fn list(&self, post_id: i64) -> QueryState<Vec<CommentThread>> {
        let key = format!("comments:post:{}", post_id);
        self.cache
            .query(&key, || async move {
                let comments = self.comments.list_approved_for_post(post_id).await?;
                Ok(build_threads(comments))
            })
            .await
    }

    /// Post a comment
    ///
    /// The comment is published right away unless moderation is enabled, in
    /// which case it stays pending and is not counted on the post.
    pub async fn create(
        &self,
        post_id: i64,
        input: CreateCommentInput,
        fingerprint: Option<&str>,
    ) -> Result<Comment, ServiceError> {
        match self.posts.get_by_id(post_id).await? {
            Some(post) if post.is_published() => {}
            _ => return Err(ServiceError::NotFound(format!("Blog post {}", post_id))),
        }

        let input = CreateCommentInput {
            author_name: require_length("Name", &input.author_name, 1, MAX_AUTHOR_NAME)?,
            content: require_length("Comment", &input.content, 1, MAX_CONTENT)?,
            author_email: match optional_text(input.author_email.as_deref()) {
                Some(email) => Some(require_email(&email)?),
                None => None,
            },
            parent_id: input.parent_id,
        };

        if let Some(parent_id) = input.parent_id {
            let parent = self.comments.get_by_id(parent_id).await?;
            if parent.map_or(true, |p| p.blog_post_id != post_id) {
                return Err(ServiceError::ValidationError(
                    "Parent comment does not belong to this post".to_string(),
                ));
            }
        }

        let status = if self.require_approval {
            CommentStatus::Pending
        } else {
            CommentStatus::Approved
        };
        let comment = self.comments.create(post_id, &input, status, fingerprint).await?;

        tracing::info!(post_id, comment_id = comment.id, status = %status, "Comment created");
        self.cache.invalidate(&format!("comments:post:{}", post_id)).await;
        self.cache.invalidate("blog:*").await;
        Ok(comment)
    }
}

/// Arrange comments into reply trees
///
/// Roots and replies keep the input order. A reply whose parent is missing
/// from `comments` is dropped together with its own replies.
pub fn build_threads(comments: Vec<Comment>) -> Vec<CommentThread> {
    let mut children: HashMap<i64, Vec<CommentThread>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) => children.entry(parent).or_default().push(comment.into()),
            None => roots.push(CommentThread::from(comment)),
        }
    }

    fn attach(thread: &mut CommentThread, children: &mut HashMap<i64, Vec<CommentThread>>) {
        if let Some(mut replies) = children.remove(&thread.id) {
            for reply in &mut replies {
                attach(reply, children);
            }
            thread.replies = replies;
        }
    }

    for root in &mut roots {
        attach(root, &mut children);
    }
    roots
}

/// Anonymous visitor identity: MD5 of `ip:user-agent`
pub fn generate_fingerprint(ip: &str, user_agent: &str) -> String {
    let data = format!("{}:{}", ip, user_agent);
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::fixtures::{insert_post, migrated_pool};
    use crate::db::repositories::{SqlxBlogPostRepository, SqlxCommentRepository};
    use crate::db::DynDatabasePool;
    use chrono::Utc;

    async fn service(require_approval: bool) -> (CommentService, DynDatabasePool) {
        let pool = migrated_pool().await;
        let service = CommentService::new(
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxBlogPostRepository::boxed(pool.clone()),
            QueryCache::new(Arc::new(MemoryCache::new())),
            require_approval,
        );
        (service, pool)
    }

    fn input(content: &str) -> CreateCommentInput {
        CreateCommentInput {
            parent_id: None,
            author_name: "Ana".to_string(),
            author_email: None,
            content: content.to_string(),
        }
    }

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            blog_post_id: 1,
            parent_id,
            author_name: format!("c{}", id),
            author_email: None,
            content: String::new(),
            status: CommentStatus::Approved,
            fingerprint: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_threads_nests_replies() {
        let threads = build_threads(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(2)),
            comment(5, Some(1)),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].len(), 4);
        let replies: Vec<i64> = threads[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(replies, vec![2, 5]);
        assert_eq!(threads[0].replies[0].replies[0].id, 4);
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn test_build_threads_drops_orphans() {
        let threads = build_threads(vec![comment(1, None), comment(2, Some(99)), comment(3, Some(2))]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].len(), 1);
    }

    #[test]
    fn test_generate_fingerprint() {
        let a = generate_fingerprint("1.2.3.4", "Firefox");
        assert_eq!(a.len(), 32);
        assert_eq!(a, generate_fingerprint("1.2.3.4", "Firefox"));
        assert_ne!(a, generate_fingerprint("1.2.3.5", "Firefox"));
    }

    #[tokio::test]
    async fn test_create_and_list_threads() {
        let (service, pool) = service(false).await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, Some(Utc::now())).await;

        let root = service.create(post, input("Merci !"), Some("fp")).await.unwrap();
        assert_eq!(root.status, CommentStatus::Approved);

        let mut reply = input("Avec plaisir");
        reply.parent_id = Some(root.id);
        service.create(post, reply, None).await.unwrap();

        let state = service.list(post).await;
        assert!(state.error.is_none());
        assert_eq!(state.data.len(), 1);
        assert_eq!(state.data[0].replies.len(), 1);

        let posts = SqlxBlogPostRepository::new(pool.clone());
        assert_eq!(posts.get_by_id(post).await.unwrap().unwrap().comment_count, 2);
    }

    #[tokio::test]
    async fn test_moderated_comments_are_hidden_and_not_counted() {
        let (service, pool) = service(true).await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, Some(Utc::now())).await;

        let created = service.create(post, input("À modérer"), None).await.unwrap();
        assert_eq!(created.status, CommentStatus::Pending);
        assert!(service.list(post).await.data.is_empty());

        let posts = SqlxBlogPostRepository::new(pool.clone());
        assert_eq!(posts.get_by_id(post).await.unwrap().unwrap().comment_count, 0);
    }

    #[tokio::test]
    async fn test_new_comment_invalidates_cached_thread() {
        let (service, pool) = service(false).await;
        let post = insert_post(pool.as_sqlite().unwrap(), "a", "published", None, Some(Utc::now())).await;

        assert!(service.list(post).await.data.is_empty());
        service.create(post, input("Premier"), None).await.unwrap();
        assert_eq!(service.list(post).await.data.len(), 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let (service, pool) = service(false).await;
        let sqlite = pool.as_sqlite().unwrap();
        let post = insert_post(sqlite, "a", "published", None, Some(Utc::now())).await;
        let other = insert_post(sqlite, "b", "published", None, Some(Utc::now())).await;
        let draft = insert_post(sqlite, "c", "draft", None, None).await;

        let mut blank = input("ok");
        blank.author_name = "   ".to_string();
        assert!(matches!(
            service.create(post, blank, None).await,
            Err(ServiceError::ValidationError(_))
        ));

        assert!(matches!(
            service.create(post, input(&"x".repeat(MAX_CONTENT + 1)), None).await,
            Err(ServiceError::ValidationError(_))
        ));

        let mut bad_email = input("ok");
        bad_email.author_email = Some("pas-un-email".to_string());
        assert!(matches!(
            service.create(post, bad_email, None).await,
            Err(ServiceError::ValidationError(_))
        ));

        let foreign = service.create(other, input("ailleurs"), None).await.unwrap();
        let mut wrong_parent = input("réponse");
        wrong_parent.parent_id = Some(foreign.id);
        assert!(matches!(
            service.create(post, wrong_parent, None).await,
            Err(ServiceError::ValidationError(_))
        ));

        assert!(matches!(
            service.create(draft, input("ok"), None).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
