//! Comment and like models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Comment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    #[default]
    Approved,
    Spam,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Spam => "spam",
        }
    }
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "spam" => Ok(Self::Spam),
            _ => Err(format!("Invalid comment status: {}", s)),
        }
    }
}

impl TryFrom<String> for CommentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub blog_post_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    #[serde(skip_serializing)]
    pub author_email: Option<String>,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub status: CommentStatus,
    #[serde(skip_serializing)]
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Comment as displayed under a post, with its replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub avatar_url: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Gravatar URL for an optional email, falling back to the mystery person
    pub fn gravatar_url(email: Option<&str>) -> String {
        match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) => {
                let hash = format!("{:x}", md5::compute(e.to_lowercase()));
                format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
            }
            None => "https://www.gravatar.com/avatar/?d=mp&s=80".to_string(),
        }
    }

    /// Number of comments in this thread, the root included
    pub fn len(&self) -> usize {
        1 + self.replies.iter().map(CommentThread::len).sum::<usize>()
    }
}

impl From<Comment> for CommentThread {
    fn from(comment: Comment) -> Self {
        Self {
            avatar_url: Self::gravatar_url(comment.author_email.as_deref()),
            id: comment.id,
            parent_id: comment.parent_id,
            author_name: comment.author_name,
            content: comment.content,
            created_at: comment.created_at,
            replies: Vec::new(),
        }
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub content: String,
}

/// Like state of a post for one visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_url_normalizes_email() {
        let a = CommentThread::gravatar_url(Some("  Ana@Example.com "));
        let b = CommentThread::gravatar_url(Some("ana@example.com"));
        assert_eq!(a, b);
        assert!(a.contains("d=mp"));
    }

    #[test]
    fn test_gravatar_url_without_email() {
        assert_eq!(
            CommentThread::gravatar_url(None),
            "https://www.gravatar.com/avatar/?d=mp&s=80"
        );
        assert_eq!(CommentThread::gravatar_url(Some("  ")), CommentThread::gravatar_url(None));
    }

    #[test]
    fn test_email_is_not_serialized() {
        let comment = Comment {
            id: 1,
            blog_post_id: 1,
            parent_id: None,
            author_name: "Ana".to_string(),
            author_email: Some("ana@example.com".to_string()),
            content: "Bravo".to_string(),
            status: CommentStatus::Approved,
            fingerprint: Some("fp".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&comment).unwrap();
        assert!(!json.contains("ana@example.com"));
        assert!(!json.contains("fingerprint"));
    }
}
