//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - reads go through the query cache and fold failures into [`QueryState`]
//! - mutations validate their input, write, then invalidate related cache keys
//!
//! [`QueryState`]: crate::cache::QueryState

pub mod about;
pub mod blog;
pub mod comment;
pub mod contact;
pub mod event;
pub mod mail;
pub mod markdown;
pub mod registration;
pub mod taxonomy;

pub use about::AboutService;
pub use blog::{BlogPostDetail, BlogService};
pub use comment::{generate_fingerprint, CommentService};
pub use contact::ContactService;
pub use event::{EventService, GalleryPage};
pub use mail::{Mailer, SmtpMailer};
pub use markdown::MarkdownRenderer;
pub use registration::RegistrationService;
pub use taxonomy::TaxonomyService;

use once_cell::sync::Lazy;
use regex::Regex;

/// Error types shared by the service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Requested content does not exist or is not published
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The write would duplicate an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The target no longer accepts this action (registrations closed, event full)
    #[error("Closed: {0}")]
    Closed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Basic email shape check: something@domain.tld, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Trimmed value whose length in characters lies within `min..=max`
pub(crate) fn require_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(ServiceError::ValidationError(if min <= 1 {
            format!("{} is required", field)
        } else {
            format!("{} must be at least {} characters", field, min)
        }));
    }
    if len > max {
        return Err(ServiceError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed email, lowercased, rejected unless well-formed
pub(crate) fn require_email(value: &str) -> Result<String, ServiceError> {
    let email = value.trim().to_lowercase();
    if email.is_empty() {
        return Err(ServiceError::ValidationError("Email is required".to_string()));
    }
    if email.chars().count() > 255 || !is_valid_email(&email) {
        return Err(ServiceError::ValidationError("Invalid email format".to_string()));
    }
    Ok(email)
}

/// `None` for missing or blank optional text, trimmed otherwise
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
