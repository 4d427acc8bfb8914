//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository reads one slice of the content schema and hides the
//! SQLite/MySQL split behind `with_pool!`.

pub mod about;
pub mod blog_post;
pub mod comment;
pub mod event;
pub mod registration;
pub mod taxonomy;

pub use about::{AboutRepository, SqlxAboutRepository};
pub use blog_post::{BlogPostRepository, SqlxBlogPostRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use registration::{
    Booking, ContactRepository, RegistrationRepository, SqlxContactRepository,
    SqlxRegistrationRepository,
};
pub use taxonomy::{SqlxTaxonomyRepository, TaxonomyRepository};
