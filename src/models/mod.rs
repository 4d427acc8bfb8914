//! Data models
//!
//! Records mirrored from the content database (Event, BlogPost, TeamMember,
//! Testimonial, TimelineEntry, Objective, Category, Rubrique, Tag, Comment,
//! Registration, Contact), the input types of the visitor mutations, and the
//! pagination containers used by every listing.

mod about;
mod blog_post;
mod comment;
mod event;
mod pagination;
mod registration;
mod taxonomy;

pub use about::{AboutOverview, Objective, TeamMember, Testimonial, TimelineEntry};
pub use blog_post::{BlogPost, PostStatus};
pub use comment::{Comment, CommentStatus, CommentThread, CreateCommentInput, LikeStatus};
pub use event::{Event, GalleryImage, GalleryItem, Speaker};
pub use pagination::{ListParams, PagedResult, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use registration::{Contact, ContactInput, CreateRegistrationInput, Registration};
pub use taxonomy::{Category, CategoryKind, PostTag, Rubrique, Tag, TagWithCount};
