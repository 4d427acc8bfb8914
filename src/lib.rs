//! La Trouvaille - content service for the association website
//!
//! Serves the public site's blog, events calendar, photo gallery and about
//! page from a relational database, and records visitor interactions: likes,
//! views, comments, event registrations and contact messages.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod listing;
pub mod models;
pub mod services;
