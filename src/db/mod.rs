//! Database layer
//!
//! Database abstraction for the La Trouvaille content service. It supports:
//! - SQLite (default, single-binary deployment)
//! - MySQL (hosted database)
//!
//! # Usage
//!
//! ```ignore
//! use latrouvaille::config::DatabaseConfig;
//! use latrouvaille::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, InsertedId, MysqlDatabase,
    SqliteDatabase,
};

/// Build a `?, ?, ?` placeholder list for an `IN (...)` clause
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Whether a statement failed on a unique constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}
