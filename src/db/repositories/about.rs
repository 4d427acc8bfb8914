//! About page repository: team, testimonials, timeline and objectives

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::models::{Objective, TeamMember, Testimonial, TimelineEntry};
use crate::with_pool;

/// About content repository trait
///
/// Every listing returns published rows only, in editorial order.
#[async_trait]
pub trait AboutRepository: Send + Sync {
    async fn list_team(&self) -> Result<Vec<TeamMember>>;

    async fn list_testimonials(&self) -> Result<Vec<Testimonial>>;

    async fn list_timeline(&self) -> Result<Vec<TimelineEntry>>;

    async fn list_objectives(&self) -> Result<Vec<Objective>>;
}

/// SQLx-based about repository
pub struct SqlxAboutRepository {
    pool: DynDatabasePool,
}

impl SqlxAboutRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AboutRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AboutRepository for SqlxAboutRepository {
    async fn list_team(&self) -> Result<Vec<TeamMember>> {
        let team = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, TeamMember>(
                "SELECT * FROM team_members WHERE is_published = ? ORDER BY sort_order, id",
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list team members")?
        });
        Ok(team)
    }

    async fn list_testimonials(&self) -> Result<Vec<Testimonial>> {
        let testimonials = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Testimonial>(
                "SELECT * FROM testimonials WHERE is_published = ? ORDER BY sort_order, created_at DESC",
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list testimonials")?
        });
        Ok(testimonials)
    }

    async fn list_timeline(&self) -> Result<Vec<TimelineEntry>> {
        let entries = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, TimelineEntry>(
                "SELECT * FROM timeline_entries WHERE is_published = ? ORDER BY sort_order, id",
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list timeline entries")?
        });
        Ok(entries)
    }

    async fn list_objectives(&self) -> Result<Vec<Objective>> {
        let objectives = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Objective>(
                "SELECT * FROM objectives WHERE is_published = ? ORDER BY sort_order, id",
            )
            .bind(true)
            .fetch_all(p)
            .await
            .context("Failed to list objectives")?
        });
        Ok(objectives)
    }
}
