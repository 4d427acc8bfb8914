//! About page service

use std::sync::Arc;

use crate::cache::{QueryCache, QueryState};
use crate::db::repositories::AboutRepository;
use crate::models::{AboutOverview, Objective, TeamMember, Testimonial, TimelineEntry};

pub struct AboutService {
    repo: Arc<dyn AboutRepository>,
    cache: QueryCache,
}

impl AboutService {
    pub fn new(repo: Arc<dyn AboutRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    pub async fn team(&self) -> QueryState<Vec<TeamMember>> {
        self.cache.query("about:team", || self.repo.list_team()).await
    }

    pub async fn testimonials(&self) -> QueryState<Vec<Testimonial>> {
        self.cache
            .query("about:testimonials", || self.repo.list_testimonials())
            .await
    }

    pub async fn timeline(&self) -> QueryState<Vec<TimelineEntry>> {
        self.cache
            .query("about:timeline", || self.repo.list_timeline())
            .await
    }

    pub async fn objectives(&self) -> QueryState<Vec<Objective>> {
        self.cache
            .query("about:objectives", || self.repo.list_objectives())
            .await
    }

    /// The four sections in one call
    ///
    /// Sections load concurrently; any failure fails the whole overview.
    pub async fn overview(&self) -> QueryState<AboutOverview> {
        self.cache
            .query("about:overview", || async move {
                let (team, testimonials, timeline, objectives) = tokio::try_join!(
                    self.repo.list_team(),
                    self.repo.list_testimonials(),
                    self.repo.list_timeline(),
                    self.repo.list_objectives(),
                )?;
                Ok(AboutOverview {
                    team,
                    testimonials,
                    timeline,
                    objectives,
                })
            })
            .await
    }
}
