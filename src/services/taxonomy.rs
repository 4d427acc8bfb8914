//! Taxonomy service: categories, rubriques and the tag cloud

use std::sync::Arc;

use crate::cache::{QueryCache, QueryState};
use crate::db::repositories::TaxonomyRepository;
use crate::models::{Category, CategoryKind, Rubrique, TagWithCount};

pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepository>,
    cache: QueryCache,
}

impl TaxonomyService {
    pub fn new(repo: Arc<dyn TaxonomyRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    /// Categories of one kind, or all of them
    pub async fn categories(&self, kind: Option<CategoryKind>) -> QueryState<Vec<Category>> {
        let key = format!(
            "taxonomy:categories:{}",
            kind.map_or("all", |k| k.as_str())
        );
        self.cache
            .query(&key, || self.repo.list_categories(kind))
            .await
    }

    pub async fn rubriques(&self) -> QueryState<Vec<Rubrique>> {
        self.cache
            .query("taxonomy:rubriques", || self.repo.list_rubriques())
            .await
    }

    pub async fn tags(&self) -> QueryState<Vec<TagWithCount>> {
        self.cache
            .query("taxonomy:tags", || self.repo.list_tags())
            .await
    }
}
