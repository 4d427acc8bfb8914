//! Taxonomy repository
//!
//! Read access to `categories`, `rubriques` and `tags`, plus the batched
//! lookups the post and event repositories use to join them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{placeholders, DynDatabasePool};
use crate::models::{Category, CategoryKind, PostTag, Rubrique, Tag, TagWithCount};
use crate::with_pool;

/// Taxonomy repository trait
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// List categories, optionally restricted to one kind
    async fn list_categories(&self, kind: Option<CategoryKind>) -> Result<Vec<Category>>;

    /// List all rubriques
    async fn list_rubriques(&self) -> Result<Vec<Rubrique>>;

    /// List tags with the number of published posts carrying them
    async fn list_tags(&self) -> Result<Vec<TagWithCount>>;
}

/// SQLx-based taxonomy repository
pub struct SqlxTaxonomyRepository {
    pool: DynDatabasePool,
}

impl SqlxTaxonomyRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TaxonomyRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TaxonomyRepository for SqlxTaxonomyRepository {
    async fn list_categories(&self, kind: Option<CategoryKind>) -> Result<Vec<Category>> {
        let categories = with_pool!(self.pool, |p| {
            let result = match kind {
                Some(kind) => {
                    sqlx::query_as::<_, Category>(
                        "SELECT * FROM categories WHERE kind = ? ORDER BY sort_order, name",
                    )
                    .bind(kind.as_str())
                    .fetch_all(p)
                    .await
                }
                None => {
                    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY sort_order, name")
                        .fetch_all(p)
                        .await
                }
            };
            result.context("Failed to list categories")?
        });
        Ok(categories)
    }

    async fn list_rubriques(&self) -> Result<Vec<Rubrique>> {
        let rubriques = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Rubrique>("SELECT * FROM rubriques ORDER BY sort_order, name")
                .fetch_all(p)
                .await
                .context("Failed to list rubriques")?
        });
        Ok(rubriques)
    }

    async fn list_tags(&self) -> Result<Vec<TagWithCount>> {
        let tags = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, TagWithCount>(
                r#"SELECT t.id, t.slug, t.name, t.created_at, COUNT(bp.id) AS post_count
                   FROM tags t
                   LEFT JOIN blog_post_tags bpt ON bpt.tag_id = t.id
                   LEFT JOIN blog_posts bp ON bp.id = bpt.blog_post_id AND bp.status = 'published'
                   GROUP BY t.id, t.slug, t.name, t.created_at
                   ORDER BY post_count DESC, t.name ASC"#,
            )
            .fetch_all(p)
            .await
            .context("Failed to list tags")?
        });
        Ok(tags)
    }
}

/// Load the categories with the given ids, keyed by id
pub(crate) async fn categories_by_id(
    pool: &DynDatabasePool,
    ids: &[i64],
) -> Result<HashMap<i64, Category>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let sql = format!("SELECT * FROM categories WHERE id IN ({})", placeholders(ids.len()));
    let categories = with_pool!(pool, |p| {
        let mut query = sqlx::query_as::<_, Category>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query.fetch_all(p).await.context("Failed to load categories")?
    });
    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

/// Load the rubriques with the given ids, keyed by id
pub(crate) async fn rubriques_by_id(
    pool: &DynDatabasePool,
    ids: &[i64],
) -> Result<HashMap<i64, Rubrique>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let sql = format!("SELECT * FROM rubriques WHERE id IN ({})", placeholders(ids.len()));
    let rubriques = with_pool!(pool, |p| {
        let mut query = sqlx::query_as::<_, Rubrique>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query.fetch_all(p).await.context("Failed to load rubriques")?
    });
    Ok(rubriques.into_iter().map(|r| (r.id, r)).collect())
}

/// Load the tags of the given posts, grouped by post id and sorted by name
pub(crate) async fn tags_by_post(
    pool: &DynDatabasePool,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let sql = format!(
        r#"SELECT bpt.blog_post_id, t.id, t.slug, t.name, t.created_at
           FROM blog_post_tags bpt
           INNER JOIN tags t ON t.id = bpt.tag_id
           WHERE bpt.blog_post_id IN ({})
           ORDER BY t.name"#,
        placeholders(post_ids.len())
    );
    let rows = with_pool!(pool, |p| {
        let mut query = sqlx::query_as::<_, PostTag>(&sql);
        for id in post_ids {
            query = query.bind(*id);
        }
        query.fetch_all(p).await.context("Failed to load post tags")?
    });

    let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped.entry(row.blog_post_id).or_default().push(row.into());
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{insert_category, insert_post, insert_rubrique, insert_tag, migrated_pool, tag_post};
    use chrono::Utc;

    #[tokio::test]
    async fn test_list_categories_by_kind() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        insert_category(sqlite, "ateliers", "event").await;
        insert_category(sqlite, "recettes", "blog").await;
        insert_category(sqlite, "voyages", "blog").await;

        let repo = SqlxTaxonomyRepository::new(pool.clone());
        assert_eq!(repo.list_categories(None).await.unwrap().len(), 3);

        let blog = repo.list_categories(Some(CategoryKind::Blog)).await.unwrap();
        assert_eq!(blog.len(), 2);
        assert!(blog.iter().all(|c| c.kind == CategoryKind::Blog));

        let events = repo.list_categories(Some(CategoryKind::Event)).await.unwrap();
        assert_eq!(events[0].slug, "ateliers");
    }

    #[tokio::test]
    async fn test_list_tags_counts_published_posts_only() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        let tag = insert_tag(sqlite, "zero-dechet").await;
        let unused = insert_tag(sqlite, "anecdotes").await;
        let published = insert_post(sqlite, "a", "published", None, Some(Utc::now())).await;
        let draft = insert_post(sqlite, "b", "draft", None, None).await;
        tag_post(sqlite, published, tag).await;
        tag_post(sqlite, draft, tag).await;

        let repo = SqlxTaxonomyRepository::new(pool.clone());
        let tags = repo.list_tags().await.unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].tag.id, tag);
        assert_eq!(tags[0].post_count, 1);
        assert_eq!(tags[1].tag.id, unused);
        assert_eq!(tags[1].post_count, 0);
    }

    #[tokio::test]
    async fn test_batched_lookups() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        let cat = insert_category(sqlite, "recettes", "blog").await;
        let rub = insert_rubrique(sqlite, "portraits").await;
        let tag = insert_tag(sqlite, "local").await;
        let post = insert_post(sqlite, "a", "published", Some(cat), None).await;
        tag_post(sqlite, post, tag).await;

        let categories = categories_by_id(&pool, &[cat, 999]).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[&cat].slug, "recettes");

        let rubriques = rubriques_by_id(&pool, &[rub]).await.unwrap();
        assert_eq!(rubriques[&rub].slug, "portraits");

        let tags = tags_by_post(&pool, &[post]).await.unwrap();
        assert_eq!(tags[&post][0].slug, "local");

        assert!(categories_by_id(&pool, &[]).await.unwrap().is_empty());
    }
}
