//! Blog listing: filters and sort orders of the blog page

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::{paginate, search_matches, slug_matches};
use crate::models::{BlogPost, ListParams, PagedResult};

/// Sort order of the blog listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogSort {
    #[default]
    Newest,
    Oldest,
    Title,
    /// Most liked, then most viewed, then newest
    Popular,
}

impl std::str::FromStr for BlogSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "newest" | "recent" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title" => Ok(Self::Title),
            "popular" => Ok(Self::Popular),
            _ => Err(format!("Invalid blog sort: {}", s)),
        }
    }
}

/// Filters of the blog page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogQuery {
    pub category: Option<String>,
    pub rubrique: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: BlogSort,
}

impl BlogQuery {
    pub fn matches(&self, post: &BlogPost) -> bool {
        let tag_ok = match super::active_filter(self.tag.as_deref()) {
            Some(tag) => post.has_tag(tag),
            None => true,
        };

        tag_ok
            && slug_matches(
                self.category.as_deref(),
                post.category.as_ref().map(|c| c.slug.as_str()),
            )
            && slug_matches(
                self.rubrique.as_deref(),
                post.rubrique.as_ref().map(|r| r.slug.as_str()),
            )
            && search_matches(
                self.search.as_deref(),
                [post.title.as_str()]
                    .into_iter()
                    .chain(post.excerpt.as_deref())
                    .chain(post.author_name.as_deref())
                    .chain(post.tags.iter().map(|t| t.name.as_str())),
            )
    }
}

/// Sort posts in place
pub fn sort_posts(posts: &mut [BlogPost], sort: BlogSort) {
    match sort {
        BlogSort::Newest => posts.sort_by_key(|p| Reverse((p.display_date(), p.id))),
        BlogSort::Oldest => posts.sort_by_key(|p| (p.display_date(), p.id)),
        BlogSort::Title => posts.sort_by_cached_key(|p| (p.title.to_lowercase(), p.id)),
        BlogSort::Popular => posts.sort_by_key(|p| {
            Reverse((p.like_count, p.view_count, p.display_date(), p.id))
        }),
    }
}

/// Filter, sort and paginate the published posts
pub fn list_posts(posts: Vec<BlogPost>, query: &BlogQuery, params: &ListParams) -> PagedResult<BlogPost> {
    let mut matching: Vec<BlogPost> = posts.into_iter().filter(|p| query.matches(p)).collect();
    sort_posts(&mut matching, query.sort);
    paginate(matching, params)
}

/// Up to `limit` other posts of the same category, newest first
pub fn related_posts(posts: &[BlogPost], post: &BlogPost, limit: usize) -> Vec<BlogPost> {
    let Some(category_id) = post.category_id else {
        return Vec::new();
    };
    let mut related: Vec<BlogPost> = posts
        .iter()
        .filter(|p| p.id != post.id && p.category_id == Some(category_id))
        .cloned()
        .collect();
    sort_posts(&mut related, BlogSort::Newest);
    related.truncate(limit);
    related
}
