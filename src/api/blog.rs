//! Blog API endpoints
//!
//! Listing and reading posts, plus the visitor interactions attached to a
//! post: views, likes and comments.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{default_page, default_page_size, PaginationQuery, SuccessResponse};
use super::middleware::{ApiError, AppState, Visitor};
use crate::listing::{BlogQuery, BlogSort};
use crate::models::{CommentThread, CreateCommentInput, LikeStatus, ListParams};

/// Build blog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        // `{post}` is the slug on the detail route and the numeric id below it
        .route("/{post}", get(get_post))
        .route("/{post}/view", post(record_view))
        .route("/{post}/like", get(like_status).post(toggle_like))
        .route("/{post}/comments", get(list_comments).post(create_comment))
}

/// Query parameters of the blog listing
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub category: Option<String>,
    pub rubrique: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl ListPostsQuery {
    fn into_parts(self) -> Result<(BlogQuery, ListParams), ApiError> {
        let sort = match self.sort.as_deref() {
            Some(sort) => sort.parse::<BlogSort>().map_err(ApiError::validation_error)?,
            None => BlogSort::default(),
        };
        let params = PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
        .into();
        Ok((
            BlogQuery {
                category: self.category,
                rubrique: self.rubrique,
                tag: self.tag,
                search: self.search,
                sort,
            },
            params,
        ))
    }
}

/// GET /api/v1/blog
async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let (query, params) = query.into_parts()?;
    Ok(Json(state.blog_service.list(&query, &params).await))
}

/// GET /api/v1/blog/{slug}
async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.blog_service.get(&slug).await;
    match (result.data, result.error) {
        (Some(detail), _) => Ok(Json(detail)),
        (None, Some(_)) => Err(ApiError::internal()),
        (None, None) => Err(ApiError::not_found(format!("Blog post '{}' not found", slug))),
    }
}

/// POST /api/v1/blog/{id}/view
async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.blog_service.record_view(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: LikeStatus,
}

/// GET /api/v1/blog/{id}/like
async fn like_status(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let status = state
        .blog_service
        .like_status(id, &visitor.fingerprint)
        .await?;
    Ok(Json(LikeResponse {
        success: true,
        status,
    }))
}

/// POST /api/v1/blog/{id}/like
async fn toggle_like(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let status = state
        .blog_service
        .toggle_like(id, &visitor.fingerprint)
        .await?;
    Ok(Json(LikeResponse {
        success: true,
        status,
    }))
}

/// GET /api/v1/blog/{id}/comments
async fn list_comments(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    Json(state.comment_service.list(id).await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub success: bool,
    /// `false` while the comment waits for moderation
    pub published: bool,
    pub comment: CommentThread,
}

/// POST /api/v1/blog/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<i64>,
    Json(input): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(id, input, Some(&visitor.fingerprint))
        .await?;
    let published = comment.status == crate::models::CommentStatus::Approved;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            published,
            comment: comment.into(),
        }),
    ))
}
