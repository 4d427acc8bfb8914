//! Site content endpoints: about page sections, taxonomy, contact form and
//! health check

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::SuccessResponse;
use super::middleware::{ApiError, AppState};
use crate::models::{CategoryKind, ContactInput};

/// Build site content router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/team", get(team))
        .route("/testimonials", get(testimonials))
        .route("/timeline", get(timeline))
        .route("/objectives", get(objectives))
        .route("/about", get(about))
        .route("/categories", get(categories))
        .route("/rubriques", get(rubriques))
        .route("/tags", get(tags))
        .route("/contact", post(contact))
        .route("/health", get(health))
}

async fn team(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.about_service.team().await)
}

async fn testimonials(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.about_service.testimonials().await)
}

async fn timeline(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.about_service.timeline().await)
}

async fn objectives(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.about_service.objectives().await)
}

/// GET /api/v1/about - every about page section at once
async fn about(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.about_service.overview().await)
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    /// `blog`, `event`, or empty for both
    pub kind: Option<String>,
}

/// GET /api/v1/categories
async fn categories(
    State(state): State<AppState>,
    query: Result<Query<CategoriesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let kind = match query.kind.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(kind) => Some(kind.parse::<CategoryKind>().map_err(ApiError::validation_error)?),
    };
    Ok(Json(state.taxonomy_service.categories(kind).await))
}

async fn rubriques(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.taxonomy_service.rubriques().await)
}

async fn tags(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.taxonomy_service.tags().await)
}

/// POST /api/v1/contact
async fn contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.contact_service.submit(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::ok())))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) = match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = ?e, "Health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };
    let stats = &state.request_stats;

    (
        status,
        Json(HealthResponse {
            status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
            uptime_seconds: stats.uptime_seconds(),
            total_requests: stats.total_requests(),
            avg_response_time_ms: stats.avg_response_time_us() / 1000.0,
        }),
    )
}
