//! Event, registration and gallery API endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{default_page, default_page_size, PaginationQuery};
use super::middleware::{ApiError, AppState};
use crate::listing::{EventQuery, EventSort, GalleryQuery, Period};
use crate::models::{CreateRegistrationInput, Registration};

/// Build events router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        // `{event}` is the slug on the detail route and the numeric id below it
        .route("/{event}", get(get_event))
        .route("/{event}/registrations", post(register))
}

/// Build gallery router
pub fn gallery_router() -> Router<AppState> {
    Router::new().route("/", get(list_gallery))
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<String>,
    pub period: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// GET /api/v1/events
async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let period = match query.period.as_deref() {
        Some(period) => period.parse::<Period>().map_err(ApiError::validation_error)?,
        None => Period::default(),
    };
    let sort = match query.sort.as_deref() {
        Some(sort) => sort.parse::<EventSort>().map_err(ApiError::validation_error)?,
        None => EventSort::default(),
    };
    let params = PaginationQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .into();
    let filter = EventQuery {
        category: query.category,
        period,
        search: query.search,
        sort,
    };

    Ok(Json(state.event_service.list(&filter, &params).await))
}

/// GET /api/v1/events/{slug}
async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.event_service.get(&slug).await;
    match (result.data, result.error) {
        (Some(event), _) => Ok(Json(event)),
        (None, Some(_)) => Err(ApiError::internal()),
        (None, None) => Err(ApiError::not_found(format!("Event '{}' not found", slug))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub success: bool,
    pub registration: Registration,
}

/// POST /api/v1/events/{id}/registrations
async fn register(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CreateRegistrationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state.registration_service.register(id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            success: true,
            registration,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct GalleryListQuery {
    pub event: Option<String>,
    pub category: Option<String>,
    /// Empty or "all" for every year
    pub year: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// GET /api/v1/gallery
async fn list_gallery(
    State(state): State<AppState>,
    query: Result<Query<GalleryListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let year = match query.year.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(year) => Some(
            year.parse::<i32>()
                .map_err(|_| ApiError::validation_error(format!("Invalid year: {}", year)))?,
        ),
    };
    let params = PaginationQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .into();
    let filter = GalleryQuery {
        event: query.event,
        category: query.category,
        year,
    };

    Ok(Json(state.event_service.gallery(&filter, &params).await))
}
