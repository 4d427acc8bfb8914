//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api/v1`:
//! - Blog posts, likes, views and comments (`/blog`)
//! - Events and registrations (`/events`), photo gallery (`/gallery`)
//! - About page sections, taxonomy and the contact form
//! - Health check
//!
//! List endpoints always answer 200 with `{ data, error? }`; a failed read
//! yields the empty value plus an error message. Detail endpoints answer 404
//! for missing content. Mutations answer `{ success: true, ... }` or the
//! [`ApiError`] envelope with a matching status code.

pub mod blog;
pub mod common;
pub mod events;
pub mod middleware;
pub mod site;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, RequestStats, Visitor};

/// Build the `/api/v1` routes
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/blog", blog::router())
        .nest("/events", events::router())
        .nest("/gallery", events::gallery_router())
        .merge(site::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(cors_origin, "Invalid CORS origin, cross-origin requests disabled");
            cors
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
