//! API middleware and shared request plumbing
//!
//! Contains:
//! - Application state wiring every service to the database pool and cache
//! - The JSON error envelope and its mapping from service errors
//! - Request statistics reported by the health endpoint
//! - Visitor identification for likes and comments

use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{create_cache, QueryCache};
use crate::config::Config;
use crate::db::repositories::{
    SqlxAboutRepository, SqlxBlogPostRepository, SqlxCommentRepository, SqlxContactRepository,
    SqlxEventRepository, SqlxRegistrationRepository, SqlxTaxonomyRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    generate_fingerprint, AboutService, BlogService, CommentService, ContactService,
    EventService, RegistrationService, ServiceError, SmtpMailer, TaxonomyService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.total_response_time_us.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .request_stats
        .record(start.elapsed().as_micros() as u64);
    response
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub blog_service: Arc<BlogService>,
    pub comment_service: Arc<CommentService>,
    pub event_service: Arc<EventService>,
    pub registration_service: Arc<RegistrationService>,
    pub about_service: Arc<AboutService>,
    pub taxonomy_service: Arc<TaxonomyService>,
    pub contact_service: Arc<ContactService>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire every service onto one pool and one query cache
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let cache = QueryCache::new(create_cache(&config.cache));
        let mailer = SmtpMailer::from_config(&config.mail)?;

        let posts = SqlxBlogPostRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let events = SqlxEventRepository::boxed(pool.clone());

        Ok(Self {
            blog_service: Arc::new(BlogService::new(posts.clone(), comments.clone(), cache.clone())),
            comment_service: Arc::new(CommentService::new(
                comments,
                posts,
                cache.clone(),
                config.comments.require_approval,
            )),
            event_service: Arc::new(EventService::new(events.clone(), cache.clone())),
            registration_service: Arc::new(RegistrationService::new(
                SqlxRegistrationRepository::boxed(pool.clone()),
                events,
                cache.clone(),
            )),
            about_service: Arc::new(AboutService::new(
                SqlxAboutRepository::boxed(pool.clone()),
                cache.clone(),
            )),
            taxonomy_service: Arc::new(TaxonomyService::new(
                SqlxTaxonomyRepository::boxed(pool.clone()),
                cache,
            )),
            contact_service: Arc::new(ContactService::new(
                SqlxContactRepository::boxed(pool.clone()),
                mailer,
                config.mail.notify_to.clone(),
                config.site.name.clone(),
            )),
            request_stats: Arc::new(RequestStats::new()),
            pool,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
///
/// Serialized as `{ "success": false, "error": { "code", "message" } }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Internal failure with a fixed message, the cause stays in the logs
    pub fn internal() -> Self {
        Self::internal_error("Something went wrong, please try again later")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" | "CLOSED" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => Self::not_found(format!("{} not found", what)),
            ServiceError::ValidationError(msg) => Self::validation_error(msg),
            ServiceError::Conflict(msg) => Self::new("CONFLICT", msg),
            ServiceError::Closed(msg) => Self::new("CLOSED", msg),
            ServiceError::InternalError(e) => {
                tracing::error!(error = ?e, "Request failed");
                Self::internal()
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

// ============================================================================
// Visitor identification
// ============================================================================

/// Anonymous visitor, identified by a fingerprint of IP and user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub fingerprint: String,
}

/// Client IP from proxy headers, the first `x-forwarded-for` entry winning
pub fn extract_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = extract_ip(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        let ua = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        Ok(Self {
            fingerprint: generate_fingerprint(&ip, ua),
        })
    }
}
