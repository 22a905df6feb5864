//! Route definitions for the BML API
//!
//! Every API route lives under `/api/v1`; stored images are served from
//! the media prefix (`/attaches` by default).

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod categories;
mod communities;
mod dashboard;
mod extract;
mod feeds;
mod health;
mod meals;
mod notices;
mod users;

#[cfg(test)]
mod access_tests;

pub use auth::auth_routes;
pub use categories::category_routes;
pub use communities::community_routes;
pub use dashboard::dashboard_routes;
pub use feeds::feed_routes;
pub use meals::meal_routes;
pub use notices::notice_routes;
pub use users::user_routes;

/// Files one multipart request may carry at the upload size limit
const MAX_FILES_PER_REQUEST: usize = 10;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let config = state.config();
    let body_limit = config
        .media
        .max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST);
    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let attaches = ServeDir::new(state.media().root());
    let attaches_prefix = config.media.public_prefix.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes())
        .nest_service(&attaches_prefix, attaches)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "BML API v1" }))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/feeds", feed_routes())
        .nest("/communities", community_routes())
        .nest("/meals", meal_routes())
        .nest("/notices", notice_routes())
        .nest("/categories", category_routes())
        .nest("/dashboard", dashboard_routes())
}
