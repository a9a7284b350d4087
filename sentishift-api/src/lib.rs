//! sentishift-api library - read-only series and shift queries
//!
//! Serves the hourly sentiment series and recorded shifts per platform from
//! a read-only connection to the pipeline's database.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod db;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/series/:platform", get(api::get_series))
        .route("/shifts/:platform", get(api::get_shifts))
        .merge(api::health_routes())
        .with_state(state)
        // Dashboards are served from a different origin
        .layer(CorsLayer::permissive())
}
