//! Health check endpoint
//!
//! Reports whether the pipeline's database is readable and how many enriched
//! posts it holds. An unreadable database reports `degraded`, not an error.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sentishift_common::db::records;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Enriched posts available to the series queries
    pub enriched_posts: Option<i64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let enriched_posts = match records::count_enriched(&state.db).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read enriched posts");
            None
        }
    };

    Json(HealthResponse {
        status: if enriched_posts.is_some() { "ok" } else { "degraded" },
        module: "sentishift-api",
        version: env!("CARGO_PKG_VERSION"),
        enriched_posts,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
