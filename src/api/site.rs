//! Site-wide endpoints
//!
//! - GET /api/v1/stats - Blog statistics, zeros when unavailable
//! - GET /api/v1/health - Liveness and version

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::BlogStats;

/// Response for the health check
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the site router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/health", get(health))
}

/// GET /api/v1/stats
///
/// Never fails; statistics degrade to zeros.
async fn get_stats(State(state): State<AppState>) -> Json<BlogStats> {
    Json(state.stats_service.fetch_blog_stats().await)
}

/// GET /api/v1/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::demo_server;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_stats() {
        let (_, server) = demo_server();
        let response = server.get("/api/v1/stats").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"postCount": 3, "tagCount": 3, "totalViews": 52}));
    }

    #[tokio::test]
    async fn test_stats_degrade_to_zeros() {
        let (data, server) = demo_server();
        data.fail_everything();

        let response = server.get("/api/v1/stats").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"postCount": 0, "tagCount": 0, "totalViews": 0}));
    }

    #[tokio::test]
    async fn test_health() {
        let (_, server) = demo_server();
        let body: Value = server.get("/api/v1/health").await.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
