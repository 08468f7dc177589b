//! API layer - HTTP handlers and routing
//!
//! This module exposes the blog operations over HTTP under `/api/v1`.
//! It includes:
//! - Post endpoints (list, featured, by id, view counter)
//! - Comment endpoints (list and submit, nested under a post)
//! - Tag endpoints (tag cloud, tag frequencies from posts)
//! - Site endpoints (statistics, health)

pub mod comments;
pub mod error;
pub mod posts;
pub mod site;
pub mod tags;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{ApiError, ApiErrorDetail};

use crate::db::repositories::{RemoteCommentRepository, RemotePostRepository, RemoteTagRepository};
use crate::db::DynDataService;
use crate::models::DisplayClock;
use crate::services::{CommentService, PostService, StatsService, TagService};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub tag_service: Arc<TagService>,
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    /// Wire every repository and service on top of one data service.
    pub fn new(service: DynDataService, clock: DisplayClock) -> Self {
        let post_repo = RemotePostRepository::boxed(service.clone());
        let tag_repo = RemoteTagRepository::boxed(service.clone());
        let comment_repo = RemoteCommentRepository::boxed(service);

        Self {
            post_service: Arc::new(PostService::new(post_repo.clone(), clock)),
            comment_service: Arc::new(CommentService::new(comment_repo, clock)),
            tag_service: Arc::new(TagService::new(tag_repo.clone())),
            stats_service: Arc::new(StatsService::new(post_repo, tag_repo)),
        }
    }
}

/// Build the API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router().merge(comments::router()))
        .nest("/tags", tags::router())
        .merge(site::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e);
            CorsLayer::new()
        }
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::MemoryDataService;
    use axum_test::TestServer;
    use chrono::{TimeZone, Utc};

    /// Test server over the seeded in-memory blog, with a frozen clock.
    pub fn demo_server() -> (Arc<MemoryDataService>, TestServer) {
        let data = Arc::new(MemoryDataService::demo());
        let clock = DisplayClock::frozen(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), 480);
        let state = AppState::new(data.clone(), clock);
        let server = TestServer::new(build_router(state, "http://localhost:3000")).unwrap();
        (data, server)
    }
}
