//! Post API endpoints
//!
//! Handles HTTP requests for posts:
//! - GET /api/v1/posts - All posts
//! - GET /api/v1/posts/featured?limit=N - First N posts
//! - GET /api/v1/posts/{id} - One post
//! - POST /api/v1/posts/{id}/views - Count a view

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::Post;
use crate::services::DEFAULT_FEATURED_LIMIT;

/// Query parameters for featured posts
#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    #[serde(default = "default_featured_limit")]
    pub limit: usize,
}

fn default_featured_limit() -> usize {
    DEFAULT_FEATURED_LIMIT
}

/// Response for post lists
#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
}

/// Build the post router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/featured", get(list_featured_posts))
        .route("/{id}", get(get_post))
        .route("/{id}/views", post(increment_views))
}

/// GET /api/v1/posts
async fn list_posts(State(state): State<AppState>) -> Result<Json<PostListResponse>, ApiError> {
    let posts = state.post_service.fetch_posts().await?;
    Ok(Json(PostListResponse { posts }))
}

/// GET /api/v1/posts/featured
async fn list_featured_posts(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let posts = state.post_service.fetch_featured_posts(query.limit).await?;
    Ok(Json(PostListResponse { posts }))
}

/// GET /api/v1/posts/{id}
///
/// The service reports "not exactly one row" for unknown ids; that becomes 404.
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    match state.post_service.fetch_post_by_id(id.as_str()).await {
        Ok(post) => Ok(Json(post)),
        Err(e) if e.is_not_single() => Err(ApiError::not_found(format!("Post not found: {}", id))),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/posts/{id}/views
///
/// Always succeeds; counting is best-effort.
async fn increment_views(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.post_service.increment_post_views(id).await;
    StatusCode::NO_CONTENT
}
