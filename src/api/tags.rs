//! Tag API endpoints
//!
//! - GET /api/v1/tags - Tag cloud from the tag tables
//! - GET /api/v1/tags/local - Tag frequencies computed from the post list

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::{TagCount, TagWithCount};
use crate::services::get_tags_from_posts;

/// Response for the tag cloud
#[derive(Debug, Serialize, Deserialize)]
pub struct TagListResponse {
    pub tags: Vec<TagWithCount>,
}

/// Response for tag frequencies derived from posts
#[derive(Debug, Serialize, Deserialize)]
pub struct LocalTagListResponse {
    pub tags: Vec<TagCount>,
}

/// Build the tag router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/local", get(list_local_tags))
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<TagListResponse>, ApiError> {
    let tags = state.tag_service.fetch_tags_with_count().await?;
    Ok(Json(TagListResponse { tags }))
}

/// GET /api/v1/tags/local
async fn list_local_tags(
    State(state): State<AppState>,
) -> Result<Json<LocalTagListResponse>, ApiError> {
    let posts = state.post_service.fetch_posts().await?;
    Ok(Json(LocalTagListResponse {
        tags: get_tags_from_posts(&posts),
    }))
}
