//! Comment API endpoints
//!
//! - GET /api/v1/posts/{id}/comments - Comments of a post
//! - POST /api/v1/posts/{id}/comments - Add a comment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::{Comment, NewComment};

/// Response for comment lists
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

/// Build the comment router, mounted under a post
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/comments", get(list_comments).post(create_comment))
}

/// GET /api/v1/posts/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let comments = state.comment_service.fetch_comments_by_post(id).await?;
    Ok(Json(CommentListResponse { comments }))
}

/// POST /api/v1/posts/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required"));
    }
    if input.content.trim().is_empty() {
        return Err(ApiError::validation_error("Content is required"));
    }

    let comment = state.comment_service.submit_comment(id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::demo_server;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_list_comments() {
        let (_, server) = demo_server();
        let response = server.get("/api/v1/posts/1/comments").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["comments"][0]["name"], "Ana");
        assert_eq!(body["comments"][0]["content"], "Welcome!");
    }

    #[tokio::test]
    async fn test_create_comment() {
        let (data, server) = demo_server();
        let response = server
            .post("/api/v1/posts/2/comments")
            .json(&json!({"name": "Bo", "content": "Thanks"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["name"], "Bo");
        assert_eq!(body["post_id"], 2);
        assert_eq!(data.rows("comments").len(), 2);
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let (data, server) = demo_server();

        for body in [
            json!({"name": "  ", "content": "hi"}),
            json!({"name": "Bo", "content": ""}),
        ] {
            let response = server.post("/api/v1/posts/2/comments").json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let error: Value = response.json();
            assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
        }
        assert_eq!(data.rows("comments").len(), 1);
    }
}
