//! Comment service

use std::sync::Arc;

use crate::db::repositories::CommentRepository;
use crate::db::DataError;
use crate::models::{
    normalize_comment, normalize_id, normalize_inserted_comment, Comment, CommentInsert,
    DisplayClock, NewComment, RecordId,
};

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    clock: DisplayClock,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, clock: DisplayClock) -> Self {
        Self { repo, clock }
    }

    /// Comments of one post, in the order the service returns them.
    pub async fn fetch_comments_by_post(
        &self,
        post_id: impl Into<RecordId>,
    ) -> Result<Vec<Comment>, DataError> {
        let post_id = normalize_id(post_id);
        let rows = self.repo.list_by_post(&post_id).await.map_err(|e| {
            tracing::error!("Failed to fetch comments of post {}: {}", post_id, e);
            e
        })?;
        Ok(rows
            .into_iter()
            .map(|row| normalize_comment(row, &self.clock))
            .collect())
    }

    /// Store a comment and return it as the service echoed it.
    ///
    /// The email is always stored empty. No validation happens here.
    pub async fn submit_comment(
        &self,
        post_id: impl Into<RecordId>,
        input: NewComment,
    ) -> Result<Comment, DataError> {
        let post_id = normalize_id(post_id);
        let insert = CommentInsert::new(post_id.clone(), &input);
        let row = self.repo.create(&insert).await.map_err(|e| {
            tracing::error!("Failed to submit comment on post {}: {}", post_id, e);
            e
        })?;
        Ok(normalize_inserted_comment(row, &input, &self.clock))
    }
}
