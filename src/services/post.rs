//! Post service
//!
//! Reads posts with their tags in one round trip and normalizes them for
//! display. Also owns the best-effort view counter.

use std::sync::Arc;

use crate::db::repositories::PostRepository;
use crate::db::DataError;
use crate::models::{normalize_id, normalize_post, DisplayClock, Post, RecordId};

/// Number of posts `fetch_featured_posts` returns by default.
pub const DEFAULT_FEATURED_LIMIT: usize = 3;

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    clock: DisplayClock,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, clock: DisplayClock) -> Self {
        Self { repo, clock }
    }

    /// All posts, normalized, in the order the service returns them.
    pub async fn fetch_posts(&self) -> Result<Vec<Post>, DataError> {
        let rows = self.repo.list(None).await.map_err(|e| {
            tracing::error!("Failed to fetch posts: {}", e);
            e
        })?;
        Ok(rows
            .into_iter()
            .map(|row| normalize_post(row, &self.clock))
            .collect())
    }

    /// The first `limit` posts the service returns. No ordering is imposed.
    pub async fn fetch_featured_posts(&self, limit: usize) -> Result<Vec<Post>, DataError> {
        let rows = self.repo.list(Some(limit)).await.map_err(|e| {
            tracing::error!("Failed to fetch featured posts: {}", e);
            e
        })?;
        Ok(rows
            .into_iter()
            .map(|row| normalize_post(row, &self.clock))
            .collect())
    }

    /// One post by id.
    ///
    /// Zero or several matching rows surface as the service's "not exactly one
    /// row" error (see `DataError::is_not_single`).
    pub async fn fetch_post_by_id(&self, id: impl Into<RecordId>) -> Result<Post, DataError> {
        let id = normalize_id(id);
        let row = self.repo.get_by_id(&id).await.map_err(|e| {
            tracing::error!("Failed to fetch post {}: {}", id, e);
            e
        })?;
        Ok(normalize_post(row, &self.clock))
    }

    /// Bump a post's view counter. Failures are logged and otherwise ignored.
    pub async fn increment_post_views(&self, post_id: impl Into<RecordId>) {
        let id = normalize_id(post_id);
        if let Err(e) = self.repo.increment_views(&id).await {
            tracing::warn!("Failed to increment views of post {}: {}", id, e);
        }
    }
}
