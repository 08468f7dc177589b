//! Comment repository
//!
//! Reads and inserts rows of the `comments` table.

use async_trait::async_trait;
use std::sync::Arc;

use super::decode_rows;
use crate::db::{DataError, DynDataService, Query};
use crate::models::{CommentInsert, CommentRow, RecordId, COMMENT_COLUMNS};

const TABLE: &str = "comments";

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments of one post, in the order the service returns them
    async fn list_by_post(&self, post_id: &RecordId) -> Result<Vec<CommentRow>, DataError>;

    /// Insert a comment and return the stored row
    async fn create(&self, comment: &CommentInsert) -> Result<CommentRow, DataError>;
}

/// Comment repository backed by the data service
pub struct RemoteCommentRepository {
    service: DynDataService,
}

impl RemoteCommentRepository {
    pub fn new(service: DynDataService) -> Self {
        Self { service }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(service: DynDataService) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(service))
    }
}

#[async_trait]
impl CommentRepository for RemoteCommentRepository {
    async fn list_by_post(&self, post_id: &RecordId) -> Result<Vec<CommentRow>, DataError> {
        let rows = self
            .service
            .select(&Query::from(TABLE).select(COMMENT_COLUMNS).eq("post_id", post_id))
            .await?;
        tracing::debug!("Fetched {} comments for post {}", rows.len(), post_id);
        decode_rows(rows)
    }

    async fn create(&self, comment: &CommentInsert) -> Result<CommentRow, DataError> {
        let row = self
            .service
            .insert(TABLE, serde_json::to_value(comment)?, COMMENT_COLUMNS)
            .await?;
        Ok(serde_json::from_value(row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDataService;
    use crate::models::NewComment;

    fn setup_test_repo() -> (Arc<MemoryDataService>, RemoteCommentRepository) {
        let service = Arc::new(MemoryDataService::demo());
        let repo = RemoteCommentRepository::new(service.clone());
        (service, repo)
    }

    #[tokio::test]
    async fn test_list_by_post() {
        let (_, repo) = setup_test_repo();

        let rows = repo.list_by_post(&RecordId::Int(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].author_name.as_deref(), Some("Ana"));

        assert!(repo.list_by_post(&RecordId::Int(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_stores_storage_field_names() {
        let (service, repo) = setup_test_repo();
        let insert = CommentInsert::new(RecordId::Int(2), &NewComment::new("Bo", "Nice"));

        let row = repo.create(&insert).await.unwrap();
        assert_eq!(row.id, RecordId::Int(2));
        assert_eq!(row.post_id, Some(RecordId::Int(2)));

        let stored = service.rows("comments");
        assert_eq!(stored[1]["author_name"], "Bo");
        assert_eq!(stored[1]["author_email"], "");
        assert_eq!(stored[1]["content"], "Nice");
    }
}
