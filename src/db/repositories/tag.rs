//! Tag repository
//!
//! Reads tags and post-tag links.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::decode_rows;
use crate::db::{DataError, DynDataService, Query};
use crate::models::{PostTagLink, RecordId, Tag, POST_TAG_COLUMNS, TAG_COLUMNS};

const TAGS: &str = "tags";
const POST_TAGS: &str = "post_tags";

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags
    async fn list(&self) -> Result<Vec<Tag>, DataError>;

    /// All post-tag links
    async fn list_links(&self) -> Result<Vec<PostTagLink>, DataError>;

    /// Tag id of every link, duplicates included
    async fn list_linked_tag_ids(&self) -> Result<Vec<RecordId>, DataError>;
}

/// Tag repository backed by the data service
pub struct RemoteTagRepository {
    service: DynDataService,
}

impl RemoteTagRepository {
    pub fn new(service: DynDataService) -> Self {
        Self { service }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(service: DynDataService) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(service))
    }
}

#[derive(Deserialize)]
struct TagIdRow {
    tag_id: RecordId,
}

#[async_trait]
impl TagRepository for RemoteTagRepository {
    async fn list(&self) -> Result<Vec<Tag>, DataError> {
        let rows = self
            .service
            .select(&Query::from(TAGS).select(TAG_COLUMNS))
            .await?;
        tracing::debug!("Fetched {} tags", rows.len());
        decode_rows(rows)
    }

    async fn list_links(&self) -> Result<Vec<PostTagLink>, DataError> {
        let rows = self
            .service
            .select(&Query::from(POST_TAGS).select(POST_TAG_COLUMNS))
            .await?;
        tracing::debug!("Fetched {} post-tag links", rows.len());
        decode_rows(rows)
    }

    async fn list_linked_tag_ids(&self) -> Result<Vec<RecordId>, DataError> {
        let rows = self
            .service
            .select(&Query::from(POST_TAGS).select("tag_id"))
            .await?;
        let rows: Vec<TagIdRow> = decode_rows(rows)?;
        Ok(rows.into_iter().map(|r| r.tag_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDataService;

    fn setup_test_repo() -> RemoteTagRepository {
        RemoteTagRepository::new(Arc::new(MemoryDataService::demo()))
    }

    #[tokio::test]
    async fn test_list() {
        let tags = setup_test_repo().list().await.unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], Tag::new(1, "rust", "rust"));
    }

    #[tokio::test]
    async fn test_list_links() {
        let links = setup_test_repo().list_links().await.unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].tag_id, RecordId::Int(3));
        assert_eq!(links[0].post_id, Some(RecordId::Int(1)));
    }

    #[tokio::test]
    async fn test_list_linked_tag_ids() {
        let ids = setup_test_repo().list_linked_tag_ids().await.unwrap();
        assert_eq!(ids, vec![RecordId::Int(3), RecordId::Int(1), RecordId::Int(2)]);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let service = Arc::new(MemoryDataService::demo());
        service.fail("post_tags");
        let repo = RemoteTagRepository::new(service);

        assert!(repo.list().await.is_ok());
        assert!(repo.list_links().await.is_err());
        assert!(repo.list_linked_tag_ids().await.is_err());
    }
}
