//! Post repository
//!
//! Reads from the `posts` table and calls the `increment_views` procedure.
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `RemotePostRepository` implementing it over a `DataService`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::decode_rows;
use crate::db::{DataError, DynDataService, Query};
use crate::models::{PostRow, RecordId, POST_COLUMNS, POST_TAGS_EMBED};

const TABLE: &str = "posts";

/// Procedure bumping a post's view counter by one.
pub const INCREMENT_VIEWS_FN: &str = "increment_views";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Posts with their tag join, at most `limit` when given
    async fn list(&self, limit: Option<usize>) -> Result<Vec<PostRow>, DataError>;

    /// The one post with this id; zero or several matches are an error
    async fn get_by_id(&self, id: &RecordId) -> Result<PostRow, DataError>;

    /// Number of posts
    async fn count(&self) -> Result<u64, DataError>;

    /// View counter of every post
    async fn list_views(&self) -> Result<Vec<Option<i64>>, DataError>;

    /// Bump the view counter of one post
    async fn increment_views(&self, id: &RecordId) -> Result<(), DataError>;
}

/// Post repository backed by the data service
pub struct RemotePostRepository {
    service: DynDataService,
}

impl RemotePostRepository {
    pub fn new(service: DynDataService) -> Self {
        Self { service }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(service: DynDataService) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(service))
    }

    fn select_with_tags() -> Query {
        Query::from(TABLE).select(format!("{},{}", POST_COLUMNS, POST_TAGS_EMBED))
    }
}

#[derive(Deserialize)]
struct ViewsRow {
    #[serde(default)]
    views: Option<i64>,
}

#[async_trait]
impl PostRepository for RemotePostRepository {
    async fn list(&self, limit: Option<usize>) -> Result<Vec<PostRow>, DataError> {
        let query = match limit {
            Some(n) => Self::select_with_tags().limit(n),
            None => Self::select_with_tags(),
        };
        let rows = self.service.select(&query).await?;
        tracing::debug!("Fetched {} post rows", rows.len());
        decode_rows(rows)
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<PostRow, DataError> {
        let row = self
            .service
            .select_single(&Self::select_with_tags().eq("id", id))
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    async fn count(&self) -> Result<u64, DataError> {
        self.service.count(TABLE).await
    }

    async fn list_views(&self) -> Result<Vec<Option<i64>>, DataError> {
        let rows = self
            .service
            .select(&Query::from(TABLE).select("views"))
            .await?;
        let rows: Vec<ViewsRow> = decode_rows(rows)?;
        Ok(rows.into_iter().map(|r| r.views).collect())
    }

    async fn increment_views(&self, id: &RecordId) -> Result<(), DataError> {
        self.service
            .rpc(INCREMENT_VIEWS_FN, json!({ "post_id": id.to_json() }))
            .await?;
        Ok(())
    }
}
