//! Blog statistics service
//!
//! Aggregates post count, distinct tag count and total views. This is a
//! best-effort read: any failure yields all-zero statistics.

use std::collections::HashSet;
use std::sync::Arc;

use crate::db::repositories::{PostRepository, TagRepository};
use crate::db::DataError;
use crate::models::BlogStats;

/// Statistics service
pub struct StatsService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
}

impl StatsService {
    pub fn new(posts: Arc<dyn PostRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { posts, tags }
    }

    /// Current statistics, or zeros if any part could not be read.
    pub async fn fetch_blog_stats(&self) -> BlogStats {
        match self.collect().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("Failed to fetch blog stats: {}", e);
                BlogStats::default()
            }
        }
    }

    async fn collect(&self) -> Result<BlogStats, DataError> {
        let post_count = self.posts.count().await?;

        let tag_ids = self.tags.list_linked_tag_ids().await?;
        let tag_count = tag_ids
            .iter()
            .map(|id| id.to_filter_value())
            .collect::<HashSet<_>>()
            .len() as u64;

        let total_views = self
            .posts
            .list_views()
            .await?
            .into_iter()
            .map(|v| v.unwrap_or(0))
            .sum();

        Ok(BlogStats {
            post_count,
            tag_count,
            total_views,
        })
    }
}
