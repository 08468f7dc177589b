//! Blog statistics

use serde::{Deserialize, Serialize};

/// Site-wide figures for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogStats {
    /// Number of rows in `posts`
    pub post_count: u64,
    /// Number of distinct tags linked to at least one post
    pub tag_count: u64,
    /// Sum of `views` across all posts
    pub total_views: i64,
}
