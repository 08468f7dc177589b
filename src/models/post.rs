//! Post model
//!
//! This module provides:
//! - `PostRow`, the shape of a `posts` row as the service returns it, optionally
//!   carrying the embedded `post_tags(tag_id,tags(id,name))` join
//! - `Post`, the normalized shape handed to callers
//! - `normalize_post`, the pure transformation between the two

use serde::{Deserialize, Serialize};

use super::display::{DateStyle, DisplayClock};
use super::id::RecordId;

/// Cover glyph used when a post has none.
pub const DEFAULT_COVER: &str = "📄";

/// Author name used when a post has none.
pub const DEFAULT_AUTHOR: &str = "匿名作者";

/// Columns selected from `posts`.
pub const POST_COLUMNS: &str = "id,title,slug,content";

/// Embedded join that brings tag names along with each post.
pub const POST_TAGS_EMBED: &str = "post_tags(tag_id,tags(id,name))";

/// A `posts` row as returned by the service.
///
/// Everything except `id` is optional: columns beyond `id,title,slug,content` are
/// read opportunistically and may not exist on the remote table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    pub id: RecordId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Raw join payload, kept untyped so a malformed join never fails the row
    #[serde(default)]
    pub post_tags: Option<serde_json::Value>,
    /// Tag names already derived by an earlier normalization
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Display date already derived by an earlier normalization
    #[serde(default)]
    pub date: Option<String>,
}

/// Post as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Tag names, never absent
    pub tags: Vec<String>,
    pub cover: String,
    pub likes: i64,
    pub views: i64,
    pub author: String,
    /// Creation date rendered for display
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Pull tag names out of the embedded `post_tags` join.
///
/// Anything unexpected (join missing, not an array, entries without a nested
/// `tags.name`) yields fewer names, never an error.
pub fn extract_tag_names(post_tags: Option<&serde_json::Value>) -> Vec<String> {
    let Some(links) = post_tags.and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    links
        .iter()
        .filter_map(|link| link.get("tags"))
        .filter_map(|tag| tag.get("name"))
        .filter_map(|name| name.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a raw row into a `Post`.
///
/// Defaults only fire on absence, so normalizing an already-normalized post
/// (serialized and read back as a row) gives the same post.
pub fn normalize_post(row: PostRow, clock: &DisplayClock) -> Post {
    let tags = match (&row.post_tags, row.tags) {
        (Some(join), _) => extract_tag_names(Some(join)),
        (None, Some(existing)) => existing,
        (None, None) => Vec::new(),
    };

    let date = match (&row.created_at, row.date) {
        (None, Some(existing)) if !existing.is_empty() => existing,
        (created_at, _) => clock.format(created_at.as_deref(), DateStyle::Date),
    };

    Post {
        id: row.id,
        title: row.title.unwrap_or_default(),
        slug: row.slug.unwrap_or_default(),
        content: row.content.unwrap_or_default(),
        tags,
        cover: non_empty_or(row.cover, DEFAULT_COVER),
        likes: row.likes.unwrap_or(0),
        views: row.views.unwrap_or(0),
        author: non_empty_or(row.author, DEFAULT_AUTHOR),
        date,
        created_at: row.created_at,
    }
}

pub(crate) fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}
