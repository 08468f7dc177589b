//! Tag model
//!
//! This module defines the tag entities read from the `tags` and `post_tags`
//! tables, and the counted shapes produced by tag aggregation.

use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// Columns selected from `tags`.
pub const TAG_COLUMNS: &str = "id,name,slug";

/// Columns selected from `post_tags`.
pub const POST_TAG_COLUMNS: &str = "tag_id,post_id";

/// Tag row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Tag {
    pub fn new(id: impl Into<RecordId>, name: &str, slug: &str) -> Self {
        Self {
            id: id.into(),
            name: Some(name.to_string()),
            slug: Some(slug.to_string()),
        }
    }

    /// Name to show for the tag: its name, else its slug, else its id.
    pub fn display_name(&self) -> String {
        [self.name.as_deref(), self.slug.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Association between one post and one tag. Identity is the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostTagLink {
    pub tag_id: RecordId,
    #[serde(default)]
    pub post_id: Option<RecordId>,
}

/// Tag with the number of posts linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: RecordId,
    pub name: String,
    pub count: usize,
}

impl TagWithCount {
    pub fn new(tag: &Tag, count: usize) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.display_name(),
            count,
        }
    }
}

/// Tag name with an occurrence count, aggregated from already-fetched posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_prefers_name() {
        let tag = Tag::new(1, "Rust", "rust");
        assert_eq!(tag.display_name(), "Rust");
    }

    #[test]
    fn test_display_name_falls_back_to_slug_then_id() {
        let tag: Tag = serde_json::from_value(json!({"id": 3, "slug": "web"})).unwrap();
        assert_eq!(tag.display_name(), "web");

        let tag: Tag = serde_json::from_value(json!({"id": 4, "name": "", "slug": null})).unwrap();
        assert_eq!(tag.display_name(), "4");
    }

    #[test]
    fn test_tag_with_count_new() {
        let tag = Tag::new("t-1", "Rust", "rust");
        let counted = TagWithCount::new(&tag, 42);

        assert_eq!(counted.id, RecordId::Text("t-1".to_string()));
        assert_eq!(counted.name, "Rust");
        assert_eq!(counted.count, 42);
    }

    #[test]
    fn test_link_without_post_id_deserializes() {
        let link: PostTagLink = serde_json::from_value(json!({"tag_id": 7})).unwrap();
        assert_eq!(link.tag_id, RecordId::Int(7));
        assert_eq!(link.post_id, None);
    }
}
