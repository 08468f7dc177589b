//! Tag service
//!
//! Implements tag aggregation:
//! - Tag cloud from the `tags` and `post_tags` tables, zero-count tags included
//! - Tag frequencies from posts already in hand, without any request

use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::locale;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repositories::TagRepository;
use crate::db::DataError;
use crate::models::{Post, TagCount, TagWithCount};

/// Orders tag names the way a zh-CN reader expects: Han by pinyin ahead of
/// Latin, lowercase before uppercase for otherwise equal names.
pub struct NameCollator {
    collator: Option<CollatorBorrowed<'static>>,
}

impl NameCollator {
    pub fn new() -> Self {
        let collator = match Collator::try_new(locale!("zh").into(), Default::default()) {
            Ok(collator) => Some(collator),
            Err(e) => {
                tracing::warn!("zh collation unavailable, ordering tag names by code point: {}", e);
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    collator: NameCollator,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self {
            repo,
            collator: NameCollator::new(),
        }
    }

    /// Every tag with the number of posts linked to it.
    ///
    /// Sorted by count descending, then by name in zh collation. When there are no tags the
    /// links are not fetched.
    pub async fn fetch_tags_with_count(&self) -> Result<Vec<TagWithCount>, DataError> {
        let tags = self.repo.list().await.map_err(|e| {
            tracing::error!("Failed to fetch tags: {}", e);
            e
        })?;
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let links = self.repo.list_links().await.map_err(|e| {
            tracing::error!("Failed to fetch post-tag links: {}", e);
            e
        })?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for link in &links {
            *counts.entry(link.tag_id.to_filter_value()).or_insert(0) += 1;
        }

        let mut result: Vec<TagWithCount> = tags
            .iter()
            .map(|tag| {
                let count = counts.get(&tag.id.to_filter_value()).copied().unwrap_or(0);
                TagWithCount::new(tag, count)
            })
            .collect();
        result.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| self.collator.compare(&a.name, &b.name))
        });

        Ok(result)
    }
}

/// Count tag names across posts.
///
/// Empty names are skipped. Sorted by count descending; equal counts keep the
/// order in which the names were first seen.
pub fn get_tags_from_posts(posts: &[Post]) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for name in posts.iter().flat_map(|p| p.tags.iter()) {
        if name.is_empty() {
            continue;
        }
        match index.get(name.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(TagCount {
                    name: name.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
