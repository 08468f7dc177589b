//! Data models
//!
//! This module contains the data structures exchanged with the hosted data service
//! and handed to callers:
//! - Raw rows as the service returns them (`PostRow`, `CommentRow`, `Tag`, `PostTagLink`)
//! - Normalized, display-ready shapes (`Post`, `Comment`, `TagWithCount`, `TagCount`)
//! - Identifier and date helpers shared by both

pub mod display;
mod comment;
mod id;
mod post;
mod stats;
mod tag;

pub use comment::{
    normalize_comment, normalize_inserted_comment, Comment, CommentInsert, CommentRow,
    NewComment, COMMENT_COLUMNS, DEFAULT_COMMENTER,
};
pub use display::{DateStyle, DisplayClock};
pub use id::{normalize_id, RecordId};
pub use post::{
    extract_tag_names, normalize_post, Post, PostRow, DEFAULT_AUTHOR, DEFAULT_COVER,
    POST_COLUMNS, POST_TAGS_EMBED,
};
pub use stats::BlogStats;
pub use tag::{PostTagLink, Tag, TagCount, TagWithCount, POST_TAG_COLUMNS, TAG_COLUMNS};
