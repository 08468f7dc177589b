//! Comment model
//!
//! Storage and display use different field names: the `comments` table has
//! `author_name`/`author_email`, callers see `name`/`email`.

use serde::{Deserialize, Serialize};

use super::display::{DateStyle, DisplayClock};
use super::id::RecordId;
use super::post::non_empty_or;

/// Author name used when a comment has none.
pub const DEFAULT_COMMENTER: &str = "匿名用户";

/// Columns selected from (and returned by inserts into) `comments`.
///
/// The table has no reliable timestamp column, so none is selected.
pub const COMMENT_COLUMNS: &str = "id,post_id,author_name,author_email,content";

/// A `comments` row as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: RecordId,
    #[serde(default)]
    pub post_id: Option<RecordId>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Comment as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub post_id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub content: String,
    /// Creation time rendered for display
    pub date: String,
}

/// Caller input for a new comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub name: String,
    pub content: String,
}

impl NewComment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Insert payload for `comments`, in storage field names.
#[derive(Debug, Clone, Serialize)]
pub struct CommentInsert {
    pub post_id: RecordId,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
}

impl CommentInsert {
    pub fn new(post_id: RecordId, input: &NewComment) -> Self {
        Self {
            post_id,
            author_name: input.name.clone(),
            author_email: String::new(),
            content: input.content.clone(),
        }
    }
}

/// Map a stored comment to display field names.
pub fn normalize_comment(row: CommentRow, clock: &DisplayClock) -> Comment {
    Comment {
        date: clock.format(row.created_at.as_deref(), DateStyle::DateTime),
        id: row.id,
        post_id: row.post_id,
        name: non_empty_or(row.author_name, DEFAULT_COMMENTER),
        email: row.author_email.unwrap_or_default(),
        content: row.content.unwrap_or_default(),
    }
}

/// Map the row echoed back by an insert, filling empty echoes from the caller's input.
pub fn normalize_inserted_comment(
    row: CommentRow,
    input: &NewComment,
    clock: &DisplayClock,
) -> Comment {
    let name = non_empty_or(row.author_name.clone(), &input.name);
    let content = non_empty_or(row.content.clone(), &input.content);
    Comment {
        name,
        content,
        ..normalize_comment(row, clock)
    }
}
