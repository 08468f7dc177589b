//! Data repositories
//!
//! Repository pattern over the data service. Each repository owns the table
//! names, column lists and row decoding for one resource; services above them
//! only see typed rows.

pub mod comment;
pub mod post;
pub mod tag;

pub use comment::{CommentRepository, RemoteCommentRepository};
pub use post::{PostRepository, RemotePostRepository};
pub use tag::{RemoteTagRepository, TagRepository};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::DataError;

/// Decode service rows into typed rows.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, DataError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DataError::from))
        .collect()
}
