//! Data service layer
//!
//! This module abstracts the hosted data service (Postgres behind an
//! auto-generated REST/RPC layer). It provides:
//! - `DataService`, the row-based seam: select, select-single, count, insert, rpc
//! - `RestDataService`, the production implementation speaking PostgREST over HTTP
//! - `MemoryDataService`, an in-process implementation for tests and demos
//! - `Query`, the table query description shared by both
//! - Repositories that turn JSON rows into typed rows per resource
//! - A startup schema check
//!
//! # Usage
//!
//! ```ignore
//! use postline::config::ServiceConfig;
//! use postline::db::{Query, RestDataService, DataService};
//!
//! let service = RestDataService::new(&config.service)?;
//! let rows = service
//!     .select(&Query::from("posts").select("id,title").limit(3))
//!     .await?;
//! ```

pub mod memory;
pub mod query;
pub mod repositories;
pub mod rest;
pub mod schema;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use memory::MemoryDataService;
pub use query::{Filter, Query};
pub use rest::RestDataService;
pub use schema::{verify_schema, SchemaReport, TableCheck};

/// PostgREST error code for "exactly one row expected".
pub const NOT_SINGLE_CODE: &str = "PGRST116";

/// Errors reported by a data service.
///
/// These are passed to callers as-is; no variant is added on top of what the
/// service itself reports beyond transport and decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Transport failure (connection refused, timeout, TLS)
    #[error("Data service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status
    #[error("Data service error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// A response or row did not have the expected shape
    #[error("Failed to decode data service response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response was well-formed JSON but not what the protocol promises
    #[error("Invalid data service response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed from the given settings
    #[error("Invalid data service configuration: {0}")]
    Config(String),
}

impl DataError {
    /// Build an API error from a status, an optional code and a message.
    pub fn api(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.map(str::to_string),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// The error a single-row request produces when `rows` rows matched.
    pub fn not_single(rows: usize) -> Self {
        Self::Api {
            status: 406,
            code: Some(NOT_SINGLE_CODE.to_string()),
            message: "JSON object requested, multiple (or no) rows returned".to_string(),
            details: Some(format!("The result contains {} rows", rows)),
            hint: None,
        }
    }

    /// Whether this is the "zero or several rows for a single-row request" error.
    pub fn is_not_single(&self) -> bool {
        self.code() == Some(NOT_SINGLE_CODE)
    }

    /// HTTP status reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Service error code (e.g. `PGRST116`, `42703`), if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Row-based interface of the hosted data service.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Rows of `query.table()` matching the query, projected by its select expression.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DataError>;

    /// Exactly one row; zero or several matches are an error.
    async fn select_single(&self, query: &Query) -> Result<Value, DataError>;

    /// Number of rows in `table`, without fetching them.
    async fn count(&self, table: &str) -> Result<u64, DataError>;

    /// Insert one row and return it projected by `returning`.
    async fn insert(&self, table: &str, row: Value, returning: &str) -> Result<Value, DataError>;

    /// Call a named remote procedure.
    async fn rpc(&self, function: &str, args: Value) -> Result<Value, DataError>;
}

/// Shared handle to a data service.
pub type DynDataService = Arc<dyn DataService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_single_is_recognized() {
        let err = DataError::not_single(0);
        assert!(err.is_not_single());
        assert_eq!(err.status(), Some(406));
        assert_eq!(err.code(), Some(NOT_SINGLE_CODE));
    }

    #[test]
    fn test_other_errors_are_not_not_single() {
        assert!(!DataError::api(500, None, "boom").is_not_single());
        assert!(!DataError::InvalidResponse("x".into()).is_not_single());
    }

    #[test]
    fn test_api_error_display() {
        let err = DataError::api(404, Some("PGRST202"), "Could not find the function");
        assert_eq!(
            err.to_string(),
            "Data service error (404): Could not find the function"
        );
    }
}
