//! Startup schema check
//!
//! Checks each table the blog reads with the columns it selects, fetching no
//! rows. A table whose check fails is reported as incompatible; the server
//! still starts and the failing operations report their own errors.

use std::fmt;

use super::{DataService, Query};
use crate::models::{COMMENT_COLUMNS, POST_COLUMNS, POST_TAGS_EMBED, POST_TAG_COLUMNS, TAG_COLUMNS};

/// Outcome of probing one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Ok,
    Incompatible(String),
}

/// One checked table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheck {
    pub table: &'static str,
    pub columns: String,
    pub status: TableStatus,
}

/// Result of `verify_schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub tables: Vec<TableCheck>,
}

impl SchemaReport {
    pub fn is_compatible(&self) -> bool {
        self.tables.iter().all(|t| t.status == TableStatus::Ok)
    }

    /// Tables whose check failed.
    pub fn incompatible(&self) -> impl Iterator<Item = &TableCheck> {
        self.tables
            .iter()
            .filter(|t| t.status != TableStatus::Ok)
    }
}

impl fmt::Display for TableCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            TableStatus::Ok => write!(f, "{} ({}): ok", self.table, self.columns),
            TableStatus::Incompatible(reason) => {
                write!(f, "{} ({}): {}", self.table, self.columns, reason)
            }
        }
    }
}

fn required_tables() -> Vec<(&'static str, String)> {
    vec![
        ("posts", format!("{},{}", POST_COLUMNS, POST_TAGS_EMBED)),
        ("post_tags", POST_TAG_COLUMNS.to_string()),
        ("tags", TAG_COLUMNS.to_string()),
        ("comments", COMMENT_COLUMNS.to_string()),
    ]
}

/// Check every table the blog reads.
pub async fn verify_schema(service: &dyn DataService) -> SchemaReport {
    let mut tables = Vec::new();

    for (table, columns) in required_tables() {
        let query = Query::from(table).select(columns.as_str()).limit(0);
        let status = match service.select(&query).await {
            Ok(_) => TableStatus::Ok,
            Err(e) => TableStatus::Incompatible(e.to_string()),
        };
        tables.push(TableCheck {
            table,
            columns,
            status,
        });
    }

    SchemaReport { tables }
}
