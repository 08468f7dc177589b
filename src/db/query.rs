//! Table queries
//!
//! A `Query` describes one read against one table: the select expression
//! (PostgREST syntax, including embedded joins such as
//! `post_tags(tag_id,tags(id,name))`), equality filters and an optional row limit.

use crate::models::RecordId;

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    /// Value as text, the way PostgREST compares it
    pub value: String,
}

/// Read query against a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    select: String,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl Query {
    /// Query selecting every column of `table`.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Set the select expression.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    /// Keep rows whose `column` equals `id`.
    pub fn eq(mut self, column: impl Into<String>, id: &RecordId) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: id.to_filter_value(),
        });
        self
    }

    /// Return at most `limit` rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &str {
        &self.select
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Query-string parameters in PostgREST form.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        for filter in &self.filters {
            params.push((filter.column.clone(), format!("eq.{}", filter.value)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}
