//! In-memory data service
//!
//! `MemoryDataService` keeps JSON rows per table and answers the same
//! operations as the hosted service, including embedded joins:
//!
//! - `child(cols)` on a row that has a `child_id` column (singular of the
//!   embedded table name) resolves to one object, or null;
//! - otherwise it resolves to the array of `child` rows whose
//!   `<singular parent>_id` equals the row's `id`.
//!
//! So from `posts`, `post_tags(tag_id,tags(id,name))` yields each post's links,
//! each carrying its tag object.
//!
//! Selecting a column that no row of a non-empty table has fails with the
//! same error code Postgres uses for unknown columns. Tables and procedures can
//! be told to fail, and every call is recorded, so tests can check which
//! requests an operation issued and in what order.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use super::{DataError, DataService, Query};
use crate::models::RecordId;

/// Rows per table.
pub type Tables = HashMap<String, Vec<Value>>;

/// Remote procedure body: mutates tables, returns the call's result.
pub type Procedure = Box<dyn Fn(&mut Tables, &Value) -> Result<Value, DataError> + Send + Sync>;

/// Postgres error code for an unknown column.
const UNDEFINED_COLUMN: &str = "42703";

/// Data service holding its tables in memory.
#[derive(Default)]
pub struct MemoryDataService {
    tables: RwLock<Tables>,
    procedures: RwLock<HashMap<String, Procedure>>,
    failing: RwLock<HashSet<String>>,
    fail_all: RwLock<bool>,
    dropped: RwLock<HashMap<String, HashSet<String>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows to `table`, creating it if needed.
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.insert_rows(table, rows);
        self
    }

    /// Register a remote procedure.
    pub fn with_procedure<F>(self, name: &str, procedure: F) -> Self
    where
        F: Fn(&mut Tables, &Value) -> Result<Value, DataError> + Send + Sync + 'static,
    {
        write(&self.procedures).insert(name.to_string(), Box::new(procedure));
        self
    }

    /// Discard `columns` from rows inserted into `table`, as a table without
    /// those columns (or a trigger clearing them) would.
    pub fn with_dropped_columns(self, table: &str, columns: &[&str]) -> Self {
        write(&self.dropped)
            .entry(table.to_string())
            .or_default()
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Register `increment_views(post_id)`, bumping `posts.views` of the matching post.
    pub fn with_increment_views(self) -> Self {
        self.with_procedure("increment_views", |tables, args| {
            let post_id = args
                .get("post_id")
                .and_then(RecordId::from_json)
                .ok_or_else(|| DataError::api(400, Some("22023"), "post_id is required"))?;
            if let Some(post) = tables
                .get_mut("posts")
                .and_then(|rows| rows.iter_mut().find(|row| matches_id(row, "id", &post_id)))
            {
                let views = post.get("views").and_then(Value::as_i64).unwrap_or(0);
                post["views"] = json!(views + 1);
            }
            Ok(Value::Null)
        })
    }

    /// Append rows to `table`, creating it if needed.
    pub fn insert_rows(&self, table: &str, rows: Vec<Value>) {
        write(&self.tables)
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of the rows in `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        read(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Make every operation touching `target` fail. `target` is a table name
    /// or `rpc:<function>`.
    pub fn fail(&self, target: &str) {
        write(&self.failing).insert(target.to_string());
    }

    /// Make every operation fail.
    pub fn fail_everything(&self) {
        *write(&self.fail_all) = true;
    }

    /// Undo `fail` and `fail_everything`.
    pub fn recover(&self) {
        write(&self.failing).clear();
        *write(&self.fail_all) = false;
    }

    /// Calls received so far, e.g. `select posts`, `count posts`, `rpc increment_views`.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// A small seeded blog, used by the `demo` build.
    pub fn demo() -> Self {
        Self::new()
            .with_rows(
                "posts",
                vec![
                    json!({
                        "id": 1, "title": "Hello, postline", "slug": "hello-postline",
                        "content": "First post.", "views": 12, "likes": 3,
                        "author": "Editor", "created_at": "2024-03-01T08:00:00+00:00"
                    }),
                    json!({
                        "id": 2, "title": "Notes on async Rust", "slug": "async-rust-notes",
                        "content": "Futures, executors and pinning.", "views": 40,
                        "created_at": "2024-04-12T10:30:00+00:00"
                    }),
                    json!({
                        "id": 3, "title": "Untitled draft", "slug": "draft",
                        "content": "", "views": null
                    }),
                ],
            )
            .with_rows(
                "tags",
                vec![
                    json!({"id": 1, "name": "rust", "slug": "rust"}),
                    json!({"id": 2, "name": "web", "slug": "web"}),
                    json!({"id": 3, "name": "meta", "slug": "meta"}),
                ],
            )
            .with_rows(
                "post_tags",
                vec![
                    json!({"post_id": 1, "tag_id": 3}),
                    json!({"post_id": 2, "tag_id": 1}),
                    json!({"post_id": 2, "tag_id": 2}),
                ],
            )
            .with_rows(
                "comments",
                vec![json!({
                    "id": 1, "post_id": 1, "author_name": "Ana",
                    "author_email": "", "content": "Welcome!"
                })],
            )
            .with_increment_views()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check_available(&self, target: &str) -> Result<(), DataError> {
        if *read(&self.fail_all) || read(&self.failing).contains(target) {
            return Err(DataError::api(
                503,
                None,
                format!("{} is unavailable", target),
            ));
        }
        Ok(())
    }

    fn run_select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        let fields = parse_select(query.columns());
        let tables = read(&self.tables);
        let rows = tables.get(query.table()).map(Vec::as_slice).unwrap_or(&[]);

        check_columns(query.table(), rows, &fields)?;

        let matching = rows.iter().filter(|row| {
            query
                .filters()
                .iter()
                .all(|f| row.get(&f.column).map(filter_text).as_deref() == Some(f.value.as_str()))
        });
        Ok(matching
            .take(query.row_limit().unwrap_or(usize::MAX))
            .map(|row| project(&tables, query.table(), row, &fields))
            .collect())
    }
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        self.record(format!("select {}", query.table()));
        self.check_available(query.table())?;
        self.run_select(query)
    }

    async fn select_single(&self, query: &Query) -> Result<Value, DataError> {
        self.record(format!("select_single {}", query.table()));
        self.check_available(query.table())?;
        let mut rows = self.run_select(query)?;
        if rows.len() != 1 {
            return Err(DataError::not_single(rows.len()));
        }
        Ok(rows.remove(0))
    }

    async fn count(&self, table: &str) -> Result<u64, DataError> {
        self.record(format!("count {}", table));
        self.check_available(table)?;
        Ok(read(&self.tables).get(table).map_or(0, Vec::len) as u64)
    }

    async fn insert(&self, table: &str, row: Value, returning: &str) -> Result<Value, DataError> {
        self.record(format!("insert {}", table));
        self.check_available(table)?;

        let Value::Object(mut object) = row else {
            return Err(DataError::api(400, Some("PGRST102"), "Expected a JSON object"));
        };

        if let Some(columns) = read(&self.dropped).get(table) {
            object.retain(|key, _| !columns.contains(key));
        }

        let mut tables = write(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();
        if !object.contains_key("id") {
            let next_id = rows
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_i64))
                .max()
                .unwrap_or(0)
                + 1;
            object.insert("id".to_string(), json!(next_id));
        }
        let stored = Value::Object(object);
        rows.push(stored.clone());

        // Columns the stored row lacks come back as null, like nullable columns
        let mut echoed = Map::new();
        for field in parse_select(returning) {
            match field {
                Field::All => {
                    if let Value::Object(all) = &stored {
                        echoed.extend(all.clone());
                    }
                }
                Field::Column(name) => {
                    echoed.insert(name.clone(), stored.get(&name).cloned().unwrap_or(Value::Null));
                }
                Field::Embed { .. } => {}
            }
        }
        Ok(Value::Object(echoed))
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, DataError> {
        self.record(format!("rpc {}", function));
        self.check_available(&format!("rpc:{}", function))?;

        let procedures = read(&self.procedures);
        let procedure = procedures.get(function).ok_or_else(|| {
            DataError::api(
                404,
                Some("PGRST202"),
                format!("Could not find the function public.{}", function),
            )
        })?;
        let mut tables = write(&self.tables);
        procedure(&mut tables, &args)
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// One item of a select expression.
#[derive(Debug, Clone, PartialEq)]
enum Field {
    All,
    Column(String),
    Embed { table: String, fields: Vec<Field> },
}

/// Parse `id,title,post_tags(tag_id,tags(id,name))` into fields.
fn parse_select(expr: &str) -> Vec<Field> {
    split_top_level(expr)
        .into_iter()
        .filter_map(|item| {
            let item = item.trim();
            if item.is_empty() {
                return None;
            }
            if item == "*" {
                return Some(Field::All);
            }
            match (item.find('('), item.rfind(')')) {
                (Some(open), Some(close)) if open < close => Some(Field::Embed {
                    table: item[..open].trim().to_string(),
                    fields: parse_select(&item[open + 1..close]),
                }),
                _ => Some(Field::Column(item.to_string())),
            }
        })
        .collect()
}

fn split_top_level(expr: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&expr[start..]);
    items
}

fn check_columns(table: &str, rows: &[Value], fields: &[Field]) -> Result<(), DataError> {
    if rows.is_empty() {
        return Ok(());
    }
    for field in fields {
        if let Field::Column(name) = field {
            if !rows.iter().any(|row| row.get(name).is_some()) {
                return Err(DataError::api(
                    400,
                    Some(UNDEFINED_COLUMN),
                    format!("column {}.{} does not exist", table, name),
                ));
            }
        }
    }
    Ok(())
}

fn project(tables: &Tables, table: &str, row: &Value, fields: &[Field]) -> Value {
    let mut out = Map::new();
    for field in fields {
        match field {
            Field::All => {
                if let Value::Object(all) = row {
                    out.extend(all.clone());
                }
            }
            Field::Column(name) => {
                out.insert(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
            }
            Field::Embed {
                table: child,
                fields: child_fields,
            } => {
                out.insert(child.clone(), embed(tables, table, row, child, child_fields));
            }
        }
    }
    Value::Object(out)
}

fn embed(tables: &Tables, parent: &str, row: &Value, child: &str, fields: &[Field]) -> Value {
    let child_rows = tables.get(child).map(Vec::as_slice).unwrap_or(&[]);

    let parent_key = format!("{}_id", singular(child));
    if let Some(key) = row.get(&parent_key).and_then(RecordId::from_json) {
        // Many-to-one: the row points at its child
        return child_rows
            .iter()
            .find(|c| matches_id(c, "id", &key))
            .map(|c| project(tables, child, c, fields))
            .unwrap_or(Value::Null);
    }

    // One-to-many: children point back at the row
    let back_key = format!("{}_id", singular(parent));
    let Some(id) = row.get("id").and_then(RecordId::from_json) else {
        return Value::Array(Vec::new());
    };
    Value::Array(
        child_rows
            .iter()
            .filter(|c| matches_id(c, &back_key, &id))
            .map(|c| project(tables, child, c, fields))
            .collect(),
    )
}

fn singular(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}

fn matches_id(row: &Value, column: &str, id: &RecordId) -> bool {
    row.get(column).map(filter_text).as_deref() == Some(id.to_filter_value().as_str())
}

/// Text form of a column value, as an equality filter compares it.
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> MemoryDataService {
        MemoryDataService::new()
            .with_rows(
                "posts",
                vec![
                    json!({"id": 1, "title": "A", "views": 3}),
                    json!({"id": 2, "title": "B", "views": null}),
                ],
            )
            .with_rows(
                "tags",
                vec![json!({"id": 10, "name": "rust"}), json!({"id": 11, "name": "web"})],
            )
            .with_rows(
                "post_tags",
                vec![
                    json!({"post_id": 1, "tag_id": 10}),
                    json!({"post_id": 1, "tag_id": 11}),
                ],
            )
    }

    #[test]
    fn test_parse_select_nested() {
        assert_eq!(
            parse_select("id, title,post_tags(tag_id,tags(id,name))"),
            vec![
                Field::Column("id".into()),
                Field::Column("title".into()),
                Field::Embed {
                    table: "post_tags".into(),
                    fields: vec![
                        Field::Column("tag_id".into()),
                        Field::Embed {
                            table: "tags".into(),
                            fields: vec![Field::Column("id".into()), Field::Column("name".into())],
                        },
                    ],
                },
            ]
        );
        assert_eq!(parse_select("*"), vec![Field::All]);
    }

    #[tokio::test]
    async fn test_select_with_embedded_join() {
        let service = blog();
        let rows = service
            .select(&Query::from("posts").select("id,post_tags(tag_id,tags(id,name))"))
            .await
            .unwrap();

        assert_eq!(
            rows[0],
            json!({
                "id": 1,
                "post_tags": [
                    {"tag_id": 10, "tags": {"id": 10, "name": "rust"}},
                    {"tag_id": 11, "tags": {"id": 11, "name": "web"}}
                ]
            })
        );
        assert_eq!(rows[1], json!({"id": 2, "post_tags": []}));
    }

    #[tokio::test]
    async fn test_select_filters_and_limits() {
        let service = blog();

        let rows = service
            .select(&Query::from("posts").select("id").eq("id", &RecordId::Int(2)))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": 2})]);

        // Filters compare as text, so "2" matches an integer id
        let rows = service
            .select(&Query::from("posts").select("id").eq("id", &RecordId::Text("2".into())))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = service
            .select(&Query::from("posts").select("id").limit(1))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn test_unknown_column_is_rejected() {
        let service = blog();
        let err = service
            .select(&Query::from("posts").select("id,cover"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(UNDEFINED_COLUMN));
    }

    #[tokio::test]
    async fn test_select_single() {
        let service = blog();

        let row = service
            .select_single(&Query::from("posts").select("title").eq("id", &RecordId::Int(1)))
            .await
            .unwrap();
        assert_eq!(row, json!({"title": "A"}));

        let err = service
            .select_single(&Query::from("posts").select("title"))
            .await
            .unwrap_err();
        assert!(err.is_not_single());

        let err = service
            .select_single(&Query::from("posts").eq("id", &RecordId::Int(9)))
            .await
            .unwrap_err();
        assert!(err.is_not_single());
    }

    #[tokio::test]
    async fn test_count() {
        let service = blog();
        assert_eq!(service.count("posts").await.unwrap(), 2);
        assert_eq!(service.count("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_echoes_columns() {
        let service = blog();
        let echoed = service
            .insert(
                "comments",
                json!({"post_id": 1, "author_name": "Ana"}),
                "id,post_id,author_name,content",
            )
            .await
            .unwrap();

        assert_eq!(
            echoed,
            json!({"id": 1, "post_id": 1, "author_name": "Ana", "content": null})
        );
        assert_eq!(service.rows("comments").len(), 1);
    }

    #[tokio::test]
    async fn test_insert_drops_configured_columns() {
        let service = blog().with_dropped_columns("comments", &["author_name", "content"]);
        let echoed = service
            .insert(
                "comments",
                json!({"post_id": 1, "author_name": "Ana", "content": "Hi"}),
                "id,author_name,content",
            )
            .await
            .unwrap();

        assert_eq!(echoed, json!({"id": 1, "author_name": null, "content": null}));
        assert_eq!(service.rows("comments"), vec![json!({"id": 1, "post_id": 1})]);
    }

    #[tokio::test]
    async fn test_increment_views_procedure() {
        let service = blog().with_increment_views();

        service.rpc("increment_views", json!({"post_id": 2})).await.unwrap();
        service.rpc("increment_views", json!({"post_id": 2})).await.unwrap();

        assert_eq!(service.rows("posts")[1]["views"], 2);
    }

    #[tokio::test]
    async fn test_missing_procedure() {
        let service = blog();
        let err = service.rpc("increment_views", json!({})).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.code(), Some("PGRST202"));
    }

    #[tokio::test]
    async fn test_failures_can_be_injected_and_cleared() {
        let service = blog();

        service.fail("tags");
        assert!(service.select(&Query::from("tags")).await.is_err());
        assert!(service.select(&Query::from("posts")).await.is_ok());

        service.fail_everything();
        assert!(service.count("posts").await.is_err());

        service.recover();
        assert!(service.select(&Query::from("tags")).await.is_ok());
        assert!(service.count("posts").await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let service = blog();
        service.count("posts").await.unwrap();
        service.select(&Query::from("tags")).await.unwrap();
        let _ = service.rpc("nope", json!({})).await;

        assert_eq!(service.calls(), vec!["count posts", "select tags", "rpc nope"]);
    }

    #[tokio::test]
    async fn test_demo_data_joins() {
        let service = MemoryDataService::demo();
        let rows = service
            .select(&Query::from("posts").select("id,post_tags(tag_id,tags(id,name))"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["post_tags"].as_array().map(Vec::len), Some(2));
    }
}
