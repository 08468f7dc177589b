//! PostgREST client
//!
//! `RestDataService` talks to the hosted service's REST layer at
//! `{url}/rest/v1`. Every request carries the access key both as `apikey` and
//! as a bearer token.
//!
//! | Operation     | Request                                                        |
//! |---------------|----------------------------------------------------------------|
//! | select        | `GET /{table}?select=..&col=eq.v&limit=n`                      |
//! | select_single | same, `Accept: application/vnd.pgrst.object+json`              |
//! | count         | `HEAD /{table}?select=*`, `Prefer: count=exact`, `Content-Range` |
//! | insert        | `POST /{table}?select=..`, `Prefer: return=representation`     |
//! | rpc           | `POST /rpc/{function}`                                         |

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::{DataError, DataService, DynDataService, Query};
use crate::config::ServiceConfig;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Data service backed by a PostgREST endpoint.
pub struct RestDataService {
    client: reqwest::Client,
    base_url: String,
}

impl RestDataService {
    /// Build a client for the configured project.
    pub fn new(config: &ServiceConfig) -> Result<Self, DataError> {
        let key = HeaderValue::from_str(config.key.trim())
            .map_err(|_| DataError::Config("access key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.key.trim()))
            .map_err(|_| DataError::Config("access key is not a valid header value".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("postline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", config.url.trim().trim_end_matches('/')),
        })
    }

    /// Create a shared handle for use with dependency injection
    pub fn boxed(config: &ServiceConfig) -> Result<DynDataService, DataError> {
        Ok(Arc::new(Self::new(config)?))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }
}

#[async_trait]
impl DataService for RestDataService {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        tracing::debug!("GET {} select={}", query.table(), query.columns());
        let response = self
            .client
            .get(self.table_url(query.table()))
            .query(&query.to_params())
            .send()
            .await?;

        match read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(DataError::InvalidResponse(format!(
                "expected an array of rows from '{}', got {}",
                query.table(),
                json_kind(&other)
            ))),
        }
    }

    async fn select_single(&self, query: &Query) -> Result<Value, DataError> {
        tracing::debug!("GET {} (single) select={}", query.table(), query.columns());
        let response = self
            .client
            .get(self.table_url(query.table()))
            .query(&query.to_params())
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        expect_object(read_json(response).await?, query.table())
    }

    async fn count(&self, table: &str) -> Result<u64, DataError> {
        tracing::debug!("HEAD {} count=exact", table);
        let response = self
            .client
            .head(self.table_url(table))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // HEAD responses carry no error body
            return Err(api_error(status, &[]));
        }

        let range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DataError::InvalidResponse("missing Content-Range header".to_string()))?;

        parse_content_range_total(range).ok_or_else(|| {
            DataError::InvalidResponse(format!("unreadable Content-Range header '{}'", range))
        })
    }

    async fn insert(&self, table: &str, row: Value, returning: &str) -> Result<Value, DataError> {
        tracing::debug!("POST {} returning={}", table, returning);
        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("select", returning)])
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(&row)
            .send()
            .await?;

        expect_object(read_json(response).await?, table)
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, DataError> {
        tracing::debug!("POST rpc/{}", function);
        let response = self
            .client
            .post(format!("{}/rpc/{}", self.base_url, function))
            .json(&args)
            .send()
            .await?;

        read_json(response).await
    }
}

/// Error body PostgREST sends with non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    hint: Option<Value>,
}

async fn read_json(response: Response) -> Result<Value, DataError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}

fn api_error(status: StatusCode, body: &[u8]) -> DataError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    DataError::Api {
        status: status.as_u16(),
        code: parsed.code,
        message,
        details: parsed.details.and_then(text_of),
        hint: parsed.hint.and_then(text_of),
    }
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn expect_object(value: Value, table: &str) -> Result<Value, DataError> {
    match value {
        Value::Object(_) => Ok(value),
        other => Err(DataError::InvalidResponse(format!(
            "expected a single row from '{}', got {}",
            table,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Total row count from a `Content-Range` value such as `0-24/3573` or `*/0`.
fn parse_content_range_total(range: &str) -> Option<u64> {
    let (_, total) = range.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
