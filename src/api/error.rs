//! API error envelope
//!
//! Every failed request answers `{ "error": { "code", "message", "details"? } }`.
//! Errors from the data service become `UPSTREAM_ERROR` (502) and carry the
//! upstream status and code in `details`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::db::DataError;

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        let mut details = Map::new();
        if let Some(status) = err.status() {
            details.insert("status".to_string(), json!(status));
        }
        if let Some(code) = err.code() {
            details.insert("code".to_string(), json!(code));
        }
        if let DataError::Api {
            details: Some(upstream),
            ..
        } = &err
        {
            details.insert("details".to_string(), json!(upstream));
        }

        let message = err.to_string();
        if details.is_empty() {
            Self::new("UPSTREAM_ERROR", message)
        } else {
            Self::with_details("UPSTREAM_ERROR", message, Value::Object(details))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UPSTREAM_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}
