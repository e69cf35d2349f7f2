//! Client error types

use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => AppError::timeout(e.to_string()),
            ClientError::Http(e) => AppError::network(e.to_string()),
            ClientError::Unauthorized => AppError::not_authenticated(),
            ClientError::Forbidden(msg) => AppError::permission_denied(msg),
            ClientError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            ClientError::Validation(msg) => AppError::validation(msg),
            ClientError::Internal(msg) => AppError::internal(msg),
            ClientError::InvalidResponse(msg) => {
                AppError::with_message(ErrorCode::InvalidFormat, msg)
            }
            ClientError::Serialization(e) => AppError::with_message(ErrorCode::InvalidFormat, e.to_string()),
        }
    }
}

/// Best human-readable message from an error body
///
/// Precedence: `teacher_id[0]` (top level or under `errors`), then `detail`,
/// then every field error joined with `", "`. Non-JSON bodies yield `None`.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let teacher_error = value
        .pointer("/teacher_id/0")
        .or_else(|| value.pointer("/errors/teacher_id/0"))
        .and_then(Value::as_str);
    if let Some(msg) = teacher_error {
        return Some(msg.to_string());
    }

    if let Some(detail) = value.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }

    let fields = value.get("errors").unwrap_or(&value);
    let mut messages = Vec::new();
    collect_messages(fields, &mut messages);
    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_messages(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_messages(v, out)),
        _ => {}
    }
}
