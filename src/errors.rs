//! Typed errors for the task-board client.
//!
//! Everything that can go wrong against the backend collapses into one
//! closed enum, `ApiError`, decoded at the network boundary. Local
//! pre-flight validation produces the same `Validation` variant the server
//! uses for 422 responses, so callers handle both identically.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected locally before any request, or by the server with 422.
    /// `field` names the originating form field when known.
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// 401: invalid credentials or an expired session.
    #[error("{message}")]
    Auth { message: String },

    /// 409: the request conflicts with existing state, e.g. a duplicate
    /// email on registration.
    #[error("{message}")]
    Conflict { message: String },

    /// 404: the entity no longer exists on the server.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other non-success status, 5xx included.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// No usable response at all: connect failure, timeout, or a body
    /// that could not be decoded.
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn validation(field: Option<&str>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    /// Human-readable message regardless of variant.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Auth { message }
            | Self::Conflict { message }
            | Self::NotFound { message } => message.clone(),
            Self::Server { status, message } => format!("HTTP {}: {}", status, message),
            Self::Network { source } => source.to_string(),
        }
    }

    /// Form field this error should be attached to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Decode a non-success response into the matching variant.
    ///
    /// The backend answers with `{ message, errors?: [{field, message}] }`,
    /// an `{ error: { message } }` wrapper, or a bare array of field
    /// errors, depending on the failing layer. `extract_error_message`
    /// handles all three.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message = extract_error_message(status, parsed.as_ref());
        match status {
            401 => Self::Auth { message },
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            422 => Self::Validation {
                field: extract_error_field(parsed.as_ref()),
                message,
            },
            _ => Self::Server { status, message },
        }
    }
}

/// Message extraction precedence for error bodies: first field error,
/// then `error.message`, then top-level `message`, then a generic
/// status line.
pub fn extract_error_message(status: u16, body: Option<&serde_json::Value>) -> String {
    if let Some(value) = body {
        if let Some(msg) = first_field_error(value).and_then(field_error_message) {
            return msg;
        }
        if let Some(msg) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    format!("HTTP {}: Unknown error", status)
}

/// Field named by the first entry of an `errors` array (or a bare array
/// of field errors), if the body carries one.
pub fn extract_error_field(body: Option<&serde_json::Value>) -> Option<String> {
    first_field_error(body?)?
        .get("field")
        .and_then(|f| f.as_str())
        .map(str::to_string)
}

fn first_field_error(value: &serde_json::Value) -> Option<&serde_json::Value> {
    value
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|a| a.first())
        .or_else(|| value.as_array().and_then(|a| a.first()))
}

fn field_error_message(entry: &serde_json::Value) -> Option<String> {
    entry
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
