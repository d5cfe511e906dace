//! Error handling module for the admin resource manager.
//!
//! Every failure an operation can hit is normalized into a single
//! [`ResourceError`] value carrying a kind and a human-readable message.
//! Errors are returned, never raised past a component boundary.

use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SHAPE_ERROR: &str = "SHAPE_ERROR";
    pub const BUSY: &str = "BUSY";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// A single field-level violation found while validating a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Classification of a [`ResourceError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request could not reach the server (offline, timeout, refused)
    Network,
    /// Non-2xx response
    Server { status: u16 },
    /// Local pre-submit violations; never reaches the network
    Validation { fields: Vec<FieldError> },
    /// 2xx response missing an expected field or array
    Shape,
    /// The same mutation is already in flight
    Busy,
    /// Invalid configuration
    Config,
}

/// The single error type surfaced by stores, forms and presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ResourceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
        }
    }

    /// Build a server error, preferring the server-supplied message.
    pub fn server(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| generic_message(status).to_string());
        Self {
            kind: ErrorKind::Server { status },
            message,
        }
    }

    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = match fields.len() {
            1 => fields[0].message.clone(),
            n => format!("{} fields need attention", n),
        };
        Self {
            kind: ErrorKind::Validation { fields },
            message,
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Shape,
            message: message.into(),
        }
    }

    pub fn busy(operation: &str) -> Self {
        Self {
            kind: ErrorKind::Busy,
            message: format!("{} is already in progress", operation),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config,
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Network => codes::NETWORK_ERROR,
            ErrorKind::Server { .. } => codes::SERVER_ERROR,
            ErrorKind::Validation { .. } => codes::VALIDATION_ERROR,
            ErrorKind::Shape => codes::SHAPE_ERROR,
            ErrorKind::Busy => codes::BUSY,
            ErrorKind::Config => codes::CONFIG_ERROR,
        }
    }

    /// Get the HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Server { status } => Some(status),
            _ => None,
        }
    }

    /// Field violations for validation errors, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match &self.kind {
            ErrorKind::Validation { fields } => fields,
            _ => &[],
        }
    }

    /// Whether the error should be shown to the user as a page notice.
    ///
    /// Validation errors stay inside the form that produced them.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self.kind, ErrorKind::Validation { .. })
    }
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message)
    }
}

impl std::error::Error for ResourceError {}

impl From<reqwest::Error> for ResourceError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("HTTP transport error: {:?}", err);
        if err.is_decode() {
            return ResourceError::shape(format!("Malformed response body: {}", err));
        }
        if let Some(status) = err.status() {
            return ResourceError::server(status.as_u16(), None);
        }
        if err.is_timeout() {
            return ResourceError::network("The server took too long to respond");
        }
        ResourceError::network(format!("Could not reach the server: {}", err))
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ResourceError::shape(format!("JSON error: {}", err))
    }
}

/// Fallback message used when the server supplies none.
pub fn generic_message(status: u16) -> &'static str {
    match status {
        400 => "The request was rejected by the server",
        401 => "Your session has expired, please sign in again",
        403 => "You are not allowed to perform this action",
        404 => "The requested item no longer exists",
        409 => "The item was changed by someone else",
        413 => "The uploaded file is too large",
        422 => "The server could not process the submitted data",
        429 => "Too many requests, please try again shortly",
        500..=599 => "The server encountered an error, please try again",
        _ => "Something went wrong, please try again",
    }
}
