//! Error types for OVC operations.
//!
//! Every layer of the client returns [`Error`]. Transport failures are surfaced
//! verbatim, structured API failures are decoded from the controller's error
//! envelope, and the remaining variants are synthesized locally (lookups that
//! find nothing, tasks that finish without a result, caller misuse).

use crate::id::TaskId;
use serde::Deserialize;
use thiserror::Error;

/// Literal `error` value the controller returns for an expired or revoked token.
pub const INVALID_TOKEN: &str = "invalid_token";

/// Main error type for OVC operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The controller could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// HTTP request failed below the API layer
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// HTTP request exceeded its time budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Task was accepted but still running when the poll bound ran out
    #[error("Task {task_id} still in progress after {elapsed}")]
    TaskTimeout {
        /// Task that was being awaited
        task_id: TaskId,
        /// Budget that ran out, e.g. `3 status checks` or `30000ms`
        elapsed: String,
    },

    /// Task wait was cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Structured error envelope returned by the controller
    #[error("Error: Status code:{status} - {message}")]
    Api {
        /// Status as reported by the envelope (falls back to the HTTP status)
        status: String,
        /// Short machine-readable error token, e.g. `invalid_token`
        error: Option<String>,
        /// Human-readable message
        message: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Lookup returned no matching resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// A task reached a terminal state without affecting any resource
    #[error("{operation} was not successful. Error code:{error_code}")]
    OperationFailed {
        /// Operation label, e.g. `Clone`
        operation: String,
        /// Task error code (0 when the controller did not report one)
        error_code: i64,
    },

    /// Invalid request arguments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for OVC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error envelope returned by the controller for non-success statuses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    /// Server-side exception class
    #[serde(default)]
    pub exception: Option<String>,
    /// Request path the error refers to
    #[serde(default)]
    pub path: Option<String>,
    /// Short error token
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Status, sent as either a number or a string depending on the endpoint
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Convert the envelope into an [`Error::Api`], using `http_status` when the
    /// envelope carries no status of its own.
    #[must_use]
    pub fn into_error(self, http_status: u16) -> Error {
        let status = match self.status {
            Some(serde_json::Value::String(status)) if !status.is_empty() => status,
            Some(serde_json::Value::Number(status)) => status.to_string(),
            _ => http_status.to_string(),
        };

        Error::Api {
            status,
            error: self.error,
            message: self.message.unwrap_or_default(),
        }
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::TaskTimeout { .. } => "TASK_TIMEOUT",
            Self::Cancelled(_) => "CANCELLED",
            Self::Api { .. } => "API_ERROR",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::OperationFailed { .. } => "OPERATION_FAILED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true if this is the controller's expired-token signal.
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Api { error: Some(error), .. } if error == INVALID_TOKEN)
    }

    /// Returns true for failures that happened before a response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::HttpError(_) | Self::Timeout(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
