//! Domain error types
//!
//! This module defines the error hierarchy for redcap-export. All errors are
//! domain-specific and don't expose third-party HTTP client types. The split
//! mirrors the stages of an export: validation failures happen before any
//! network I/O, transport failures during it, and rejection/server failures
//! after a response arrives.

use thiserror::Error;

/// Main redcap-export error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum RedcapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parameter validation errors (caught before any network I/O)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export request/response errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// A rejected export parameter
///
/// Construction of a [`ParameterSet`](crate::domain::ParameterSet) stops at
/// the first violation so error messages are deterministic and reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid parameter '{field}': {reason}")]
pub struct ValidationError {
    /// The wire-form key of the offending parameter (e.g. `type`, `forms`)
    pub field: String,

    /// Human-readable description of the violation
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for the given wire-form field
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Transport-level failures
///
/// Errors raised by the injected HTTP capability before any HTTP status is
/// available. These don't expose the underlying client library's types.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to reach the API endpoint
    #[error("Failed to connect to API endpoint: {0}")]
    ConnectionFailed(String),

    /// TLS handshake or certificate verification failed
    #[error("TLS failure: {0}")]
    Tls(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Automatic redirect following exceeded the configured cap
    #[error("Too many redirects")]
    TooManyRedirects,

    /// The caller cancelled the in-flight request
    #[error("Request cancelled")]
    Cancelled,

    /// Any other transport failure
    #[error("Transport failure: {0}")]
    Other(String),
}

/// Outcome classification for a failed export attempt
///
/// Every failure path of [`ExportClient::execute`](crate::client::ExportClient::execute)
/// maps to exactly one variant, so callers can decide retry policy per kind:
/// a [`ServerFailure`](ExportError::ServerFailure) is safe to retry with
/// backoff, a [`ClientRejected`](ExportError::ClientRejected) is not.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The API rejected the request (4xx); the body carries the server's
    /// human-readable message, passed through unmodified
    #[error("API rejected the request (status {status}): {body}")]
    ClientRejected { status: u16, body: String },

    /// The API failed to serve the request (5xx)
    #[error("API server failure (status {status})")]
    ServerFailure { status: u16 },

    /// The request never produced an HTTP status
    #[error("Transport failure: {0}")]
    Transport(#[source] TransportError),

    /// Redirect following exceeded the configured cap
    #[error("Redirect limit of {max_redirects} exceeded")]
    RedirectLimit { max_redirects: usize },

    /// The caller cancelled the request while it was in flight
    #[error("Export cancelled")]
    Cancelled,
}

impl ExportError {
    /// Whether a retry with backoff is a reasonable caller response
    ///
    /// Server failures and transient transport failures are retryable;
    /// rejections, redirect misconfiguration, and cancellation are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExportError::ServerFailure { .. } => true,
            ExportError::Transport(cause) => !matches!(cause, TransportError::Cancelled),
            ExportError::ClientRejected { .. }
            | ExportError::RedirectLimit { .. }
            | ExportError::Cancelled => false,
        }
    }
}

impl From<TransportError> for ExportError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => ExportError::Cancelled,
            other => ExportError::Transport(other),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for RedcapError {
    fn from(err: std::io::Error) -> Self {
        RedcapError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RedcapError {
    fn from(err: serde_json::Error) -> Self {
        RedcapError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RedcapError {
    fn from(err: toml::de::Error) -> Self {
        RedcapError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("type", "required when content is 'record'");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'type': required when content is 'record'"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err = ValidationError::new("token", "must not be empty");
        let top: RedcapError = err.into();
        assert!(matches!(top, RedcapError::Validation(_)));
    }

    #[test]
    fn test_client_rejected_passes_body_through() {
        let err = ExportError::ClientRejected {
            status: 403,
            body: "Error: invalid token".to_string(),
        };
        assert!(err.to_string().contains("Error: invalid token"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_cancelled_transport_maps_to_cancelled_export() {
        let err: ExportError = TransportError::Cancelled.into();
        assert!(matches!(err, ExportError::Cancelled));
    }

    #[test]
    fn test_timeout_maps_to_transport_failure() {
        let err: ExportError = TransportError::Timeout("10s elapsed".to_string()).into();
        assert!(matches!(
            err,
            ExportError::Transport(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn test_retryability_classification() {
        assert!(ExportError::ServerFailure { status: 503 }.is_retryable());
        assert!(ExportError::Transport(TransportError::Timeout("t".into())).is_retryable());
        assert!(!ExportError::ClientRejected {
            status: 403,
            body: String::new()
        }
        .is_retryable());
        assert!(!ExportError::Cancelled.is_retryable());
        assert!(!ExportError::RedirectLimit { max_redirects: 10 }.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RedcapError = io_err.into();
        assert!(matches!(err, RedcapError::Io(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = RedcapError::Configuration("test".to_string());
        let _: &dyn std::error::Error = &err;
        let err = ExportError::Cancelled;
        let _: &dyn std::error::Error = &err;
    }
}
