//! Error types for url-multiplexer
//!
//! This module provides the error taxonomy for the service:
//! - Batch validation errors (malformed or out-of-bounds input)
//! - Fetch errors (one per classified upstream failure, plus the batch deadline)
//! - Service-level errors (configuration, I/O, listener failures)
//! - HTTP status code mapping for the response writer

use thiserror::Error;

/// Result type alias for url-multiplexer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for url-multiplexer
///
/// Batch-level failures ([`ValidationError`], [`FetchError`]) display exactly the
/// message that is written to the client, so they are wrapped transparently.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.max_urls")
        key: Option<String>,
    },

    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Incoming batch failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Batch aborted by a fetch failure or the batch deadline
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Errors produced while decoding and bounds-checking an incoming batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Request body is not a `{"urls": [...]}` envelope
    #[error("wrong body format")]
    WrongBodyFormat,

    /// Envelope decoded but carried no URLs
    #[error("array of urls required")]
    UrlsRequired,

    /// More URLs than a single batch may carry
    #[error("the maximum number of URLs allowed is {max}")]
    TooManyUrls {
        /// Configured upper bound on batch size
        max: usize,
    },
}

/// Classified failure of a single fetch, or of the batch as a whole
///
/// The first one observed by the orchestrator aborts the batch and is
/// returned to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport reported a timeout while reaching the target
    #[error("request timeout on \"{url}\"")]
    Timeout {
        /// Target URL
        url: String,
    },

    /// The batch deadline expired before every fetch finished
    #[error("request timeout")]
    DeadlineExceeded,

    /// Any non-timeout transport failure (refused, DNS, bad URL, TLS, ...)
    #[error("failed to get \"{url}\": '{reason}'")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying client error text
        reason: String,
    },

    /// Target answered with an error status
    #[error("failed to get \"{url}\" with status code: {status}")]
    UpstreamStatus {
        /// Target URL
        url: String,
        /// Status returned by the target, passed through to the caller
        status: u16,
    },

    /// Target answered successfully but the body could not be read
    #[error("failed to process response from \"{url}\"")]
    BodyRead {
        /// Target URL
        url: String,
    },

    /// Unexpected internal failure (panicked task, serialization)
    #[error("internal server error")]
    Internal,
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for ValidationError {
    fn status_code(&self) -> u16 {
        400
    }

    fn error_code(&self) -> &str {
        match self {
            ValidationError::WrongBodyFormat => "wrong_body_format",
            ValidationError::UrlsRequired => "urls_required",
            ValidationError::TooManyUrls { .. } => "too_many_urls",
        }
    }
}

impl ToHttpStatus for FetchError {
    fn status_code(&self) -> u16 {
        match self {
            FetchError::Timeout { .. } | FetchError::DeadlineExceeded => 408,
            FetchError::Transport { .. } => 502,
            FetchError::UpstreamStatus { status, .. } => *status,
            FetchError::BodyRead { .. } | FetchError::Internal => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::DeadlineExceeded => "deadline_exceeded",
            FetchError::Transport { .. } => "transport_error",
            FetchError::UpstreamStatus { .. } => "upstream_status",
            FetchError::BodyRead { .. } => "body_read_error",
            FetchError::Internal => "internal_error",
        }
    }
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Validation(e) => e.status_code(),
            Error::Fetch(e) => e.status_code(),

            // Everything else is an operator-side problem
            Error::Config { .. }
            | Error::ConfigParse(_)
            | Error::Io(_)
            | Error::HttpClient(_)
            | Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::ConfigParse(_) => "config_parse_error",
            Error::Validation(e) => e.error_code(),
            Error::Fetch(e) => e.error_code(),
            Error::Io(_) => "io_error",
            Error::HttpClient(_) => "http_client_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
