//! Error types for batch-fetch
//!
//! Only failures that happen *outside* the success/failure handler contract
//! are errors here. A response with a 4xx/5xx status is not an error: it is
//! routed to the failure handler. What remains:
//! - Configuration errors, raised before any network activity
//! - Transport errors (connect, DNS, timeout, invalid locator)
//! - Errors returned by a handler
//! - Cancellation and panicked item tasks

use crate::types::Outcome;
use thiserror::Error;

/// Result type alias for batch-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by [`ResponseHandler`](crate::handler::ResponseHandler) implementations
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Broad category of a transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connection could not be established (refused, DNS failure, unreachable)
    Connect,
    /// Request did not complete within the configured timeout
    Timeout,
    /// Any other request failure (malformed response, redirect loop, ...)
    Other,
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportFailure::Connect => "connection failed",
            TransportFailure::Timeout => "timed out",
            TransportFailure::Other => "request failed",
        };
        f.write_str(s)
    }
}

/// Main error type for batch-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_requests")
        key: Option<String>,
    },

    /// A resolved locator could not be used to issue a request
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The locator produced by the resolver
        locator: String,
        /// Why it was rejected
        reason: String,
    },

    /// The request could not be completed, so no response exists to classify
    #[error("{kind} for '{locator}': {source}")]
    Transport {
        /// The locator that was being requested
        locator: String,
        /// Broad category of the failure
        kind: TransportFailure,
        /// Underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Building the HTTP session failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success or failure handler returned an error
    #[error("{outcome} handler failed for '{locator}': {source}")]
    Handler {
        /// The locator of the item being handled
        locator: String,
        /// Which handler was running
        outcome: Outcome,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },

    /// The run was cancelled before this item finished
    #[error("cancelled")]
    Cancelled,

    /// An item task panicked
    #[error("item task panicked: {0}")]
    TaskPanicked(String),

    /// More than one item failed during a run
    #[error("{failed} of {total} items failed; first error: {}", first_message(.errors))]
    Batch {
        /// Number of failed items
        failed: usize,
        /// Number of items in the run
        total: usize,
        /// Every item error, in input order
        errors: Vec<Error>,
    },
}

fn first_message(errors: &[Error]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a transport error for the given locator
    pub fn transport(
        locator: impl Into<String>,
        kind: TransportFailure,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            locator: locator.into(),
            kind,
            source: source.into(),
        }
    }

    /// Whether this error happened before a classifiable response existed
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::InvalidLocator { .. } | Error::Network(_)
        )
    }

    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidLocator { .. } => "invalid_locator",
            Error::Transport { kind, .. } => match kind {
                TransportFailure::Connect => "connect_error",
                TransportFailure::Timeout => "timeout",
                TransportFailure::Other => "transport_error",
            },
            Error::Network(_) => "network_error",
            Error::Handler { .. } => "handler_error",
            Error::Cancelled => "cancelled",
            Error::TaskPanicked(_) => "task_panicked",
            Error::Batch { .. } => "batch_failed",
        }
    }

    /// Collapse per-item errors into the error returned from a run
    ///
    /// A single failure is returned unchanged; several become [`Error::Batch`].
    /// Returns `None` when there were no failures.
    pub(crate) fn aggregate(mut errors: Vec<Error>, total: usize) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            failed => Some(Error::Batch {
                failed,
                total,
                errors,
            }),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Error::Cancelled
        } else {
            Error::TaskPanicked(err.to_string())
        }
    }
}
