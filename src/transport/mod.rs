//! Transport abstraction
//!
//! The orchestrator needs only three things from the network layer: open a
//! session, issue a request on it, and read the status of a response. The
//! [`Transport`] trait captures exactly that, so the HTTP stack can be
//! swapped (or faked in tests) without touching scheduling or dispatch.

mod http;

pub use http::HttpTransport;

use crate::config::TransportConfig;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Request-issuing capability used by the orchestrator
///
/// One session is opened per run and shared by every item task in that run,
/// so `Session` must be safe for concurrent use.
///
/// Implementations report failures to obtain a response (connect, DNS,
/// timeout, unusable locator) as errors. Those never reach a handler.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Shared per-run connection state (pool, cookies, default headers)
    type Session: Send + Sync + 'static;

    /// A completed response handed to exactly one handler
    type Response: Send + 'static;

    /// Open the session for one run
    async fn open(&self, config: &TransportConfig) -> crate::Result<Self::Session>;

    /// Issue a request for `locator`
    async fn request(&self, session: &Self::Session, locator: &str)
    -> crate::Result<Self::Response>;

    /// Status used to classify the response
    fn status(&self, response: &Self::Response) -> StatusCode;

    /// Release the session once every item task of the run has finished
    ///
    /// The default relies on `Drop`.
    async fn close(&self, _session: &Self::Session) -> crate::Result<()> {
        Ok(())
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
