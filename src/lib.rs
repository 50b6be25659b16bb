//! # batch-fetch
//!
//! Concurrent batch fetching with a fixed cap on in-flight requests.
//!
//! Give it a collection of items. Each item is resolved to a locator and
//! requested over one shared transport session. The response goes to a
//! success or failure handler depending on its status. The crate owns only
//! the concurrency core:
//! - **Admission** - at most `max_concurrent_requests` requests in flight
//! - **Dispatch** - 4xx/5xx responses go to the failure handler, everything
//!   else to the success handler, exactly once per item
//! - **Lifecycle** - one session per run, closed after the last item finishes
//!
//! Transport options, URL construction and what handlers do with responses
//! are supplied by the caller.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_fetch::error::HandlerError;
//! use batch_fetch::handler::ResponseHandler;
//! use batch_fetch::{FetchConfig, HttpTransport, Orchestrator, TransportConfig};
//!
//! struct Report;
//!
//! #[async_trait::async_trait]
//! impl ResponseHandler<String, reqwest::Response> for Report {
//!     async fn handle(&self, response: reqwest::Response, item: &String) -> Result<(), HandlerError> {
//!         println!("{item} -> {}", response.status());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::new(
//!         FetchConfig::default(),
//!         HttpTransport::new(),
//!         Report,
//!         Report,
//!     )?;
//!
//!     let urls = vec!["https://example.com/".to_string()];
//!     orchestrator.orchestrate(urls, &TransportConfig::default()).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Admission control for in-flight requests
pub mod gate;
/// Outcome handlers
pub mod handler;
/// Item-to-locator resolution
pub mod locator;
/// Batch orchestration
pub mod orchestrator;
/// Transport abstraction and the HTTP implementation
pub mod transport;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{FetchConfig, SpawnStrategy, TransportConfig};
pub use error::{Error, HandlerError, Result, TransportFailure};
pub use gate::{AdmissionGate, AdmissionSlot};
pub use handler::{Discard, ResponseHandler};
pub use locator::{BaseUrl, Identity, LocatorResolver};
pub use orchestrator::Orchestrator;
pub use transport::{HttpTransport, Transport};
pub use types::{Outcome, RunSummary, Stage};
