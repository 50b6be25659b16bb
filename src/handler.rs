//! Outcome handlers
//!
//! A run takes two independently injected handlers: one receives responses
//! classified as [`Outcome::Success`](crate::Outcome::Success), the other
//! responses classified as [`Outcome::Failure`](crate::Outcome::Failure).
//! Each item reaches at most one of them, exactly once.

use crate::error::HandlerError;
use async_trait::async_trait;

/// Receives a completed response together with the item it was requested for
///
/// Handlers for different items may run concurrently and in any order. A
/// handler that accumulates results into shared state must synchronize it
/// itself.
///
/// An error returned here is not caught: it becomes the item's terminal
/// error and is surfaced from [`Orchestrator::orchestrate`](crate::Orchestrator::orchestrate).
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use batch_fetch::error::HandlerError;
/// use batch_fetch::handler::ResponseHandler;
///
/// struct PrintBody;
///
/// #[async_trait]
/// impl ResponseHandler<String, reqwest::Response> for PrintBody {
///     async fn handle(&self, response: reqwest::Response, item: &String) -> Result<(), HandlerError> {
///         let body = response.text().await?;
///         println!("{item}: {} bytes", body.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ResponseHandler<I, R>: Send + Sync
where
    I: Sync,
    R: Send + 'static,
{
    /// Handle one response
    async fn handle(&self, response: R, item: &I) -> Result<(), HandlerError>;
}

/// Handler that drops the response without reading it
///
/// Useful when only one of the two outcomes matters to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

#[async_trait]
impl<I, R> ResponseHandler<I, R> for Discard
where
    I: Sync,
    R: Send + 'static,
{
    async fn handle(&self, _response: R, _item: &I) -> Result<(), HandlerError> {
        Ok(())
    }
}
