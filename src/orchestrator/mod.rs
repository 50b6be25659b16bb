//! Batch fetch orchestration
//!
//! An [`Orchestrator`] runs one batch at a time:
//! 1. Build a fresh [`AdmissionGate`] from the configured cap
//! 2. Open one transport session shared by the whole run
//! 3. Start a pipeline per item (see [`SpawnStrategy`])
//! 4. Wait for every pipeline, then close the session
//!
//! Each pipeline holds an admission slot only for the network call. The
//! response is classified and handed to the success or failure handler
//! after the slot is released.

mod pipeline;


use crate::config::{FetchConfig, SpawnStrategy, TransportConfig};
use crate::error::{Error, Result};
use crate::gate::AdmissionGate;
use crate::handler::ResponseHandler;
use crate::locator::{Identity, LocatorResolver};
use crate::transport::Transport;
use crate::types::RunSummary;
use pipeline::RunContext;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Concurrent batch fetcher with bounded in-flight requests
///
/// Generic over the transport `T`, the item type `I`, and the locator
/// resolver `R` (the item itself by default, see [`Identity`]).
///
/// # Examples
///
/// ```no_run
/// use batch_fetch::handler::{Discard, ResponseHandler};
/// use batch_fetch::error::HandlerError;
/// use batch_fetch::{FetchConfig, HttpTransport, Orchestrator, TransportConfig};
///
/// struct SaveBody;
///
/// #[async_trait::async_trait]
/// impl ResponseHandler<String, reqwest::Response> for SaveBody {
///     async fn handle(&self, response: reqwest::Response, item: &String) -> Result<(), HandlerError> {
///         let bytes = response.bytes().await?;
///         println!("{item}: {} bytes", bytes.len());
///         Ok(())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Orchestrator::new(
///     FetchConfig::with_max_concurrent_requests(4),
///     HttpTransport::new(),
///     SaveBody,
///     Discard,
/// )?;
///
/// let urls = vec![
///     "https://example.com/a".to_string(),
///     "https://example.com/b".to_string(),
/// ];
/// let summary = orchestrator.orchestrate(urls, &TransportConfig::default()).await?;
/// println!("{} ok, {} failed", summary.succeeded, summary.failed);
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<T, I, R = Identity>
where
    T: Transport,
    I: Send + Sync + 'static,
{
    config: FetchConfig,
    transport: Arc<T>,
    resolver: Arc<R>,
    on_success: Arc<dyn ResponseHandler<I, T::Response>>,
    on_failure: Arc<dyn ResponseHandler<I, T::Response>>,
    shutdown: CancellationToken,
}

impl<T, I> Orchestrator<T, I, Identity>
where
    T: Transport,
    I: Send + Sync + 'static,
{
    /// Create an orchestrator that requests each item as its own locator
    ///
    /// Use [`with_resolver`](Self::with_resolver) when items are not locators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid (e.g. a zero cap).
    pub fn new<S, F>(config: FetchConfig, transport: T, on_success: S, on_failure: F) -> Result<Self>
    where
        S: ResponseHandler<I, T::Response> + 'static,
        F: ResponseHandler<I, T::Response> + 'static,
    {
        config.validate()?;

        Ok(Self {
            config,
            transport: Arc::new(transport),
            resolver: Arc::new(Identity),
            on_success: Arc::new(on_success),
            on_failure: Arc::new(on_failure),
            shutdown: CancellationToken::new(),
        })
    }
}

impl<T, I, R> Orchestrator<T, I, R>
where
    T: Transport,
    I: Send + Sync + 'static,
{
    /// Replace the locator resolver
    pub fn with_resolver<R2>(self, resolver: R2) -> Orchestrator<T, I, R2>
    where
        R2: LocatorResolver<I> + 'static,
    {
        Orchestrator {
            config: self.config,
            transport: self.transport,
            resolver: Arc::new(resolver),
            on_success: self.on_success,
            on_failure: self.on_failure,
            shutdown: self.shutdown,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Maximum number of requests in flight at once
    pub fn max_concurrent_requests(&self) -> usize {
        self.config.max_concurrent_requests
    }

    /// Change the cap for subsequent runs
    ///
    /// Requires exclusive access, so it cannot race with an active run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero cap; the previous value is kept.
    pub fn set_max_concurrent_requests(&mut self, max_concurrent_requests: usize) -> Result<()> {
        let candidate = FetchConfig {
            max_concurrent_requests,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// Change the scheduling strategy for subsequent runs
    pub fn set_strategy(&mut self, strategy: SpawnStrategy) {
        self.config.strategy = strategy;
    }

    /// Token that cancels the active run and every later run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel the active run (if any) and refuse new ones
    pub fn cancel(&self) {
        tracing::info!("cancelling orchestrator");
        self.shutdown.cancel();
    }
}

impl<T, I, R> Orchestrator<T, I, R>
where
    T: Transport,
    I: Send + Sync + 'static,
    R: LocatorResolver<I> + 'static,
{
    /// Fetch every item and dispatch each response to a handler
    ///
    /// Completes once every item has either reached a handler or failed.
    /// Items are independent: a failing item does not stop the others. If
    /// any item fails outside the handler contract (transport error, handler
    /// error, panic, cancellation), that error is returned after all items
    /// finish; several failures are returned together as [`Error::Batch`].
    ///
    /// With [`SpawnStrategy::Eager`] a task exists for every item for the
    /// whole run, so memory grows with the number of items.
    ///
    /// Dropping the returned future cancels all in-flight items.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] before any network activity if the cap is invalid
    ///   or the transport rejects `transport_config`
    /// - [`Error::Cancelled`] if the orchestrator was already cancelled
    /// - Per-item failures as described above
    pub async fn orchestrate<It>(
        &self,
        items: It,
        transport_config: &TransportConfig,
    ) -> Result<RunSummary>
    where
        It: IntoIterator<Item = I>,
    {
        let started = Instant::now();
        let config = self.config.clone();
        let gate = AdmissionGate::new(config.max_concurrent_requests)?;

        let run_token = self.shutdown.child_token();
        if run_token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let _cancel_on_drop = run_token.clone().drop_guard();

        let session = self.transport.open(transport_config).await?;
        tracing::info!(
            transport = self.transport.name(),
            max_concurrent_requests = config.max_concurrent_requests,
            strategy = ?config.strategy,
            "transport session opened"
        );

        let ctx = Arc::new(RunContext {
            transport: Arc::clone(&self.transport),
            session,
            gate,
            resolver: Arc::clone(&self.resolver),
            on_success: Arc::clone(&self.on_success),
            on_failure: Arc::clone(&self.on_failure),
            cancel: run_token,
        });

        let results = match config.strategy {
            SpawnStrategy::Eager => pipeline::run_eager(&ctx, items).await,
            SpawnStrategy::Bounded => {
                pipeline::run_bounded(&ctx, items, config.max_concurrent_requests).await
            }
        };

        let close_result = self.transport.close(&ctx.session).await;
        if let Err(e) = &close_result {
            tracing::warn!(error = %e, "failed to close transport session");
        }

        let total = results.len();
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };
        let mut errors = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    tracing::warn!(item = index, code = e.error_code(), error = %e, "item failed");
                    errors.push(e);
                }
            }
        }
        summary.elapsed = started.elapsed();

        tracing::info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            errors = errors.len(),
            elapsed_ms = summary.elapsed_ms(),
            "batch finished"
        );

        if let Some(err) = Error::aggregate(errors, total) {
            return Err(err);
        }
        close_result?;
        Ok(summary)
    }
}

impl<T, I, R> std::fmt::Debug for Orchestrator<T, I, R>
where
    T: Transport,
    I: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
