//! Per-item pipeline and the two scheduling strategies that drive it

use crate::error::{Error, Result};
use crate::gate::AdmissionGate;
use crate::handler::ResponseHandler;
use crate::locator::LocatorResolver;
use crate::transport::Transport;
use crate::types::{Outcome, Stage};
use futures::{FutureExt, StreamExt, stream};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an item pipeline shares with the rest of its run
pub(crate) struct RunContext<T, I, R>
where
    T: Transport,
    I: Send + Sync + 'static,
{
    pub(crate) transport: Arc<T>,
    pub(crate) session: T::Session,
    pub(crate) gate: AdmissionGate,
    pub(crate) resolver: Arc<R>,
    pub(crate) on_success: Arc<dyn ResponseHandler<I, T::Response>>,
    pub(crate) on_failure: Arc<dyn ResponseHandler<I, T::Response>>,
    pub(crate) cancel: CancellationToken,
}

/// Spawn a task for every item immediately and wait for all of them
///
/// Results are returned in input order.
pub(crate) async fn run_eager<T, I, R, It>(
    ctx: &Arc<RunContext<T, I, R>>,
    items: It,
) -> Vec<Result<Outcome>>
where
    T: Transport,
    I: Send + Sync + 'static,
    R: LocatorResolver<I> + 'static,
    It: IntoIterator<Item = I>,
{
    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move { fetch_one(&ctx, index, item).await })
        })
        .collect();

    tracing::debug!(tasks = handles.len(), "spawned item tasks");

    futures::future::join_all(handles)
        .await
        .into_iter()
        .map(flatten_join)
        .collect()
}

/// Keep at most `limit` item tasks alive, starting the next as one finishes
///
/// Results are returned in input order.
pub(crate) async fn run_bounded<T, I, R, It>(
    ctx: &Arc<RunContext<T, I, R>>,
    items: It,
    limit: usize,
) -> Vec<Result<Outcome>>
where
    T: Transport,
    I: Send + Sync + 'static,
    R: LocatorResolver<I> + 'static,
    It: IntoIterator<Item = I>,
{
    let mut results: Vec<(usize, Result<Outcome>)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move { fetch_one(&ctx, index, item).await })
                .map(move |joined| (index, flatten_join(joined)))
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    results.sort_unstable_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

fn flatten_join(
    joined: std::result::Result<Result<Outcome>, tokio::task::JoinError>,
) -> Result<Outcome> {
    joined.map_err(Error::from).and_then(|result| result)
}

/// Run one item to completion, or stop early if the run is cancelled
async fn fetch_one<T, I, R>(ctx: &RunContext<T, I, R>, index: usize, item: I) -> Result<Outcome>
where
    T: Transport,
    I: Send + Sync + 'static,
    R: LocatorResolver<I> + 'static,
{
    tokio::select! {
        _ = ctx.cancel.cancelled() => {
            tracing::debug!(item = index, "item cancelled");
            Err(Error::Cancelled)
        }
        result = process(ctx, index, &item) => result,
    }
}

async fn process<T, I, R>(ctx: &RunContext<T, I, R>, index: usize, item: &I) -> Result<Outcome>
where
    T: Transport,
    I: Send + Sync + 'static,
    R: LocatorResolver<I> + 'static,
{
    tracing::trace!(item = index, stage = Stage::Pending.as_str(), "waiting for admission");
    let slot = ctx.gate.acquire().await?;

    let locator = ctx.resolver.resolve(item);
    tracing::debug!(
        item = index,
        locator = %locator,
        stage = Stage::Admitted.as_str(),
        in_flight = ctx.gate.held(),
        "requesting"
    );

    // The slot covers the network call only; handlers run outside the gate.
    let response = ctx.transport.request(&ctx.session, &locator).await;
    drop(slot);

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(
                item = index,
                locator = %locator,
                stage = Stage::Failed.as_str(),
                error = %e,
                "request failed"
            );
            return Err(e);
        }
    };

    tracing::trace!(item = index, stage = Stage::Requested.as_str(), "slot released");

    let status = ctx.transport.status(&response);
    let outcome = Outcome::classify(status);
    tracing::debug!(
        item = index,
        locator = %locator,
        status = status.as_u16(),
        outcome = %outcome,
        stage = Stage::Classified.as_str(),
        "response received"
    );

    let handler = match outcome {
        Outcome::Success => &ctx.on_success,
        Outcome::Failure => &ctx.on_failure,
    };

    tracing::trace!(item = index, stage = Stage::Dispatched.as_str(), "invoking handler");
    handler
        .handle(response, item)
        .await
        .map_err(|source| Error::Handler {
            locator,
            outcome,
            source,
        })?;

    tracing::trace!(item = index, stage = Stage::Done.as_str(), "item done");
    Ok(outcome)
}
