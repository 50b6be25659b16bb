//! Core types shared by the orchestrator and its collaborators

use reqwest::StatusCode;
use std::time::Duration;

/// Classification of a completed response
///
/// Decides which handler receives the response. Transport failures never
/// produce an `Outcome`; they are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Status outside the client/server error range (1xx, 2xx, 3xx)
    Success,
    /// Status in the client or server error range (4xx, 5xx)
    Failure,
}

impl Outcome {
    /// Classify a response status
    ///
    /// # Examples
    ///
    /// ```
    /// use batch_fetch::Outcome;
    /// use reqwest::StatusCode;
    ///
    /// assert_eq!(Outcome::classify(StatusCode::OK), Outcome::Success);
    /// assert_eq!(Outcome::classify(StatusCode::NOT_FOUND), Outcome::Failure);
    /// ```
    pub fn classify(status: StatusCode) -> Self {
        if status.is_client_error() || status.is_server_error() {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure => f.write_str("failure"),
        }
    }
}

/// Lifecycle stage of a single item's pipeline
///
/// `Pending → Admitted → Requested → Classified → Dispatched → Done`, or
/// `Admitted → Failed` when the request cannot complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for an admission slot
    Pending,
    /// Holding an admission slot
    Admitted,
    /// Response received, slot released
    Requested,
    /// Response classified as success or failure
    Classified,
    /// Handler is running
    Dispatched,
    /// Handler finished
    Done,
    /// Terminated with an error
    Failed,
}

impl Stage {
    /// Short lowercase name, used as a structured log field
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Admitted => "admitted",
            Stage::Requested => "requested",
            Stage::Classified => "classified",
            Stage::Dispatched => "dispatched",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

/// Counts of handler dispatches for one orchestration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of items in the run
    pub total: usize,
    /// Items whose response went to the success handler
    pub succeeded: usize,
    /// Items whose response went to the failure handler
    pub failed: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Failure => self.failed += 1,
        }
    }

    /// Number of items that reached a handler
    pub fn dispatched(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Elapsed time in whole milliseconds, saturating at `u64::MAX`
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}
