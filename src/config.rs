//! Configuration types for batch-fetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

/// How item pipelines are scheduled within a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStrategy {
    /// Spawn one task per item up front; admission is throttled inside each task.
    ///
    /// Every item has a live task for the whole run, so memory grows with the
    /// item count. Suited to modest batches.
    #[default]
    Eager,
    /// Drive at most `max_concurrent_requests` pipelines at a time, pulling the
    /// next item only when one finishes. Memory stays proportional to the cap.
    Bounded,
}

/// Orchestrator configuration
///
/// Captured at the start of each run. Changing it requires `&mut` access to
/// the orchestrator, so it cannot change while a run is active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of requests in flight at once (default: 2, must be >= 1)
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Scheduling strategy for item pipelines (default: eager)
    #[serde(default)]
    pub strategy: SpawnStrategy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            strategy: SpawnStrategy::default(),
        }
    }
}

impl FetchConfig {
    /// Config with the given concurrency cap and default strategy
    pub fn with_max_concurrent_requests(max_concurrent_requests: usize) -> Self {
        Self {
            max_concurrent_requests,
            ..Default::default()
        }
    }

    /// Reject settings that cannot run
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_requests == 0 {
            return Err(Error::config(
                "max_concurrent_requests",
                "max_concurrent_requests must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Transport session configuration
///
/// Passed through to the [`Transport`](crate::transport::Transport) when a
/// session is opened. The orchestrator never interprets these values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Total per-request timeout, in seconds (None = no timeout)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,

    /// Connection establishment timeout, in seconds (None = no timeout)
    #[serde(default, with = "optional_duration_serde")]
    pub connect_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Default headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Proxy URL applied to all schemes (e.g., "http://proxy:8080")
    #[serde(default)]
    pub proxy: Option<String>,

    /// Accept invalid TLS certificates (testing only)
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Maximum idle connections kept per host (None = client default)
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

fn default_max_concurrent_requests() -> usize {
    2
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        match secs {
            Some(s) => Duration::try_from_secs_f64(s).map(Some).map_err(|e| {
                serde::de::Error::custom(format!(
                    "duration must be a non-negative number of seconds, got {s}: {e}"
                ))
            }),
            None => Ok(None),
        }
    }
}
