//! Admission control for in-flight requests
//!
//! The [`AdmissionGate`] bounds how many item pipelines may be between
//! "slot acquired" and "response received" at once. Slots are RAII guards:
//! dropping an [`AdmissionSlot`] returns it to the gate, so release happens
//! on every exit path including errors, panics and cancellation.

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding simultaneous in-flight requests
///
/// Created once per run and never shared across runs. Waiters are queued
/// fairly by the underlying semaphore, so no task starves.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// One held admission slot, released on drop
#[must_use = "dropping the slot releases it immediately"]
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero or exceeds
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config(
                "max_concurrent_requests",
                "admission gate capacity must be at least 1",
            ));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(Error::config(
                "max_concurrent_requests",
                format!(
                    "admission gate capacity {capacity} exceeds the maximum of {}",
                    Semaphore::MAX_PERMITS
                ),
            ));
        }

        Ok(Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until a slot is free, then take it
    ///
    /// Suspends the calling task without blocking a thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the gate was closed while waiting.
    pub async fn acquire(&self) -> Result<AdmissionSlot> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Cancelled)?;
        Ok(AdmissionSlot { _permit: permit })
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<AdmissionSlot> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionSlot { _permit: permit })
    }

    /// Close the gate; pending and future `acquire` calls fail with [`Error::Cancelled`]
    pub fn close(&self) {
        self.permits.close();
    }

    /// Configured number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Number of slots currently held
    pub fn held(&self) -> usize {
        self.capacity - self.available()
    }
}
