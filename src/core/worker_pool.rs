//! Idle-worker discovery.
//!
//! Two layers of semaphores: one aggregate "some worker is free" counter and
//! one binary token per worker. A worker publishes its own token *before*
//! bumping the aggregate, so a customer that got past the aggregate always has
//! a token waiting for it somewhere in the scan.

use tracing::{debug, trace};

use crate::core::task::WorkerId;
use crate::core::OfficeError;
use crate::Semaphore;

/// Tracks which of the fixed worker slots are idle.
#[derive(Debug)]
pub struct WorkerPool {
    available: Semaphore,
    slots: Box<[Semaphore]>,
}

impl WorkerPool {
    /// Create a pool of `worker_count` slots, all initially busy (not yet
    /// advertised).
    pub fn new(worker_count: usize) -> Self {
        Self {
            available: Semaphore::new(0),
            slots: (0..worker_count).map(|_| Semaphore::bounded(0, 1)).collect(),
        }
    }

    /// Number of worker slots.
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Mark `worker` idle and claimable.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::ProtocolViolation`] if `worker` is out of range
    /// or its previous advertisement was never claimed.
    pub fn advertise(&self, worker: WorkerId) -> Result<(), OfficeError> {
        let slot = self
            .slots
            .get(worker)
            .ok_or_else(|| OfficeError::violation(worker, "no such worker"))?;
        slot.release()
            .map_err(|_| OfficeError::violation(worker, "advertised while still claimable"))?;
        // Only now may a customer learn that someone is free.
        self.available.release()?;
        trace!(worker, "worker advertised");
        Ok(())
    }

    /// Block until some worker is idle, then claim one exclusively.
    ///
    /// Slots are probed in ascending id order; the last slot is waited on
    /// rather than probed, so a customer never spins.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Interrupted`] if the pool was closed.
    pub fn discover_and_claim(&self) -> Result<WorkerId, OfficeError> {
        self.available.acquire()?;

        let Some((last, rest)) = self.slots.split_last() else {
            return Err(OfficeError::violation(0, "pool has no workers"));
        };
        if let Some(worker) = rest.iter().position(Semaphore::try_acquire) {
            debug!(worker, "claimed worker");
            return Ok(worker);
        }

        last.acquire()?;
        let worker = rest.len();
        debug!(worker, "claimed last worker");
        Ok(worker)
    }

    /// Wake every blocked customer with [`OfficeError::Interrupted`].
    pub fn close(&self) {
        self.available.close();
        for slot in &*self.slots {
            slot.close();
        }
    }

    /// Advertisements not yet consumed by a customer.
    pub fn idle_advertisements(&self) -> usize {
        self.available.available_permits()
    }

    /// Whether `worker` currently holds an unclaimed advertisement.
    pub fn is_claimable(&self, worker: WorkerId) -> bool {
        self.slots
            .get(worker)
            .is_some_and(|slot| slot.available_permits() > 0)
    }
}
