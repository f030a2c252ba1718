//! Bounded, FIFO-fair admission into the facility.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::core::OfficeError;
use crate::Semaphore;

/// Limits how many customers are inside the facility at once.
///
/// Permits are granted strictly in the order [`enter`](Self::enter) was
/// called.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Semaphore,
    capacity: usize,
    occupancy: AtomicUsize,
}

/// Proof of admission. Dropping it leaves the facility.
#[derive(Debug)]
#[must_use = "dropping the permit immediately leaves the facility"]
pub struct AdmissionPermit<'a> {
    gate: &'a AdmissionGate,
    ticket: u64,
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` customers.
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Semaphore::new(capacity),
            capacity,
            occupancy: AtomicUsize::new(0),
        }
    }

    /// Block until there is room, in arrival order, then admit the caller.
    ///
    /// The permit's ticket is both the arrival position and the grant
    /// position, since grants never reorder arrivals.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Interrupted`] if the gate was closed.
    pub fn enter(&self) -> Result<AdmissionPermit<'_>, OfficeError> {
        let ticket = self.permits.acquire()?;
        let inside = self.occupancy.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(inside <= self.capacity, "gate over capacity");
        debug!(ticket, inside, "admitted");
        Ok(AdmissionPermit { gate: self, ticket })
    }

    /// Return one unit of capacity. Called by [`AdmissionPermit`] on drop.
    fn leave(&self) {
        self.occupancy.fetch_sub(1, Ordering::AcqRel);
        // A gate semaphore is unbounded, so release cannot overflow.
        let _ = self.permits.release();
    }

    /// Stop admitting: current and future `enter` calls fail.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Configured capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Customers currently holding a permit.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    /// Customers blocked in [`enter`](Self::enter).
    pub fn waiting(&self) -> u64 {
        self.permits.queued()
    }
}

impl AdmissionPermit<'_> {
    /// Arrival ticket: position of the `enter` call among all calls.
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Leave the facility explicitly.
    pub fn leave(self) {
        drop(self);
    }
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}
