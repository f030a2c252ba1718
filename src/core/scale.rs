//! The shared package scale.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::trace;

use crate::core::task::WorkerId;
use crate::core::OfficeError;
use crate::Semaphore;

/// Single shared resource that at most one worker may use at a time.
#[derive(Debug)]
pub struct Scale {
    permit: Semaphore,
    holders: AtomicUsize,
    peak_holders: AtomicUsize,
    waits: AtomicU64,
}

/// Exclusive use of the [`Scale`]. Released on drop.
#[derive(Debug)]
#[must_use = "the scale is released as soon as the guard is dropped"]
pub struct ScaleGuard<'a> {
    scale: &'a Scale,
    worker: WorkerId,
}

impl Default for Scale {
    fn default() -> Self {
        Self::new()
    }
}

impl Scale {
    /// Create an unused scale.
    pub const fn new() -> Self {
        Self {
            permit: Semaphore::bounded(1, 1),
            holders: AtomicUsize::new(0),
            peak_holders: AtomicUsize::new(0),
            waits: AtomicU64::new(0),
        }
    }

    /// Block until the scale is free and take it on behalf of `worker`.
    ///
    /// # Errors
    ///
    /// [`OfficeError::Interrupted`] if the scale was closed.
    pub fn acquire(&self, worker: WorkerId) -> Result<ScaleGuard<'_>, OfficeError> {
        if !self.permit.try_acquire() {
            self.waits.fetch_add(1, Ordering::AcqRel);
            trace!(worker, "waiting for scale");
            self.permit.acquire()?;
        }
        let holders = self.holders.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_holders.fetch_max(holders, Ordering::AcqRel);
        debug_assert_eq!(holders, 1, "scale shared by two workers");
        trace!(worker, "scale acquired");
        Ok(ScaleGuard {
            scale: self,
            worker,
        })
    }

    /// Wake any worker waiting for the scale with an error.
    pub fn close(&self) {
        self.permit.close();
    }

    /// Workers holding the scale right now (0 or 1).
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::Acquire)
    }

    /// Most workers ever observed holding the scale at once.
    pub fn peak_holders(&self) -> usize {
        self.peak_holders.load(Ordering::Acquire)
    }

    /// Acquisitions that found the scale taken and had to wait.
    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::Acquire)
    }
}

impl ScaleGuard<'_> {
    /// Worker holding the scale.
    pub const fn worker(&self) -> WorkerId {
        self.worker
    }
}

impl Drop for ScaleGuard<'_> {
    fn drop(&mut self) {
        self.scale.holders.fetch_sub(1, Ordering::AcqRel);
        // The guard owns the only permit, so the ceiling cannot be hit.
        let _ = self.scale.permit.release();
        trace!(worker = self.worker, "scale released");
    }
}
