//! FIFO-fair counting semaphore.
//!
//! This module provides the counting semaphore every facility primitive is
//! composed from, built on top of `parking_lot`'s `Mutex` and `Condvar`.
//!
//! # Features
//!
//! - Strict first-come-first-served grant order (ticket based)
//! - Optional permit ceiling, which turns it into a binary semaphore
//! - Closing wakes every waiter with [`OfficeError::Interrupted`]
//! - No spinning: waiters sleep on the condition variable
//!
//! # Examples
//!
//! ```
//! use post_office::Semaphore;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let sem = Arc::new(Semaphore::new(2));
//! let mut handles = vec![];
//!
//! for _ in 0..4 {
//!     let sem = Arc::clone(&sem);
//!     handles.push(thread::spawn(move || {
//!         sem.acquire().unwrap();
//!         sem.release().unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(sem.available_permits(), 2);
//! ```

use parking_lot::{Condvar, Mutex};

use crate::core::OfficeError;

#[derive(Debug)]
struct State {
    permits: usize,
    /// Ticket handed to the next caller of `acquire`.
    next_ticket: u64,
    /// Ticket of the waiter at the head of the queue.
    now_serving: u64,
    closed: bool,
}

impl State {
    const fn waiters(&self) -> u64 {
        self.next_ticket - self.now_serving
    }
}

/// A counting semaphore that grants permits in strict arrival order.
///
/// Every call to [`acquire`](Self::acquire) draws a ticket; a permit is only
/// handed to the caller whose ticket is at the head of the queue. A later
/// caller can therefore never overtake an earlier one, even if it happens to
/// wake first.
///
/// # Examples
///
/// ```
/// use post_office::Semaphore;
///
/// let scale = Semaphore::bounded(1, 1);
/// assert!(scale.try_acquire());
/// assert!(!scale.try_acquire());
/// scale.release().unwrap();
/// assert!(scale.release().is_err());
/// ```
#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<State>,
    cvar: Condvar,
    max_permits: usize,
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits with no upper bound.
    ///
    /// # Examples
    ///
    /// ```
    /// use post_office::Semaphore;
    ///
    /// let sem = Semaphore::new(3);
    /// assert_eq!(sem.available_permits(), 3);
    /// ```
    #[inline]
    pub const fn new(permits: usize) -> Self {
        Self::with_ceiling(permits, usize::MAX)
    }

    /// Creates a semaphore that may never hold more than `max` permits.
    ///
    /// `Semaphore::bounded(0, 1)` is a binary semaphore that starts taken.
    /// Initial permits above `max` are clamped.
    #[inline]
    pub const fn bounded(permits: usize, max: usize) -> Self {
        let permits = if permits > max { max } else { permits };
        Self::with_ceiling(permits, max)
    }

    const fn with_ceiling(permits: usize, max_permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                next_ticket: 0,
                now_serving: 0,
                closed: false,
            }),
            cvar: Condvar::new(),
            max_permits,
        }
    }

    /// Blocks until a permit is available and every earlier caller has been
    /// served, then takes the permit.
    ///
    /// Returns the caller's arrival ticket. Tickets are issued in call order,
    /// so comparing them tells which caller arrived first.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Interrupted`] if the semaphore is closed before
    /// or while waiting.
    pub fn acquire(&self) -> Result<u64, OfficeError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(OfficeError::Interrupted);
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        while !state.closed && (state.now_serving != ticket || state.permits == 0) {
            self.cvar.wait(&mut state);
        }
        if state.closed {
            return Err(OfficeError::Interrupted);
        }

        state.permits -= 1;
        state.now_serving += 1;
        // The new head may be able to proceed on a leftover permit.
        if state.permits > 0 && state.waiters() > 0 {
            self.cvar.notify_all();
        }
        Ok(ticket)
    }

    /// Takes a permit only if one is free and nobody is queued ahead.
    ///
    /// This never barges past blocked callers of [`acquire`](Self::acquire).
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.permits == 0 || state.waiters() > 0 {
            return false;
        }
        state.permits -= 1;
        state.next_ticket += 1;
        state.now_serving += 1;
        true
    }

    /// Returns one permit to the semaphore and wakes the queue.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::PermitOverflow`] if the semaphore already holds
    /// its maximum number of permits. The permit count is left unchanged.
    pub fn release(&self) -> Result<(), OfficeError> {
        let mut state = self.state.lock();
        if state.permits >= self.max_permits {
            return Err(OfficeError::PermitOverflow {
                max: self.max_permits,
            });
        }
        state.permits += 1;
        if state.waiters() > 0 {
            // Condvar cannot target the head ticket, so everyone rechecks.
            self.cvar.notify_all();
        }
        Ok(())
    }

    /// Closes the semaphore. Current and future waiters fail with
    /// [`OfficeError::Interrupted`]; `release` keeps working.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.cvar.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of permits currently free.
    pub fn available_permits(&self) -> usize {
        self.state.lock().permits
    }

    /// Number of callers blocked in [`acquire`](Self::acquire).
    pub fn queued(&self) -> u64 {
        self.state.lock().waiters()
    }
}
