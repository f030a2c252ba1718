//! Cooperative shutdown signal for worker loops.
//!
//! Nothing is ever sent on the underlying channel. Firing the trigger drops
//! the only sender, which disconnects the channel and wakes every listener
//! blocked on it, including listeners parked inside a `select!`.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

/// Owning side of a shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: Mutex<Option<Sender<()>>>,
}

/// Observing side of a shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: Receiver<()>,
}

/// Create a connected trigger/listener pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = bounded(0);
    (
        ShutdownTrigger {
            tx: Mutex::new(Some(tx)),
        },
        ShutdownListener { rx },
    )
}

impl ShutdownTrigger {
    /// Signal shutdown. Idempotent.
    pub fn fire(&self) {
        let mut tx = self.tx.lock();
        *tx = None;
    }

    /// Whether [`fire`](Self::fire) has been called.
    pub fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

impl Drop for ShutdownTrigger {
    fn drop(&mut self) {
        // Dropping the sender disconnects listeners anyway; make it explicit.
        self.fire();
    }
}

impl ShutdownListener {
    /// Non-blocking check.
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Channel that becomes disconnected on shutdown, for use in `select!`.
    pub const fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Block until shutdown is signalled.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }
}
