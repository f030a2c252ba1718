//! Per-worker customer/worker handshake.
//!
//! Each worker slot owns one [`RendezvousChannel`]. The four signals of the
//! handshake are zero-capacity `crossbeam-channel` channels: a send returns
//! only once the other side has taken it, so every signal is consumed exactly
//! once and the assignment travels by value instead of through shared state.
//!
//! ```text
//! customer                              worker
//!   |                                     | open()           Idle -> AwaitingPublish
//!   | publish(assignment) -------------> | await_publish()   -> Published
//!   | await_acknowledge() <------------- | acknowledge()     -> WorkerAcknowledged
//!   | proceed() -----------------------> | await_proceed()   -> ExecutingTask
//!   | await_completion() <-------------- | complete()        -> Completed -> Idle
//! ```

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::task::{Assignment, CustomerId, WorkerId};
use crate::core::OfficeError;
use crate::util::{shutdown_channel, ShutdownListener, ShutdownTrigger};

/// Where a slot is in its handshake cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakePhase {
    /// Worker busy or not yet advertised.
    Idle,
    /// Worker advertised and is waiting for a customer's assignment.
    AwaitingPublish,
    /// Customer handed over its assignment.
    Published,
    /// Worker read the assignment and is ready.
    WorkerAcknowledged,
    /// Customer authorized the timed work.
    ExecutingTask,
    /// Worker finished; customer has not yet taken the completion signal.
    Completed,
}

#[derive(Debug)]
struct Tracker {
    phase: HandshakePhase,
    customer: Option<CustomerId>,
    served: u64,
}

#[derive(Debug)]
struct Signal<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Signal<T> {
    fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self { tx, rx }
    }
}

/// Two-party handshake for one worker slot.
#[derive(Debug)]
pub struct RendezvousChannel {
    slot: WorkerId,
    tracker: Mutex<Tracker>,
    published: Signal<Assignment>,
    acknowledged: Signal<()>,
    proceed: Signal<()>,
    completed: Signal<()>,
    closer: ShutdownTrigger,
    closed: ShutdownListener,
}

impl RendezvousChannel {
    /// Create the channel for worker slot `slot`.
    pub fn new(slot: WorkerId) -> Self {
        let (closer, closed) = shutdown_channel();
        Self {
            slot,
            tracker: Mutex::new(Tracker {
                phase: HandshakePhase::Idle,
                customer: None,
                served: 0,
            }),
            published: Signal::new(),
            acknowledged: Signal::new(),
            proceed: Signal::new(),
            completed: Signal::new(),
            closer,
            closed,
        }
    }

    /// Abandon the channel: every current and future wait on either side
    /// fails with [`OfficeError::Interrupted`]. Used when the peer thread has
    /// died and will never send or receive again.
    pub fn close(&self) {
        self.closer.fire();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_triggered()
    }

    /// Slot this channel belongs to.
    pub const fn slot(&self) -> WorkerId {
        self.slot
    }

    /// Current phase.
    pub fn phase(&self) -> HandshakePhase {
        self.tracker.lock().phase
    }

    /// Customer currently bound to the slot, if any.
    pub fn customer(&self) -> Option<CustomerId> {
        self.tracker.lock().customer
    }

    /// Handshakes completed on this slot.
    pub fn served(&self) -> u64 {
        self.tracker.lock().served
    }

    fn transition(&self, from: HandshakePhase, to: HandshakePhase) -> Result<(), OfficeError> {
        let mut tracker = self.tracker.lock();
        if tracker.phase != from {
            return Err(OfficeError::violation(
                self.slot,
                format!("{to:?} requires {from:?}, slot is {:?}", tracker.phase),
            ));
        }
        tracker.phase = to;
        trace!(slot = self.slot, ?from, ?to, "handshake transition");
        Ok(())
    }

    fn disconnected(&self, signal: &str) -> OfficeError {
        OfficeError::violation(self.slot, format!("{signal} signal disconnected"))
    }

    fn send<T>(&self, signal: &Signal<T>, msg: T, name: &str) -> Result<(), OfficeError> {
        select! {
            send(signal.tx, msg) -> res => res.map_err(|_| self.disconnected(name)),
            recv(self.closed.receiver()) -> _ => Err(OfficeError::Interrupted),
        }
    }

    fn recv<T>(&self, signal: &Signal<T>, name: &str) -> Result<T, OfficeError> {
        select! {
            recv(signal.rx) -> msg => msg.map_err(|_| self.disconnected(name)),
            recv(self.closed.receiver()) -> _ => Err(OfficeError::Interrupted),
        }
    }

    // ---- worker side ----

    /// Open the slot for a new customer. Must happen before the worker is
    /// advertised.
    ///
    /// # Errors
    ///
    /// Protocol violation unless the previous handshake has fully completed.
    pub fn open(&self) -> Result<(), OfficeError> {
        self.transition(HandshakePhase::Idle, HandshakePhase::AwaitingPublish)
    }

    /// Wait for a customer's assignment, or for shutdown.
    ///
    /// An assignment that is already being handed over wins over a shutdown
    /// observed at the same moment.
    ///
    /// # Errors
    ///
    /// [`OfficeError::Interrupted`] on shutdown or when the channel is
    /// closed; protocol violation if the assignment arrives out of phase.
    pub fn await_publish(&self, shutdown: &ShutdownListener) -> Result<Assignment, OfficeError> {
        let received = select! {
            recv(self.published.rx) -> msg => msg.map_err(|_| self.disconnected("published")),
            recv(shutdown.receiver()) -> _ => self
                .published
                .rx
                .try_recv()
                .map_err(|_| OfficeError::Interrupted),
            recv(self.closed.receiver()) -> _ => Err(OfficeError::Interrupted),
        };
        let assignment = received?;
        let tracker = self.tracker.lock();
        if tracker.phase != HandshakePhase::Published
            || tracker.customer != Some(assignment.customer_id)
        {
            return Err(OfficeError::violation(
                self.slot,
                format!(
                    "assignment for customer {} received in phase {:?}",
                    assignment.customer_id, tracker.phase
                ),
            ));
        }
        Ok(assignment)
    }

    /// Tell the customer the worker has read the assignment.
    ///
    /// # Errors
    ///
    /// Protocol violation when out of phase.
    pub fn acknowledge(&self) -> Result<(), OfficeError> {
        self.transition(HandshakePhase::Published, HandshakePhase::WorkerAcknowledged)?;
        self.send(&self.acknowledged, (), "acknowledged")
    }

    /// Wait until the customer authorizes the timed work.
    ///
    /// # Errors
    ///
    /// Protocol violation when the signal arrives out of phase.
    pub fn await_proceed(&self) -> Result<(), OfficeError> {
        self.recv(&self.proceed, "proceed")?;
        let phase = self.phase();
        if phase == HandshakePhase::ExecutingTask {
            Ok(())
        } else {
            Err(OfficeError::violation(
                self.slot,
                format!("proceed received in phase {phase:?}"),
            ))
        }
    }

    /// Signal completion and wait for the customer to take it, then return the
    /// slot to [`HandshakePhase::Idle`].
    ///
    /// # Errors
    ///
    /// Protocol violation when out of phase.
    pub fn complete(&self) -> Result<(), OfficeError> {
        self.transition(HandshakePhase::ExecutingTask, HandshakePhase::Completed)?;
        self.send(&self.completed, (), "completed")?;

        let mut tracker = self.tracker.lock();
        tracker.phase = HandshakePhase::Idle;
        tracker.customer = None;
        tracker.served += 1;
        trace!(slot = self.slot, served = tracker.served, "slot released");
        Ok(())
    }

    // ---- customer side ----

    /// Hand the assignment to the worker. Blocks until the worker takes it.
    ///
    /// # Errors
    ///
    /// Protocol violation if the worker has not opened the slot, which means
    /// the slot is still owned by a previous customer.
    pub fn publish(&self, assignment: Assignment) -> Result<(), OfficeError> {
        {
            let mut tracker = self.tracker.lock();
            if tracker.phase != HandshakePhase::AwaitingPublish {
                return Err(OfficeError::violation(
                    self.slot,
                    format!(
                        "customer {} published into phase {:?}",
                        assignment.customer_id, tracker.phase
                    ),
                ));
            }
            tracker.phase = HandshakePhase::Published;
            tracker.customer = Some(assignment.customer_id);
        }
        self.send(&self.published, assignment, "published")
    }

    /// Wait for the worker's acknowledgement.
    ///
    /// # Errors
    ///
    /// [`OfficeError::Interrupted`] if the channel was closed.
    pub fn await_acknowledge(&self) -> Result<(), OfficeError> {
        self.recv(&self.acknowledged, "acknowledged")
    }

    /// Authorize the worker to start the timed work.
    ///
    /// # Errors
    ///
    /// Protocol violation when out of phase.
    pub fn proceed(&self) -> Result<(), OfficeError> {
        self.transition(HandshakePhase::WorkerAcknowledged, HandshakePhase::ExecutingTask)?;
        self.send(&self.proceed, (), "proceed")
    }

    /// Wait for the worker to finish the task.
    ///
    /// # Errors
    ///
    /// [`OfficeError::Interrupted`] if the channel was closed, which is how
    /// a customer learns that its worker died mid-service.
    pub fn await_completion(&self) -> Result<(), OfficeError> {
        self.recv(&self.completed, "completed")
    }
}
