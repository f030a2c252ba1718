//! Facility event notifications and sink implementations.
//!
//! The engine reports every protocol milestone as an [`OfficeEvent`]. Sinks
//! only observe: they never block the protocol or feed anything back into it.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::task::{CustomerId, Task, WorkerId};
use crate::util::clock::now_ms;

/// A protocol milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OfficeEvent {
    /// A customer thread started.
    CustomerCreated {
        /// Customer id.
        customer: CustomerId,
    },
    /// A customer was granted an admission permit.
    CustomerAdmitted {
        /// Customer id.
        customer: CustomerId,
    },
    /// A customer claimed an idle worker.
    CustomerClaimsWorker {
        /// Customer id.
        customer: CustomerId,
        /// Claimed worker.
        worker: WorkerId,
    },
    /// A worker thread started.
    WorkerCreated {
        /// Worker id.
        worker: WorkerId,
    },
    /// A worker advertised itself as idle.
    WorkerIdle {
        /// Worker id.
        worker: WorkerId,
    },
    /// A worker read its assignment and announced who it serves.
    WorkerAnnouncesIntent {
        /// Worker id.
        worker: WorkerId,
        /// Customer being served.
        customer: CustomerId,
    },
    /// A customer told its worker what it needs.
    CustomerAnnouncesIntent {
        /// Customer id.
        customer: CustomerId,
        /// Worker serving the customer.
        worker: WorkerId,
        /// Requested task.
        task: Task,
    },
    /// A worker began the timed part of a task.
    TaskStarted {
        /// Worker id.
        worker: WorkerId,
        /// Customer being served.
        customer: CustomerId,
        /// Task being performed.
        task: Task,
    },
    /// A worker finished the timed part of a task.
    TaskFinished {
        /// Worker id.
        worker: WorkerId,
        /// Customer that was served.
        customer: CustomerId,
        /// Task that was performed.
        task: Task,
    },
    /// A customer observed that its task is done.
    CustomerFinished {
        /// Customer id.
        customer: CustomerId,
        /// Completed task.
        task: Task,
    },
    /// A customer released its admission permit.
    CustomerDeparts {
        /// Customer id.
        customer: CustomerId,
    },
    /// The driver joined a finished customer thread.
    CustomerJoined {
        /// Customer id.
        customer: CustomerId,
    },
}

impl OfficeEvent {
    /// Customer the event concerns, if any.
    pub const fn customer(&self) -> Option<CustomerId> {
        match *self {
            Self::CustomerCreated { customer }
            | Self::CustomerAdmitted { customer }
            | Self::CustomerClaimsWorker { customer, .. }
            | Self::WorkerAnnouncesIntent { customer, .. }
            | Self::CustomerAnnouncesIntent { customer, .. }
            | Self::TaskStarted { customer, .. }
            | Self::TaskFinished { customer, .. }
            | Self::CustomerFinished { customer, .. }
            | Self::CustomerDeparts { customer }
            | Self::CustomerJoined { customer } => Some(customer),
            Self::WorkerCreated { .. } | Self::WorkerIdle { .. } => None,
        }
    }

    /// Worker the event concerns, if any.
    pub const fn worker(&self) -> Option<WorkerId> {
        match *self {
            Self::CustomerClaimsWorker { worker, .. }
            | Self::WorkerCreated { worker }
            | Self::WorkerIdle { worker }
            | Self::WorkerAnnouncesIntent { worker, .. }
            | Self::CustomerAnnouncesIntent { worker, .. }
            | Self::TaskStarted { worker, .. }
            | Self::TaskFinished { worker, .. } => Some(worker),
            _ => None,
        }
    }
}

impl fmt::Display for OfficeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::CustomerCreated { customer } => write!(f, "Customer {customer} created"),
            Self::CustomerAdmitted { customer } => {
                write!(f, "Customer {customer} enters post office")
            }
            Self::CustomerClaimsWorker { customer, worker } => {
                write!(f, "Customer {customer} approaches postal worker {worker}")
            }
            Self::WorkerCreated { worker } => write!(f, "Postal worker {worker} created"),
            Self::WorkerIdle { worker } => write!(f, "Postal worker {worker} is free"),
            Self::WorkerAnnouncesIntent { worker, customer } => {
                write!(f, "Postal worker {worker} serving customer {customer}")
            }
            Self::CustomerAnnouncesIntent {
                customer,
                worker,
                task,
            } => write!(f, "Customer {customer} asks postal worker {worker} to {task}"),
            Self::TaskStarted {
                worker,
                customer,
                task,
            } => write!(
                f,
                "Postal worker {worker} starts {} for customer {customer}",
                task.progressive_phrase()
            ),
            Self::TaskFinished {
                worker, customer, ..
            } => write!(f, "Postal worker {worker} finished serving customer {customer}"),
            Self::CustomerFinished { customer, task } => {
                write!(f, "Customer {customer} finished {}", task.progressive_phrase())
            }
            Self::CustomerDeparts { customer } => {
                write!(f, "Customer {customer} leaves post office")
            }
            Self::CustomerJoined { customer } => write!(f, "Joined customer {customer}"),
        }
    }
}

/// An event stamped with the wall-clock time it was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Milliseconds since the Unix epoch.
    pub at_ms: u128,
    /// The milestone itself.
    pub event: OfficeEvent,
}

impl TimedEvent {
    /// Stamp `event` with the current time.
    pub fn now(event: OfficeEvent) -> Self {
        Self {
            at_ms: now_ms(),
            event,
        }
    }
}

/// Receiver of facility events.
pub trait EventSink: Send + Sync {
    /// Record an event. Must not block on the protocol.
    fn record(&self, event: TimedEvent);
}

/// In-memory event sink for tests and post-run inspection.
///
/// Events are kept in the order `record` was called, which is a valid
/// linearization of the run.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<TimedEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events` of the most recent events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(4096))),
            max_events,
        }
    }

    /// Snapshot of stored events.
    pub fn events(&self) -> Vec<TimedEvent> {
        self.events.lock().iter().copied().collect()
    }

    /// Snapshot of stored events without timestamps.
    pub fn kinds(&self) -> Vec<OfficeEvent> {
        self.events.lock().iter().map(|e| e.event).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: TimedEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that writes each event's text through `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: TimedEvent) {
        tracing::info!(
            target: "post_office::events",
            at_ms = %event.at_ms,
            customer = event.event.customer(),
            worker = event.event.worker(),
            "{}",
            event.event
        );
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&self, _event: TimedEvent) {}
}
