//! Facility primitives and the customer/worker protocol built from them.

pub mod admission;
pub mod engine;
pub mod error;
pub mod events;
pub mod rendezvous;
pub mod scale;
pub mod task;
pub mod worker_pool;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use engine::{PostOffice, Visit, WorkerReport};
pub use error::{AppResult, OfficeError};
pub use events::{
    EventSink, InMemoryEventSink, NullEventSink, OfficeEvent, TimedEvent, TracingEventSink,
};
pub use rendezvous::{HandshakePhase, RendezvousChannel};
pub use scale::{Scale, ScaleGuard};
pub use task::{Assignment, Customer, CustomerId, Task, WorkerId};
pub use worker_pool::WorkerPool;
