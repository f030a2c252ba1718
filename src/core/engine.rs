//! Customer and worker lifecycles composed from the facility primitives.

use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::admission::AdmissionGate;
use crate::core::events::{EventSink, OfficeEvent, TimedEvent};
use crate::core::rendezvous::RendezvousChannel;
use crate::core::scale::Scale;
use crate::core::task::{Assignment, Customer, WorkerId};
use crate::core::worker_pool::WorkerPool;
use crate::core::OfficeError;
use crate::util::clock::now_ms;
use crate::util::ShutdownListener;

/// One customer's trip through the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// The customer.
    pub customer: Customer,
    /// Worker that served it.
    pub worker: WorkerId,
    /// Admission ticket (arrival order at the gate).
    pub ticket: u64,
    /// When the customer was admitted, ms since epoch.
    pub admitted_at_ms: u128,
    /// When the customer left, ms since epoch.
    pub departed_at_ms: u128,
}

/// Summary of one worker's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Worker id.
    pub worker: WorkerId,
    /// Customers served before shutdown.
    pub served: u64,
}

/// The facility: admission gate, worker pool, one rendezvous channel per
/// worker and the shared scale.
///
/// `PostOffice` is shared by reference between every customer and worker
/// thread; each primitive carries its own lock.
pub struct PostOffice {
    gate: AdmissionGate,
    pool: WorkerPool,
    channels: Box<[RendezvousChannel]>,
    scale: Scale,
    millis_per_minute: u64,
    events: Arc<dyn EventSink>,
}

impl PostOffice {
    /// Assemble a facility. Prefer [`crate::builders::build_office`], which
    /// validates configuration first.
    pub fn new(
        capacity: usize,
        worker_count: usize,
        millis_per_minute: u64,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            gate: AdmissionGate::new(capacity),
            pool: WorkerPool::new(worker_count),
            channels: (0..worker_count).map(RendezvousChannel::new).collect(),
            scale: Scale::new(),
            millis_per_minute,
            events,
        }
    }

    fn emit(&self, event: OfficeEvent) {
        self.events.record(TimedEvent::now(event));
    }

    fn channel(&self, worker: WorkerId) -> Result<&RendezvousChannel, OfficeError> {
        self.channels
            .get(worker)
            .ok_or_else(|| OfficeError::violation(worker, "no such worker"))
    }

    /// Run one customer from arrival to departure.
    ///
    /// Admission → claim an idle worker → publish the assignment → wait for
    /// the worker's acknowledgement → announce intent and let the worker
    /// proceed → wait for completion → leave.
    ///
    /// # Errors
    ///
    /// [`OfficeError::Interrupted`] if the office was closed while waiting,
    /// or a protocol violation. The admission permit is released on every
    /// path.
    pub fn serve_customer(&self, customer: Customer) -> Result<Visit, OfficeError> {
        self.emit(OfficeEvent::CustomerCreated {
            customer: customer.id,
        });

        let permit = self.gate.enter()?;
        let admitted_at_ms = now_ms();
        self.emit(OfficeEvent::CustomerAdmitted {
            customer: customer.id,
        });

        let worker = self.pool.discover_and_claim()?;
        let channel = self.channel(worker)?;
        self.emit(OfficeEvent::CustomerClaimsWorker {
            customer: customer.id,
            worker,
        });

        channel.publish(Assignment::from(customer))?;
        channel.await_acknowledge()?;

        self.emit(OfficeEvent::CustomerAnnouncesIntent {
            customer: customer.id,
            worker,
            task: customer.task,
        });
        channel.proceed()?;

        channel.await_completion()?;
        self.emit(OfficeEvent::CustomerFinished {
            customer: customer.id,
            task: customer.task,
        });

        self.emit(OfficeEvent::CustomerDeparts {
            customer: customer.id,
        });
        let ticket = permit.ticket();
        let departed_at_ms = now_ms();
        permit.leave();

        debug!(customer = customer.id, worker, ticket, "customer departed");
        Ok(Visit {
            customer,
            worker,
            ticket,
            admitted_at_ms,
            departed_at_ms,
        })
    }

    /// Run worker `worker` until `shutdown` fires.
    ///
    /// Shutdown is only observed while idle: at the top of the loop or while
    /// waiting for a customer. A customer already being served is always
    /// finished first.
    ///
    /// # Errors
    ///
    /// Protocol violations. Interrupted waits end the loop normally.
    pub fn run_worker(
        &self,
        worker: WorkerId,
        shutdown: &ShutdownListener,
    ) -> Result<WorkerReport, OfficeError> {
        let channel = self.channel(worker)?;
        self.emit(OfficeEvent::WorkerCreated { worker });

        let mut served = 0;
        while !shutdown.is_triggered() {
            channel.open()?;
            self.emit(OfficeEvent::WorkerIdle { worker });
            self.pool.advertise(worker)?;

            let assignment = match channel.await_publish(shutdown) {
                Ok(assignment) => assignment,
                Err(OfficeError::Interrupted) => break,
                Err(e) => return Err(e),
            };

            match self.serve(worker, channel, assignment) {
                Ok(()) => served += 1,
                Err(OfficeError::Interrupted) => {
                    warn!(worker, customer = assignment.customer_id, "service interrupted");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        info!(worker, served, "worker stopped");
        Ok(WorkerReport { worker, served })
    }

    fn serve(
        &self,
        worker: WorkerId,
        channel: &RendezvousChannel,
        assignment: Assignment,
    ) -> Result<(), OfficeError> {
        let Assignment { customer_id, task } = assignment;
        self.emit(OfficeEvent::WorkerAnnouncesIntent {
            worker,
            customer: customer_id,
        });
        channel.acknowledge()?;
        channel.await_proceed()?;

        {
            let _scale = if task.requires_scale() {
                Some(self.scale.acquire(worker)?)
            } else {
                None
            };
            self.emit(OfficeEvent::TaskStarted {
                worker,
                customer: customer_id,
                task,
            });
            thread::sleep(task.duration(self.millis_per_minute));
        }

        self.emit(OfficeEvent::TaskFinished {
            worker,
            customer: customer_id,
            task,
        });
        channel.complete()
    }

    /// Wake every blocked customer and worker with
    /// [`OfficeError::Interrupted`]: at the gate, at worker discovery, in a
    /// handshake or waiting for the scale. For aborting a broken run; a
    /// normal run never needs it.
    pub fn close(&self) {
        self.gate.close();
        self.pool.close();
        self.scale.close();
        for channel in &*self.channels {
            channel.close();
        }
    }

    /// Admission gate.
    pub const fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Worker pool.
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The shared scale.
    pub const fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Rendezvous channel of `worker`, if it exists.
    pub fn rendezvous(&self, worker: WorkerId) -> Option<&RendezvousChannel> {
        self.channels.get(worker)
    }

    /// Number of workers.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Event sink shared by all threads.
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }
}
