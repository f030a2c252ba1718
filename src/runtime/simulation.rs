//! Runs a whole post office day on dedicated OS threads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::builders::build_office;
use crate::config::OfficeConfig;
use crate::core::{
    Customer, EventSink, OfficeError, OfficeEvent, PostOffice, Task, TimedEvent,
    TracingEventSink, Visit, WorkerId, WorkerReport,
};
use crate::runtime::assign::{customers_from_tasks, random_tasks};
use crate::util::{shutdown_channel, ShutdownListener, ShutdownTrigger};

/// Outcome of a completed simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Configuration the run used.
    pub config: OfficeConfig,
    /// One entry per customer, in customer id order.
    pub visits: Vec<Visit>,
    /// One entry per worker, in worker id order.
    pub workers: Vec<WorkerReport>,
    /// Most workers ever holding the scale at once.
    pub peak_scale_holders: usize,
    /// Scale acquisitions that had to wait for another worker.
    pub scale_waits: u64,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u128,
}

impl SimulationReport {
    /// Customers served by `worker`.
    pub fn served_by(&self, worker: WorkerId) -> u64 {
        self.workers
            .iter()
            .find(|r| r.worker == worker)
            .map_or(0, |r| r.served)
    }

    /// Customers that asked for `task`.
    pub fn count_of(&self, task: Task) -> usize {
        self.visits.iter().filter(|v| v.customer.task == task).count()
    }
}

/// Driver for one simulated day.
///
/// Spawns one thread per worker and per customer, waits for every customer,
/// then signals shutdown and joins the workers. A failing thread aborts the
/// whole run.
///
/// ```rust,ignore
/// use post_office::config::OfficeConfig;
/// use post_office::runtime::Simulation;
///
/// let report = Simulation::new(OfficeConfig::default().with_millis_per_minute(10)).run()?;
/// assert_eq!(report.visits.len(), 50);
/// ```
pub struct Simulation {
    config: OfficeConfig,
    events: Arc<dyn EventSink>,
    tasks: Option<Vec<Task>>,
}

impl Simulation {
    /// Simulation logging events through `tracing`, with randomly assigned
    /// tasks.
    pub fn new(config: OfficeConfig) -> Self {
        Self {
            config,
            events: Arc::new(TracingEventSink),
            tasks: None,
        }
    }

    /// Report events to `events` instead.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Use exactly these tasks, one customer each, instead of a random draw.
    /// Overrides `customer_count`.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.config.customer_count = tasks.len();
        self.tasks = Some(tasks);
        self
    }

    /// Configuration in effect.
    pub const fn config(&self) -> &OfficeConfig {
        &self.config
    }

    /// Customers this run will create.
    pub fn customers(&self) -> Vec<Customer> {
        match &self.tasks {
            Some(tasks) => customers_from_tasks(tasks),
            None => customers_from_tasks(&random_tasks(
                self.config.customer_count,
                self.config.seed,
            )),
        }
    }

    /// Run the day to completion.
    ///
    /// Thread outcomes are collected as threads finish, so the first failure
    /// of any customer or worker aborts the run: the office is closed,
    /// shutdown is fired and that error is returned.
    ///
    /// # Errors
    ///
    /// Invalid configuration, thread spawn failures, a panicked thread, or
    /// the first protocol violation observed. Threads still running after an
    /// abort are detached.
    pub fn run(&self) -> Result<SimulationReport, OfficeError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("simulation", %run_id);
        let _enter = span.enter();

        let office = build_office(&self.config, Arc::clone(&self.events))?;
        let customers = self.customers();
        info!(
            customers = customers.len(),
            workers = self.config.worker_count,
            "Simulating post office with {} customers and {} postal workers",
            customers.len(),
            self.config.worker_count
        );

        let started = Instant::now();
        let (trigger, shutdown) = shutdown_channel();
        let (done_tx, done_rx) = unbounded();

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for worker in 0..self.config.worker_count {
            match spawn_worker(&office, worker, shutdown.clone(), done_tx.clone()) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    abort(&office, &trigger);
                    return Err(e);
                }
            }
        }

        let mut customer_threads = Vec::with_capacity(customers.len());
        for customer in customers {
            match spawn_customer(&office, customer, done_tx.clone()) {
                Ok(handle) => customer_threads.push((customer.id, handle)),
                Err(e) => {
                    abort(&office, &trigger);
                    return Err(e);
                }
            }
        }
        drop(done_tx);

        let mut visits = Vec::with_capacity(customer_threads.len());
        let mut reports = Vec::with_capacity(workers.len());
        while visits.len() < customer_threads.len() {
            match next_outcome(&done_rx) {
                Ok(Outcome::Visit(visit)) => visits.push(visit),
                Ok(Outcome::Worker(report)) => reports.push(report),
                Ok(Outcome::Failed(e)) | Err(e) => {
                    error!(error = %e, "thread failed");
                    abort(&office, &trigger);
                    return Err(e);
                }
            }
        }

        // Every customer thread has produced its visit, so joins return at once.
        for (id, handle) in customer_threads {
            handle
                .join()
                .map_err(|_| OfficeError::ThreadPanicked {
                    role: "customer",
                    id,
                })?;
            self.events
                .record(TimedEvent::now(OfficeEvent::CustomerJoined { customer: id }));
        }

        // Every customer has left; idle workers may stop.
        trigger.fire();

        while reports.len() < workers.len() {
            match next_outcome(&done_rx) {
                Ok(Outcome::Worker(report)) => reports.push(report),
                Ok(Outcome::Visit(visit)) => {
                    return Err(OfficeError::violation(
                        0,
                        format!("customer {} reported after all customers left", visit.customer.id),
                    ));
                }
                Ok(Outcome::Failed(e)) | Err(e) => {
                    error!(error = %e, "worker failed");
                    abort(&office, &trigger);
                    return Err(e);
                }
            }
        }
        for (id, handle) in workers.into_iter().enumerate() {
            handle
                .join()
                .map_err(|_| OfficeError::ThreadPanicked { role: "worker", id })?;
        }

        visits.sort_by_key(|v| v.customer.id);
        reports.sort_by_key(|r| r.worker);
        for report in &reports {
            debug!(worker = report.worker, served = report.served, "worker joined");
        }

        let elapsed_ms = started.elapsed().as_millis();
        info!(elapsed_ms = %elapsed_ms, "simulation finished");
        Ok(SimulationReport {
            run_id,
            config: self.config.clone(),
            visits,
            workers: reports,
            peak_scale_holders: office.scale().peak_holders(),
            scale_waits: office.scale().waits(),
            elapsed_ms,
        })
    }
}

/// What a finished customer or worker thread hands back to the driver.
enum Outcome {
    Visit(Visit),
    Worker(WorkerReport),
    Failed(OfficeError),
}

/// Sends the thread's outcome to the driver exactly once. If the thread
/// unwinds before reporting, the drop sends [`OfficeError::ThreadPanicked`].
struct Reporter {
    tx: Option<Sender<Outcome>>,
    role: &'static str,
    id: usize,
}

impl Reporter {
    const fn new(tx: Sender<Outcome>, role: &'static str, id: usize) -> Self {
        Self {
            tx: Some(tx),
            role,
            id,
        }
    }

    fn report(mut self, outcome: Outcome) {
        if let Some(tx) = self.tx.take() {
            // The driver may already have returned after an abort.
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Outcome::Failed(OfficeError::ThreadPanicked {
                role: self.role,
                id: self.id,
            }));
        }
    }
}

fn next_outcome(done: &Receiver<Outcome>) -> Result<Outcome, OfficeError> {
    match done.recv() {
        Ok(Outcome::Failed(e)) => Err(e),
        Ok(outcome) => Ok(outcome),
        Err(_) => Err(OfficeError::violation(0, "threads exited without reporting")),
    }
}

fn abort(office: &PostOffice, trigger: &ShutdownTrigger) {
    warn!("aborting simulation");
    office.close();
    trigger.fire();
}

fn spawn_worker(
    office: &Arc<PostOffice>,
    worker: WorkerId,
    shutdown: ShutdownListener,
    done: Sender<Outcome>,
) -> Result<JoinHandle<()>, OfficeError> {
    let office = Arc::clone(office);
    let handle = thread::Builder::new()
        .name(format!("postal-worker-{worker}"))
        .spawn(move || {
            let reporter = Reporter::new(done, "worker", worker);
            match office.run_worker(worker, &shutdown) {
                Ok(report) => reporter.report(Outcome::Worker(report)),
                Err(e) => {
                    error!(worker, error = %e, "worker failed");
                    reporter.report(Outcome::Failed(e));
                }
            }
        })?;
    Ok(handle)
}

fn spawn_customer(
    office: &Arc<PostOffice>,
    customer: Customer,
    done: Sender<Outcome>,
) -> Result<JoinHandle<()>, OfficeError> {
    let office = Arc::clone(office);
    let handle = thread::Builder::new()
        .name(format!("customer-{}", customer.id))
        .spawn(move || {
            let reporter = Reporter::new(done, "customer", customer.id);
            match office.serve_customer(customer) {
                Ok(visit) => reporter.report(Outcome::Visit(visit)),
                Err(e) => reporter.report(Outcome::Failed(e)),
            }
        })?;
    Ok(handle)
}
