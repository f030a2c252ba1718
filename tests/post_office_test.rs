//! Integration tests for the post office protocol
//!
//! These tests run whole simulated days and check the facility invariants
//! against the recorded event stream.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use post_office::config::OfficeConfig;
use post_office::core::{
    AdmissionGate, EventSink, InMemoryEventSink, OfficeError, OfficeEvent, Task, TimedEvent,
    WorkerId,
};
use post_office::runtime::{Simulation, SimulationReport};

fn run_day(config: OfficeConfig, tasks: Option<Vec<Task>>) -> (SimulationReport, Vec<OfficeEvent>) {
    let sink = Arc::new(InMemoryEventSink::new(100_000));
    let mut sim = Simulation::new(config).with_events(sink.clone());
    if let Some(tasks) = tasks {
        sim = sim.with_tasks(tasks);
    }
    let report = sim.run().expect("simulation should finish");
    (report, sink.kinds())
}

fn admitted_order(events: &[OfficeEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            OfficeEvent::CustomerAdmitted { customer } => Some(*customer),
            _ => None,
        })
        .collect()
}

/// Occupancy computed from admit/depart events never exceeds capacity
#[test]
fn test_capacity_never_exceeded() {
    let config = OfficeConfig::default()
        .with_capacity(4)
        .with_worker_count(3)
        .with_customer_count(40)
        .with_millis_per_minute(6)
        .with_seed(21);
    let (report, events) = run_day(config, None);
    assert_eq!(report.visits.len(), 40);

    let mut inside = 0_usize;
    let mut peak = 0_usize;
    for event in &events {
        match event {
            OfficeEvent::CustomerAdmitted { .. } => {
                inside += 1;
                peak = peak.max(inside);
            }
            OfficeEvent::CustomerDeparts { .. } => inside -= 1,
            _ => {}
        }
        assert!(inside <= 4, "occupancy {inside} exceeds capacity");
    }
    assert_eq!(inside, 0);
    assert!(peak >= 1);
}

/// Admission is granted in arrival order when the gate is full
#[test]
fn test_admission_is_fifo() {
    let gate = Arc::new(AdmissionGate::new(1));
    let holder = gate.enter().unwrap();
    let admitted = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut handles = vec![];
    for customer in 0..5_usize {
        let waiting_before = gate.waiting();
        let g = Arc::clone(&gate);
        let admitted = Arc::clone(&admitted);
        handles.push(thread::spawn(move || {
            let permit = g.enter().unwrap();
            admitted.lock().push(customer);
            permit.leave();
        }));
        while gate.waiting() == waiting_before {
            thread::sleep(Duration::from_millis(1));
        }
    }

    holder.leave();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(*admitted.lock(), vec![0, 1, 2, 3, 4]);
    assert_eq!(gate.occupancy(), 0);
}

/// Every worker slot runs the handshake in the fixed order, one customer at a time
#[test]
fn test_per_worker_handshake_sequence() {
    let config = OfficeConfig::default()
        .with_capacity(10)
        .with_worker_count(3)
        .with_customer_count(30)
        .with_millis_per_minute(3)
        .with_seed(5);
    let (report, events) = run_day(config, None);

    let mut per_worker: BTreeMap<WorkerId, Vec<OfficeEvent>> = BTreeMap::new();
    for event in events {
        if let Some(worker) = event.worker() {
            per_worker.entry(worker).or_default().push(event);
        }
    }
    assert_eq!(per_worker.len(), 3);

    let mut served_total = 0;
    for (worker, events) in &per_worker {
        assert_eq!(events[0], OfficeEvent::WorkerCreated { worker: *worker });
        let cycles = &events[1..];
        let mut chunks = cycles.chunks_exact(6);
        for cycle in &mut chunks {
            let customer = match cycle[1] {
                OfficeEvent::CustomerClaimsWorker { customer, .. } => customer,
                other => panic!("worker {worker}: expected claim, got {other:?}"),
            };
            assert!(matches!(cycle[0], OfficeEvent::WorkerIdle { .. }));
            assert!(matches!(
                cycle[2],
                OfficeEvent::WorkerAnnouncesIntent { customer: c, .. } if c == customer
            ));
            assert!(matches!(
                cycle[3],
                OfficeEvent::CustomerAnnouncesIntent { customer: c, .. } if c == customer
            ));
            assert!(matches!(
                cycle[4],
                OfficeEvent::TaskStarted { customer: c, .. } if c == customer
            ));
            assert!(matches!(
                cycle[5],
                OfficeEvent::TaskFinished { customer: c, .. } if c == customer
            ));
            served_total += 1;
        }
        // At most one trailing advertisement nobody claimed before shutdown.
        let rest = chunks.remainder();
        assert!(rest.len() <= 1);
        if let Some(last) = rest.first() {
            assert!(matches!(last, OfficeEvent::WorkerIdle { .. }));
        }
        assert_eq!(
            report.served_by(*worker),
            u64::try_from((cycles.len() - rest.len()) / 6).unwrap()
        );
    }
    assert_eq!(served_total, 30);
}

/// Package mailings never share the scale, even while several workers want it
#[test]
fn test_scale_is_exclusive() {
    let config = OfficeConfig::default()
        .with_capacity(10)
        .with_worker_count(3)
        .with_millis_per_minute(30);
    let (report, events) = run_day(config, Some(vec![Task::MailPackage; 11]));

    assert_eq!(report.count_of(Task::MailPackage), 11);
    assert_eq!(report.peak_scale_holders, 1);
    assert!(report.scale_waits > 0, "scale was never contended");

    let weighing_workers: BTreeSet<WorkerId> = events
        .iter()
        .filter_map(|e| match e {
            OfficeEvent::TaskStarted {
                worker,
                task: Task::MailPackage,
                ..
            } => Some(*worker),
            _ => None,
        })
        .collect();
    assert!(weighing_workers.len() > 1);
    let started = events
        .iter()
        .filter(|e| matches!(e, OfficeEvent::TaskStarted { task: Task::MailPackage, .. }))
        .count();
    assert_eq!(started, 11);
}

/// Sink that brings down whichever worker starts a task
struct FailingWorkerSink;

impl EventSink for FailingWorkerSink {
    fn record(&self, event: TimedEvent) {
        if matches!(event.event, OfficeEvent::TaskStarted { .. }) {
            panic!("worker died mid-service");
        }
    }
}

/// A dead worker aborts the run instead of stranding its customer
#[test]
fn test_worker_failure_aborts_run() {
    let config = OfficeConfig::default()
        .with_worker_count(1)
        .with_millis_per_minute(0);
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let result = Simulation::new(config)
            .with_events(Arc::new(FailingWorkerSink))
            .with_tasks(vec![Task::BuyStamps; 2])
            .run();
        let _ = tx.send(result);
    });

    let result = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("run should return after a worker fails");
    assert!(matches!(
        result,
        Err(OfficeError::ThreadPanicked { role: "worker", id: 0 })
    ));
}

/// A full default-sized day completes and every customer is served once
#[test]
fn test_full_day_liveness() {
    let config = OfficeConfig::default().with_millis_per_minute(0);
    let (report, events) = run_day(config, None);

    assert_eq!(report.visits.len(), 50);
    let served: u64 = report.workers.iter().map(|w| w.served).sum();
    assert_eq!(served, 50);
    for (id, visit) in report.visits.iter().enumerate() {
        assert_eq!(visit.customer.id, id);
        assert!(visit.worker < 3);
    }
    let joined = events
        .iter()
        .filter(|e| matches!(e, OfficeEvent::CustomerJoined { .. }))
        .count();
    assert_eq!(joined, 50);
}

/// With one seat and one worker, customers are served strictly one after another
#[test]
fn test_single_seat_serializes_customers() {
    let config = OfficeConfig::default()
        .with_capacity(1)
        .with_worker_count(1)
        .with_millis_per_minute(6);
    let (report, events) = run_day(config, Some(vec![Task::BuyStamps; 2]));

    assert_eq!(report.peak_scale_holders, 0);
    let order = admitted_order(&events);
    assert_eq!(order.len(), 2);
    let (first, second) = (order[0], order[1]);

    let position = |wanted: &OfficeEvent| events.iter().position(|e| e == wanted).unwrap();
    let first_departs = position(&OfficeEvent::CustomerDeparts { customer: first });
    let second_admitted = position(&OfficeEvent::CustomerAdmitted { customer: second });
    assert!(first_departs < second_admitted);

    let mut visits = report.visits.clone();
    visits.sort_by_key(|v| v.ticket);
    let by_ticket: Vec<usize> = visits.iter().map(|v| v.customer.id).collect();
    assert_eq!(by_ticket, vec![first, second]);
}

/// The third customer can only claim a worker that has come back to idle
#[test]
fn test_third_claim_waits_for_returning_worker() {
    let config = OfficeConfig::default()
        .with_capacity(10)
        .with_worker_count(2)
        .with_millis_per_minute(6);
    let (report, events) = run_day(config, Some(vec![Task::MailLetter; 3]));
    assert_eq!(report.visits.len(), 3);

    let nth = |n: usize, pred: &dyn Fn(&OfficeEvent) -> bool| {
        events
            .iter()
            .enumerate()
            .filter(|(_, e)| pred(e))
            .nth(n)
            .map(|(i, _)| i)
            .unwrap()
    };
    let third_idle = nth(2, &|e| matches!(e, OfficeEvent::WorkerIdle { .. }));
    let third_claim = nth(2, &|e| matches!(e, OfficeEvent::CustomerClaimsWorker { .. }));
    let first_finish = nth(0, &|e| matches!(e, OfficeEvent::TaskFinished { .. }));
    assert!(first_finish < third_idle);
    assert!(third_idle < third_claim);
}

/// Workers stop cleanly when nobody shows up
#[test]
fn test_empty_day_shuts_down_workers() {
    let config = OfficeConfig::default().with_customer_count(0);
    let (report, events) = run_day(config, None);
    assert!(report.visits.is_empty());
    assert_eq!(report.workers.len(), 3);
    assert!(report.workers.iter().all(|w| w.served == 0));
    assert!(events.iter().all(|e| e.customer().is_none()));
}

/// The report serializes to JSON for the command-line summary
#[test]
fn test_report_serializes() {
    let config = OfficeConfig::default()
        .with_customer_count(3)
        .with_millis_per_minute(0)
        .with_seed(1);
    let (report, _) = run_day(config, None);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["visits"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["config"]["seed"], 1);
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_async_from_tokio() {
    let config = OfficeConfig::default()
        .with_customer_count(12)
        .with_millis_per_minute(0);
    let report = Simulation::new(config)
        .with_events(Arc::new(post_office::core::NullEventSink))
        .run_async()
        .await
        .unwrap();
    assert_eq!(report.visits.len(), 12);
}
