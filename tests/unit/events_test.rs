//! Tests for facility events and sinks

use std::sync::Arc;

use post_office::core::{
    EventSink, NullEventSink, OfficeEvent, Task, TimedEvent, TracingEventSink,
};

#[test]
fn test_worker_side_lines() {
    assert_eq!(
        OfficeEvent::WorkerIdle { worker: 2 }.to_string(),
        "Postal worker 2 is free"
    );
    let started = OfficeEvent::TaskStarted {
        worker: 0,
        customer: 5,
        task: Task::MailLetter,
    };
    assert_eq!(
        started.to_string(),
        "Postal worker 0 starts mailing a letter for customer 5"
    );
    assert_eq!(
        OfficeEvent::CustomerJoined { customer: 5 }.to_string(),
        "Joined customer 5"
    );
}

#[test]
fn test_event_json_is_tagged() {
    let json = serde_json::to_value(OfficeEvent::CustomerClaimsWorker {
        customer: 3,
        worker: 1,
    })
    .unwrap();
    assert_eq!(json["kind"], "customer_claims_worker");
    assert_eq!(json["customer"], 3);
    assert_eq!(json["worker"], 1);
}

#[test]
fn test_timed_event_json_roundtrip() {
    let event = TimedEvent::now(OfficeEvent::TaskFinished {
        worker: 1,
        customer: 8,
        task: Task::MailPackage,
    });
    let json = serde_json::to_string(&event).unwrap();
    let back: TimedEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn test_sinks_as_trait_objects() {
    let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(NullEventSink), Arc::new(TracingEventSink)];
    for sink in sinks {
        sink.record(TimedEvent::now(OfficeEvent::WorkerCreated { worker: 0 }));
    }
}
