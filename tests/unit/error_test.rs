//! Tests for error types

use post_office::core::OfficeError;

#[test]
fn test_protocol_violation_error() {
    let err = OfficeError::violation(2, "publish while idle");
    assert_eq!(format!("{err}"), "protocol violation on slot 2: publish while idle");
}

#[test]
fn test_permit_overflow_error() {
    let err = OfficeError::PermitOverflow { max: 1 };
    assert_eq!(format!("{err}"), "semaphore released beyond its limit of 1 permits");
}

#[test]
fn test_interrupted_error() {
    assert_eq!(format!("{}", OfficeError::Interrupted), "wait interrupted by shutdown");
}

#[test]
fn test_invalid_config_error() {
    let err = OfficeError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_thread_panicked_error() {
    let err = OfficeError::ThreadPanicked {
        role: "worker",
        id: 1,
    };
    assert_eq!(format!("{err}"), "worker thread 1 panicked");
}

#[test]
fn test_spawn_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
    let err = OfficeError::from(io);
    assert!(matches!(err, OfficeError::Spawn(_)));
    assert!(format!("{err}").starts_with("failed to spawn thread"));
}

#[test]
fn test_converts_into_anyhow() {
    let result: post_office::core::AppResult<()> = Err(OfficeError::Interrupted.into());
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<OfficeError>().is_some());
}
