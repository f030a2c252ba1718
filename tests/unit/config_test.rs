//! Tests for configuration validation

use std::time::Duration;

use post_office::config::office::{ENV_CAPACITY, ENV_SEED, ENV_WORKERS};
use post_office::config::OfficeConfig;
use post_office::core::Task;

#[test]
fn test_office_config_validation() {
    assert!(OfficeConfig::default().validate().is_ok());
}

#[test]
fn test_office_config_invalid_capacity() {
    let invalid = OfficeConfig::default().with_capacity(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_office_config_invalid_worker_count() {
    let invalid = OfficeConfig::default().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_zero_customers_is_valid() {
    assert!(OfficeConfig::default().with_customer_count(0).validate().is_ok());
}

#[test]
fn test_from_json_partial() {
    let cfg = OfficeConfig::from_json_str(r#"{"capacity": 2, "seed": 9}"#).unwrap();
    assert_eq!(cfg.capacity, 2);
    assert_eq!(cfg.seed, Some(9));
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.customer_count, 50);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(OfficeConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
    assert!(OfficeConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_serde_roundtrip() {
    let cfg = OfficeConfig::default().with_seed(42).with_millis_per_minute(6);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(OfficeConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_service_times_scale_with_minute_length() {
    let cfg = OfficeConfig::default();
    assert_eq!(cfg.service_time(Task::BuyStamps), Duration::from_millis(1000));
    assert_eq!(cfg.service_time(Task::MailLetter), Duration::from_millis(1500));
    assert_eq!(cfg.service_time(Task::MailPackage), Duration::from_millis(2000));

    let instant = cfg.with_millis_per_minute(0);
    assert_eq!(instant.service_time(Task::MailPackage), Duration::ZERO);
}

#[test]
fn test_huge_minute_length_does_not_overflow() {
    let cfg = OfficeConfig::from_json_str(r#"{"millis_per_minute": 1000000000000000000}"#).unwrap();
    let package = cfg.service_time(Task::MailPackage);
    assert_eq!(package, Duration::from_millis(u64::MAX / 60));
    assert!(cfg.service_time(Task::BuyStamps) <= package);
}

#[test]
fn test_from_env_overrides() {
    // Only this test touches POST_OFFICE_* variables.
    std::env::set_var(ENV_CAPACITY, "4");
    std::env::set_var(ENV_WORKERS, " 2 ");
    std::env::set_var(ENV_SEED, "11");
    let cfg = OfficeConfig::from_env().unwrap();
    assert_eq!(cfg.capacity, 4);
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.seed, Some(11));

    std::env::set_var(ENV_WORKERS, "many");
    assert!(OfficeConfig::from_env().is_err());

    std::env::remove_var(ENV_CAPACITY);
    std::env::remove_var(ENV_WORKERS);
    std::env::remove_var(ENV_SEED);
}
