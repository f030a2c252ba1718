//! Facility and simulation configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::Task;

/// Environment variable for [`OfficeConfig::capacity`].
pub const ENV_CAPACITY: &str = "POST_OFFICE_CAPACITY";
/// Environment variable for [`OfficeConfig::worker_count`].
pub const ENV_WORKERS: &str = "POST_OFFICE_WORKERS";
/// Environment variable for [`OfficeConfig::customer_count`].
pub const ENV_CUSTOMERS: &str = "POST_OFFICE_CUSTOMERS";
/// Environment variable for [`OfficeConfig::millis_per_minute`].
pub const ENV_MILLIS_PER_MINUTE: &str = "POST_OFFICE_MILLIS_PER_MINUTE";
/// Environment variable for [`OfficeConfig::seed`].
pub const ENV_SEED: &str = "POST_OFFICE_SEED";

/// Post office configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    /// Customers allowed inside at once.
    pub capacity: usize,
    /// Postal workers (fixed for the run).
    pub worker_count: usize,
    /// Customers to simulate.
    pub customer_count: usize,
    /// Real milliseconds per simulated minute. 0 disables service delays.
    pub millis_per_minute: u64,
    /// Seed for task assignment; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            worker_count: 3,
            customer_count: 50,
            millis_per_minute: 1000,
            seed: None,
        }
    }
}

impl OfficeConfig {
    /// Set the facility capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the number of customers.
    #[must_use]
    pub const fn with_customer_count(mut self, customer_count: usize) -> Self {
        self.customer_count = customer_count;
        self
    }

    /// Set the length of a simulated minute in real milliseconds.
    #[must_use]
    pub const fn with_millis_per_minute(mut self, millis_per_minute: u64) -> Self {
        self.millis_per_minute = millis_per_minute;
        self
    }

    /// Fix the task assignment seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Real service time for `task` under this configuration.
    pub const fn service_time(&self, task: Task) -> Duration {
        task.duration(self.millis_per_minute)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `POST_OFFICE_*` environment variables, after
    /// loading a `.env` file if one exists. Unset variables keep defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Some(capacity) = env_var(ENV_CAPACITY)? {
            cfg.capacity = capacity;
        }
        if let Some(workers) = env_var(ENV_WORKERS)? {
            cfg.worker_count = workers;
        }
        if let Some(customers) = env_var(ENV_CUSTOMERS)? {
            cfg.customer_count = customers;
        }
        if let Some(millis) = env_var(ENV_MILLIS_PER_MINUTE)? {
            cfg.millis_per_minute = millis;
        }
        if let Some(seed) = env_var(ENV_SEED)? {
            cfg.seed = Some(seed);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{name}={raw:?}: {e}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{name}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_office() {
        let cfg = OfficeConfig::default();
        assert_eq!(cfg.capacity, 10);
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.customer_count, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_service_time_uses_minute_length() {
        let cfg = OfficeConfig::default().with_millis_per_minute(60);
        assert_eq!(cfg.service_time(Task::MailLetter), Duration::from_millis(90));
    }
}
