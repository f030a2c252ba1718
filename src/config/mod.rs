//! Configuration models for the facility and its simulation driver.

pub mod office;

pub use office::OfficeConfig;
