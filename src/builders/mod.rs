//! Builders to construct the facility from configuration.

pub mod office_builder;

pub use office_builder::build_office;
