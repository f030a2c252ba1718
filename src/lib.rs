//! # Post Office
//!
//! A thread-per-actor simulation of a post office where customers and
//! postal workers coordinate only through counting semaphores and zero
//! capacity rendezvous channels.
//!
//! ## Facility
//!
//! - **Admission gate**: at most `capacity` customers inside, admitted in
//!   strict arrival order.
//! - **Worker pool**: idle workers advertise themselves; a customer claims
//!   exactly one and no worker is ever claimed twice.
//! - **Rendezvous channel**: one per worker, carrying the four step
//!   handshake (publish, acknowledge, proceed, complete).
//! - **Scale**: a single shared resource that package mailings hold
//!   exclusively.
//!
//! ## Running a day
//!
//! ```rust,ignore
//! use post_office::config::OfficeConfig;
//! use post_office::runtime::Simulation;
//!
//! let config = OfficeConfig::default()
//!     .with_customer_count(20)
//!     .with_millis_per_minute(10);
//! let report = Simulation::new(config).run()?;
//! println!("served {} customers", report.visits.len());
//! ```
//!
//! With the `tokio-runtime` feature, `Simulation::run_async` runs the same
//! day on Tokio's blocking pool.
//!
//! For complete scenarios, see `tests/post_office_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Facility primitives, the customer/worker protocol and event reporting.
pub mod core;
/// Configuration models for the facility and the simulated day.
pub mod config;
/// Builders to construct the facility from configuration.
pub mod builders;
/// Thread driver and async adapter.
pub mod runtime;
/// Shared utilities.
pub mod util;

mod semaphore;

pub use semaphore::Semaphore;
