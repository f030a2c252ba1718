//! Thread driver: spawns workers and customers, joins them, shuts down.

pub mod assign;
pub mod simulation;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_runner;

pub use assign::{customers_from_tasks, random_tasks};
pub use simulation::{Simulation, SimulationReport};
