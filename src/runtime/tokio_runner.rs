//! Running a simulation from async code on a Tokio runtime.

use crate::core::OfficeError;
use crate::runtime::simulation::{Simulation, SimulationReport};

impl Simulation {
    /// Run the simulation on Tokio's blocking pool so the async runtime is
    /// never stalled by the customer and worker threads being joined.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::run`]; a panicked or cancelled blocking task is
    /// reported as [`OfficeError::ThreadPanicked`] with role `"driver"`.
    pub async fn run_async(self) -> Result<SimulationReport, OfficeError> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .map_err(|_| OfficeError::ThreadPanicked {
                role: "driver",
                id: 0,
            })?
    }
}
