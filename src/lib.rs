pub mod cli;
pub mod error;
pub mod flow;
pub mod global_variables;
pub mod io;

pub use error::{CfdError, CfdResult};
pub use global_variables::*;

use std::time::Duration;

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum FlowMode {
    /// Potential flow: Laplace equation for the stream function only.
    Irrotational,
    /// Vorticity transport coupled to the stream function. `reynolds` is
    /// already divided by the scale factor.
    Rotational { reynolds: Float },
}

impl FlowMode {
    pub fn is_rotational(&self) -> bool {
        matches!(self, FlowMode::Rotational { .. })
    }
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub iterations: usize,
    pub error: Float,
    pub converged: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn time_per_iteration(&self) -> Float {
        match self.iterations {
            0 => 0.0,
            n => self.elapsed.as_secs_f64() / n as Float,
        }
    }

    pub fn iterations_per_second(&self) -> Float {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.iterations as Float / seconds
        } else {
            0.0
        }
    }
}
