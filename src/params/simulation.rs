//! Per-tick simulation constants.

use crate::error::{Result, WaveError};

/// Render loop stepping parameters
#[derive(Debug, Clone)]
pub struct LoopParams {
    /// Simulation time added per tick (not wall-clock locked)
    pub time_step: f64,

    /// Initial simulation time
    pub start_time: f64,

    /// Fraction of the remaining pointer distance covered per tick, in (0, 1)
    pub pointer_smoothing: f32,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            start_time: 0.0,
            pointer_smoothing: 0.05,
        }
    }
}

impl LoopParams {
    /// Reject values that would stall or reverse the simulation
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step >= 0.0) {
            return Err(WaveError::InvalidParameter(format!(
                "time step must be finite and >= 0, got {}",
                self.time_step
            )));
        }
        if !(self.pointer_smoothing > 0.0 && self.pointer_smoothing < 1.0) {
            return Err(WaveError::InvalidParameter(format!(
                "pointer smoothing must be in (0, 1), got {}",
                self.pointer_smoothing
            )));
        }
        Ok(())
    }
}
