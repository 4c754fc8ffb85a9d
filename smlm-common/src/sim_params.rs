use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Runtime parameters for a single simulation run, derived from the
/// configuration. All lengths are in nanometers, densities in
/// localizations per nm^3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Frame
    pub frame_width: f64,
    pub frame_height: f64,

    // Particles
    pub particles_min: u32,
    pub particles_max: u32,
    pub diameter_mean: f64,
    pub diameter_std: f64,
    pub density_mean: f64,
    pub density_std: f64,

    // Background noise
    pub noise_min: u32,
    pub noise_max: u32,

    // Retry bounds for the rejection-sampling loops
    pub max_placement_attempts: u32,
    pub max_localization_attempts: u32,
}

impl SimParams {
    /// Eager validation, run before any sampling begins.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.frame_width > 0.0) || !self.frame_width.is_finite() {
            return Err(SimError::invalid(format!(
                "frame_width must be positive and finite, got {}",
                self.frame_width
            )));
        }
        if !(self.frame_height > 0.0) || !self.frame_height.is_finite() {
            return Err(SimError::invalid(format!(
                "frame_height must be positive and finite, got {}",
                self.frame_height
            )));
        }
        if self.particles_min > self.particles_max {
            return Err(SimError::invalid(format!(
                "particles_min ({}) > particles_max ({})",
                self.particles_min, self.particles_max
            )));
        }
        if self.noise_min > self.noise_max {
            return Err(SimError::invalid(format!(
                "noise_min ({}) > noise_max ({})",
                self.noise_min, self.noise_max
            )));
        }
        if !self.diameter_mean.is_finite() {
            return Err(SimError::invalid("diameter_mean must be finite"));
        }
        if !(self.diameter_std >= 0.0) || !self.diameter_std.is_finite() {
            return Err(SimError::invalid(format!(
                "diameter_std must be >= 0 and finite, got {}",
                self.diameter_std
            )));
        }
        if !self.density_mean.is_finite() {
            return Err(SimError::invalid("density_mean must be finite"));
        }
        if !(self.density_std >= 0.0) || !self.density_std.is_finite() {
            return Err(SimError::invalid(format!(
                "density_std must be >= 0 and finite, got {}",
                self.density_std
            )));
        }
        if self.max_placement_attempts == 0 {
            return Err(SimError::invalid("max_placement_attempts must be > 0"));
        }
        if self.max_localization_attempts == 0 {
            return Err(SimError::invalid("max_localization_attempts must be > 0"));
        }
        Ok(())
    }
}
