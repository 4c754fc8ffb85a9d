use thiserror::Error;

/// Failures a simulation run can surface to the caller.
///
/// A sampled diameter that turns out non-positive is deliberately NOT an
/// error: such a particle simply contributes zero localizations and the run
/// continues (see `smlm-engine`'s sampler).
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error(
        "placement infeasible: particle {index} could not be placed after {attempts} attempts \
         ({placed} already placed)"
    )]
    PlacementInfeasible { index: u32, placed: u32, attempts: u32 },

    #[error("localization sampling stalled for particle {particle_id} after {attempts} attempts")]
    SamplingStalled { particle_id: u32, attempts: u32 },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimError::InvalidParameters { reason: reason.into() }
    }
}
