//! SMLM (e.g. STORM) dataset synthesizer. The core is a pure in-memory
//! generator (`simulate`); persistence and the parameter-sweep driver are
//! thin layers over it.

pub mod output;
pub mod simulation;
pub mod sweep;

pub use simulation::{localizations_per_particle, simulate, Simulation};
