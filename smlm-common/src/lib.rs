pub mod config;
pub mod dataset;
pub mod error;
pub mod sim_params;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    FrameConfig, NoiseConfig, OutputConfig, ParticleConfig, SamplingConfig, SimulationConfig,
    SweepConfig,
};
pub use dataset::{Dataset, Localization, Particle};
pub use error::{SimError, SimResult};
pub use sim_params::SimParams;
pub use vecmath::Vec2;
