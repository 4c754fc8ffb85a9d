use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Configuration for the imaging frame
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FrameConfig {
    pub width_nm: f64,
    pub height_nm: f64,
}

// Particle population: count bounds and the diameter/density distributions
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ParticleConfig {
    pub count_min: u32,
    pub count_max: u32,
    pub diameter_mean_nm: f64,
    pub diameter_std_nm: f64,
    pub density_mean_per_nm3: f64,
    pub density_std_per_nm3: f64,
}

// Background shot noise bounds
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NoiseConfig {
    pub shots_min: u32,
    pub shots_max: u32,
}

// Random sampling knobs. The whole section may be omitted from the TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SamplingConfig {
    /// Master seed. If absent the driver draws one from the OS and logs it.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,
    #[serde(default = "default_max_localization_attempts")]
    pub max_localization_attempts: u32,
}

fn default_max_placement_attempts() -> u32 {
    100_000
}

fn default_max_localization_attempts() -> u32 {
    10_000
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            seed: None,
            max_placement_attempts: default_max_placement_attempts(),
            max_localization_attempts: default_max_localization_attempts(),
        }
    }
}

// Optional parameter sweep. Each field lists the values to sweep through for
// that parameter; a missing field keeps the base value from the sections
// above. One dataset folder is produced per combination.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SweepConfig {
    #[serde(default = "default_runs_per_condition")]
    pub runs_per_condition: u32,
    #[serde(default)]
    pub count_min: Option<Vec<u32>>,
    #[serde(default)]
    pub count_max: Option<Vec<u32>>,
    #[serde(default)]
    pub diameter_mean_nm: Option<Vec<f64>>,
    #[serde(default)]
    pub diameter_std_nm: Option<Vec<f64>>,
    #[serde(default)]
    pub density_mean_per_nm3: Option<Vec<f64>>,
    #[serde(default)]
    pub density_std_per_nm3: Option<Vec<f64>>,
    #[serde(default)]
    pub noise_min: Option<Vec<u32>>,
    #[serde(default)]
    pub noise_max: Option<Vec<u32>>,
}

fn default_runs_per_condition() -> u32 {
    1
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub directory: String,
    pub base_filename: String,
    pub format: Option<String>, // Output format: "csv", "json", "bincode"
}

// Main simulation configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub frame: FrameConfig,
    pub particles: ParticleConfig,
    pub noise: NoiseConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;

        // The run parameters carry the eager validation rules.
        config.get_sim_params().validate()?;

        if let Some(sweep) = &config.sweep {
            if sweep.runs_per_condition == 0 {
                anyhow::bail!("sweep.runs_per_condition must be greater than 0.");
            }
            let empty_u32 = |r: &Option<Vec<u32>>| r.as_ref().is_some_and(|v| v.is_empty());
            let empty_f64 = |r: &Option<Vec<f64>>| r.as_ref().is_some_and(|v| v.is_empty());
            if empty_u32(&sweep.count_min)
                || empty_u32(&sweep.count_max)
                || empty_f64(&sweep.diameter_mean_nm)
                || empty_f64(&sweep.diameter_std_nm)
                || empty_f64(&sweep.density_mean_per_nm3)
                || empty_f64(&sweep.density_std_per_nm3)
                || empty_u32(&sweep.noise_min)
                || empty_u32(&sweep.noise_max)
            {
                anyhow::bail!("sweep ranges must not be empty lists.");
            }
        }

        if config.output.base_filename.is_empty() {
            anyhow::bail!("output.base_filename must not be empty.");
        }

        Ok(config)
    }

    /// Converts the configuration into the runtime parameters of one run.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            frame_width: self.frame.width_nm,
            frame_height: self.frame.height_nm,
            particles_min: self.particles.count_min,
            particles_max: self.particles.count_max,
            diameter_mean: self.particles.diameter_mean_nm,
            diameter_std: self.particles.diameter_std_nm,
            density_mean: self.particles.density_mean_per_nm3,
            density_std: self.particles.density_std_per_nm3,
            noise_min: self.noise.shots_min,
            noise_max: self.noise.shots_max,
            max_placement_attempts: self.sampling.max_placement_attempts,
            max_localization_attempts: self.sampling.max_localization_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [frame]
        width_nm = 22272.0
        height_nm = 22272.0

        [particles]
        count_min = 100
        count_max = 100
        diameter_mean_nm = 100.0
        diameter_std_nm = 5.0
        density_mean_per_nm3 = 6.1115498e-4
        density_std_per_nm3 = 0.0

        [noise]
        shots_min = 1000
        shots_max = 1000

        [sampling]
        seed = 42
        max_placement_attempts = 5000

        [sweep]
        runs_per_condition = 10
        density_mean_per_nm3 = [1.52788745e-4, 6.1115498e-4]

        [output]
        directory = "output"
        base_filename = "storm"
        format = "csv"
    "#;

    #[test]
    fn full_config_parses() {
        let config = SimulationConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.sampling.seed, Some(42));
        assert_eq!(config.sampling.max_placement_attempts, 5000);
        // Omitted knob falls back to its default
        assert_eq!(config.sampling.max_localization_attempts, 10_000);

        let sweep = config.sweep.as_ref().unwrap();
        assert_eq!(sweep.runs_per_condition, 10);
        assert_eq!(sweep.density_mean_per_nm3.as_ref().unwrap().len(), 2);
        assert!(sweep.diameter_mean_nm.is_none());

        let params = config.get_sim_params();
        assert_eq!(params.frame_width, 22272.0);
        assert_eq!(params.density_mean, 6.1115498e-4);
    }

    #[test]
    fn sampling_and_sweep_sections_are_optional() {
        let minimal = r#"
            [frame]
            width_nm = 1000.0
            height_nm = 1000.0

            [particles]
            count_min = 1
            count_max = 1
            diameter_mean_nm = 100.0
            diameter_std_nm = 0.0
            density_mean_per_nm3 = 0.0
            density_std_per_nm3 = 0.0

            [noise]
            shots_min = 0
            shots_max = 0

            [output]
            directory = "out"
            base_filename = "run"
        "#;
        let config = SimulationConfig::from_toml_str(minimal).unwrap();
        assert!(config.sampling.seed.is_none());
        assert_eq!(config.sampling.max_placement_attempts, 100_000);
        assert!(config.sweep.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn invalid_bounds_rejected_eagerly() {
        let bad = FULL.replace("count_min = 100", "count_min = 200");
        assert!(SimulationConfig::from_toml_str(&bad).is_err());

        let bad = FULL.replace("width_nm = 22272.0", "width_nm = -1.0");
        assert!(SimulationConfig::from_toml_str(&bad).is_err());

        let bad = FULL.replace("diameter_std_nm = 5.0", "diameter_std_nm = -5.0");
        assert!(SimulationConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn empty_sweep_range_rejected() {
        let bad = FULL.replace(
            "density_mean_per_nm3 = [1.52788745e-4, 6.1115498e-4]",
            "density_mean_per_nm3 = []",
        );
        assert!(SimulationConfig::from_toml_str(&bad).is_err());
    }
}
