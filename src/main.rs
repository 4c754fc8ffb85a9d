use anyhow::Result;
use log::{debug, info};
use rand::Rng;
use std::path::Path;
use std::time::Instant;

use smlm_common::SimulationConfig;
use smlm_engine::{output, simulate, sweep};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting SMLM dataset synthesizer...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;

    // --- Resolve Master Seed ---
    // A run without a configured seed still gets a logged one, so any dataset
    // can be regenerated.
    let seed = config.sampling.seed.unwrap_or_else(|| rand::rng().random());
    info!("Master seed: {}", seed);

    if config.sweep.is_some() {
        // --- Parameter Sweep ---
        info!("Using {} Rayon threads.", rayon::current_num_threads());
        sweep::run_sweep(&config, seed)?;
    } else {
        // --- Single Run ---
        let params = config.get_sim_params();
        debug!("Run parameters: {:#?}", params);

        let start_time = Instant::now();
        let dataset = simulate(&params, seed)?;
        info!(
            "Generated {} particles and {} localizations ({} signal, {} noise) in {:.3} s.",
            dataset.particles.len(),
            dataset.localizations.len(),
            dataset.signal_count(),
            dataset.noise_count(),
            start_time.elapsed().as_secs_f64()
        );

        // --- Save Output ---
        output::save_dataset(
            &dataset,
            Path::new(&config.output.directory),
            &config.output.base_filename,
            config.output.format.as_deref(),
        )?;
    }

    info!("Done.");
    Ok(())
}
