//! Dataset persistence. CSV is the canonical format consumed downstream;
//! JSON and bincode dumps of the whole dataset are available for tooling.

use anyhow::Result;
use log::{info, warn};
use smlm_common::Dataset;
use std::fs::{self, File};
use std::path::Path;

pub const PARTICLE_HEADERS: [&str; 5] =
    ["particle id", "y [nm]", "x [nm]", "diameter [nm]", "density [per nm^3]"];
pub const LOCALIZATION_HEADERS: [&str; 4] = ["id", "y [nm]", "x [nm]", "particle id"];

/// Writes a dataset into `directory` (created if missing) under
/// `base_filename`. Unknown formats fall back to CSV with a warning.
pub fn save_dataset(
    dataset: &Dataset,
    directory: &Path,
    base_filename: &str,
    format: Option<&str>,
) -> Result<()> {
    fs::create_dir_all(directory)?;

    match format.unwrap_or("csv") {
        "csv" => write_csv(dataset, directory, base_filename),
        "json" => {
            let path = directory.join(format!("{}_dataset.json", base_filename));
            let file = File::create(&path)?;
            serde_json::to_writer(file, dataset)?;
            info!("Dataset saved to {}", path.display());
            Ok(())
        }
        "bincode" => {
            let path = directory.join(format!("{}_dataset.bin", base_filename));
            let file = File::create(&path)?;
            bincode::serialize_into(file, dataset)?;
            info!("Dataset saved to {} (binary format)", path.display());
            Ok(())
        }
        other => {
            warn!("Unknown output format: {}. Using CSV instead.", other);
            write_csv(dataset, directory, base_filename)
        }
    }
}

fn write_csv(dataset: &Dataset, directory: &Path, base_filename: &str) -> Result<()> {
    // Ground-truth table. Column order (y before x) and nm units are part of
    // the downstream contract.
    let particles_path = directory.join(format!("{}_particles.csv", base_filename));
    let mut writer = csv::Writer::from_path(&particles_path)?;
    writer.write_record(PARTICLE_HEADERS)?;
    for p in &dataset.particles {
        writer.write_record(&[
            p.id.to_string(),
            format!("{:.4}", p.center.y),
            format!("{:.4}", p.center.x),
            format!("{:.4}", p.diameter),
            p.density.to_string(),
        ])?;
    }
    writer.flush()?;
    info!("Particles saved to {}", particles_path.display());

    // Observation table. The particle id field is left empty for noise.
    let localizations_path = directory.join(format!("{}_localizations.csv", base_filename));
    let mut writer = csv::Writer::from_path(&localizations_path)?;
    writer.write_record(LOCALIZATION_HEADERS)?;
    for l in &dataset.localizations {
        writer.write_record(&[
            l.id.to_string(),
            format!("{:.4}", l.position.y),
            format!("{:.4}", l.position.x),
            l.particle_id.map(|id| id.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    info!("Localizations saved to {}", localizations_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smlm_common::{Localization, Particle, Vec2};

    fn sample_dataset() -> Dataset {
        Dataset {
            particles: vec![Particle {
                id: 1,
                center: Vec2::new(100.0, 200.0),
                diameter: 100.0,
                density: 6.1115498e-4,
            }],
            localizations: vec![
                Localization { id: 1, position: Vec2::new(110.0, 190.0), particle_id: Some(1) },
                Localization { id: 2, position: Vec2::new(5.0, 6.0), particle_id: None },
            ],
        }
    }

    #[test]
    fn csv_roundtrip_preserves_schema() {
        let dir = std::env::temp_dir().join(format!("smlm-output-test-{}", std::process::id()));
        save_dataset(&sample_dataset(), &dir, "run", Some("csv")).unwrap();

        let mut reader = csv::Reader::from_path(dir.join("run_localizations.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), LOCALIZATION_HEADERS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        // Signal row carries its particle id, noise row an empty field.
        assert_eq!(&rows[0][3], "1");
        assert_eq!(&rows[1][3], "");
        // y comes before x.
        assert_eq!(&rows[0][1], "190.0000");
        assert_eq!(&rows[0][2], "110.0000");

        let mut reader = csv::Reader::from_path(dir.join("run_particles.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), PARTICLE_HEADERS.to_vec());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][4], "0.00061115498");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unknown_format_falls_back_to_csv() {
        let dir = std::env::temp_dir().join(format!("smlm-output-fallback-{}", std::process::id()));
        save_dataset(&sample_dataset(), &dir, "run", Some("parquet")).unwrap();
        assert!(dir.join("run_particles.csv").exists());
        assert!(dir.join("run_localizations.csv").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
