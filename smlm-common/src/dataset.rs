use serde::{Deserialize, Serialize};

use crate::vecmath::Vec2;

/// Ground truth for one simulated spherical particle projected onto the frame.
///
/// Diameters are normal draws with no lower clamp, so a wide std can produce
/// a non-positive diameter; such a particle keeps its ground-truth row but
/// contributes no localizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// 1-based id, assigned in placement order.
    pub id: u32,
    /// Center position in nm.
    pub center: Vec2,
    /// Diameter in nm.
    pub diameter: f64,
    /// Localization density in localizations per nm^3.
    pub density: f64,
}

impl Particle {
    #[inline(always)]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// One simulated detection event, either bound to a particle or background
/// noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    /// 1-based id, contiguous across signal and noise detections.
    pub id: u64,
    /// Position in nm, always within the frame.
    pub position: Vec2,
    /// Owning particle id, `None` for background noise.
    pub particle_id: Option<u32>,
}

/// The in-memory output of one simulation run: the ground-truth particle set
/// and the observed localization set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub particles: Vec<Particle>,
    pub localizations: Vec<Localization>,
}

impl Dataset {
    /// Number of particle-bound (non-noise) localizations.
    pub fn signal_count(&self) -> usize {
        self.localizations.iter().filter(|l| l.particle_id.is_some()).count()
    }

    /// Number of background noise localizations.
    pub fn noise_count(&self) -> usize {
        self.localizations.len() - self.signal_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_and_noise_counts() {
        let ds = Dataset {
            particles: vec![],
            localizations: vec![
                Localization { id: 1, position: Vec2::new(1.0, 2.0), particle_id: Some(1) },
                Localization { id: 2, position: Vec2::new(3.0, 4.0), particle_id: None },
                Localization { id: 3, position: Vec2::new(5.0, 6.0), particle_id: Some(1) },
            ],
        };
        assert_eq!(ds.signal_count(), 2);
        assert_eq!(ds.noise_count(), 1);
    }
}
