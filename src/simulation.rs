//! The spatial point-process core: non-overlapping particle placement and
//! in-disk localization sampling, plus frame-uniform background noise.
//!
//! All randomness flows through one `StdRng` owned by the run; the draw order
//! (particle count, noise count, per-particle diameter/density/center, then
//! per-particle localizations, then noise) is the reproducibility contract.

use log::{debug, info, warn};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;
use smlm_common::{Dataset, Localization, Particle, SimError, SimParams, SimResult, Vec2};

/// Number of localizations a spherical particle should contain: its volume
/// times the requested volumetric density, rounded half away from zero.
///
/// Degenerate inputs (non-positive or non-finite expected counts, e.g. from a
/// negative sampled diameter or density) clamp to zero instead of failing.
pub fn localizations_per_particle(diameter: f64, density: f64) -> u64 {
    if !diameter.is_finite() || diameter <= 0.0 {
        return 0;
    }
    let r = diameter / 2.0;
    let volume = (4.0 / 3.0) * std::f64::consts::PI * r.powi(3);
    let expected = volume * density;
    if !expected.is_finite() || expected <= 0.0 {
        return 0;
    }
    expected.round() as u64
}

/// One simulation run: owns the parameters and the seeded RNG, produces a
/// `Dataset`. Runs are independent; for parallel batches give each run its
/// own seed.
pub struct Simulation {
    params: SimParams,
    rng: StdRng,
}

impl Simulation {
    /// Validates the parameters eagerly and seeds the run's RNG.
    pub fn new(params: SimParams, seed: u64) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Executes Placement -> Sampling and returns the finished dataset.
    pub fn run(mut self) -> SimResult<Dataset> {
        let n_particles = self.resolve_count(self.params.particles_min, self.params.particles_max);
        let noise_shots = self.resolve_count(self.params.noise_min, self.params.noise_max);
        info!(
            "Simulating {} particles and {} noise shots in a {:.0} x {:.0} nm frame.",
            n_particles, noise_shots, self.params.frame_width, self.params.frame_height
        );

        let particles = self.place_particles(n_particles)?;
        let localizations = self.sample_localizations(&particles, noise_shots)?;

        Ok(Dataset { particles, localizations })
    }

    // Half-open uniform draw when the bounds differ, else the fixed value.
    fn resolve_count(&mut self, min: u32, max: u32) -> u32 {
        if max != min {
            self.rng.random_range(min..max)
        } else {
            min
        }
    }

    /// Places `n_particles` non-overlapping particles by rejection sampling.
    ///
    /// The overlap test is asymmetric: every already-accepted center must be
    /// strictly further away than the NEW particle's diameter (not the sum of
    /// radii). Changing this would alter the simulated spatial statistics, so
    /// it is kept as-is. Comparing real distances (not squared) also keeps
    /// the degenerate negative-diameter case accepting any candidate.
    fn place_particles(&mut self, n_particles: u32) -> SimResult<Vec<Particle>> {
        let diameter_dist = Normal::new(self.params.diameter_mean, self.params.diameter_std)
            .map_err(|e| SimError::invalid(format!("diameter distribution: {e}")))?;
        let density_dist = Normal::new(self.params.density_mean, self.params.density_std)
            .map_err(|e| SimError::invalid(format!("density distribution: {e}")))?;
        let x_dist = Uniform::new(0.0, self.params.frame_width)
            .map_err(|e| SimError::invalid(format!("frame x range: {e}")))?;
        let y_dist = Uniform::new(0.0, self.params.frame_height)
            .map_err(|e| SimError::invalid(format!("frame y range: {e}")))?;

        let max_attempts = self.params.max_placement_attempts;
        let mut particles: Vec<Particle> = Vec::with_capacity(n_particles as usize);

        for index in 0..n_particles {
            let diameter = self.rng.sample(diameter_dist);
            let density = self.rng.sample(density_dist);

            let mut attempts = 0u32;
            let center = loop {
                if attempts == max_attempts {
                    return Err(SimError::PlacementInfeasible {
                        index,
                        placed: particles.len() as u32,
                        attempts,
                    });
                }
                attempts += 1;

                let candidate = Vec2::new(self.rng.sample(x_dist), self.rng.sample(y_dist));
                if particles.iter().all(|p| p.center.distance(candidate) > diameter) {
                    break candidate;
                }
            };

            debug!("Placed particle {} after {} attempt(s).", index + 1, attempts);
            particles.push(Particle {
                id: index + 1,
                center,
                diameter,
                density,
            });
        }

        Ok(particles)
    }

    /// Samples every particle's localizations and the background noise.
    ///
    /// Per-particle counts are fixed by the already-drawn diameters and
    /// densities, so they are computed up front and the output vector is
    /// allocated once.
    fn sample_localizations(
        &mut self,
        particles: &[Particle],
        noise_shots: u32,
    ) -> SimResult<Vec<Localization>> {
        let counts: Vec<u64> = particles
            .iter()
            .map(|p| {
                if p.diameter > 0.0 && p.diameter.is_finite() {
                    localizations_per_particle(p.diameter, p.density)
                } else {
                    warn!(
                        "Particle {} has degenerate diameter {}; it will contain no localizations.",
                        p.id, p.diameter
                    );
                    0
                }
            })
            .collect();
        let signal_total: u64 = counts.iter().sum();

        let width = self.params.frame_width;
        let height = self.params.frame_height;
        let max_attempts = self.params.max_localization_attempts;

        let mut localizations: Vec<Localization> =
            Vec::with_capacity(signal_total as usize + noise_shots as usize);
        let mut next_id: u64 = 1;

        for (particle, &count) in particles.iter().zip(&counts) {
            if count == 0 {
                continue;
            }
            let r = particle.radius();

            // Propose uniformly in the frame-clamped bounding box of the
            // disk, accept inside the disk. Acceptance is ~pi/4 for a disk
            // fully inside the frame, lower near the edges.
            let x_dist = Uniform::new((particle.center.x - r).max(0.0), (particle.center.x + r).min(width))
                .map_err(|e| SimError::invalid(format!("particle {} x range: {e}", particle.id)))?;
            let y_dist = Uniform::new((particle.center.y - r).max(0.0), (particle.center.y + r).min(height))
                .map_err(|e| SimError::invalid(format!("particle {} y range: {e}", particle.id)))?;

            for _ in 0..count {
                let mut attempts = 0u32;
                let position = loop {
                    if attempts == max_attempts {
                        return Err(SimError::SamplingStalled {
                            particle_id: particle.id,
                            attempts,
                        });
                    }
                    attempts += 1;

                    let candidate = Vec2::new(self.rng.sample(x_dist), self.rng.sample(y_dist));
                    if candidate.distance_squared(particle.center) <= r * r {
                        break candidate;
                    }
                };

                localizations.push(Localization {
                    id: next_id,
                    position,
                    particle_id: Some(particle.id),
                });
                next_id += 1;
            }
        }

        // Background shot noise: the frame itself is the support, so no
        // rejection is needed.
        let x_dist = Uniform::new(0.0, width)
            .map_err(|e| SimError::invalid(format!("frame x range: {e}")))?;
        let y_dist = Uniform::new(0.0, height)
            .map_err(|e| SimError::invalid(format!("frame y range: {e}")))?;
        for _ in 0..noise_shots {
            let position = Vec2::new(self.rng.sample(x_dist), self.rng.sample(y_dist));
            localizations.push(Localization {
                id: next_id,
                position,
                particle_id: None,
            });
            next_id += 1;
        }

        Ok(localizations)
    }
}

/// One-shot entry point: validate, seed, place, sample.
pub fn simulate(params: &SimParams, seed: u64) -> SimResult<Dataset> {
    Simulation::new(params.clone(), seed)?.run()
}
