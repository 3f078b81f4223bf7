use super::{common::vec3d::Vec3D, orbital_state::OrbitalState};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Anything that disturbs the orbital state once per tick.
pub trait Perturbation: Send {
    /// Applies one perturbation step to `state`.
    fn perturb(&mut self, state: &mut OrbitalState);
}

/// Per-tick bounds of the random drift, each a half-open interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DriftBounds {
    /// Altitude lost per tick in kilometers (atmospheric drag).
    pub altitude_decay: (f64, f64),
    /// Signed inclination noise in degrees.
    pub inclination_noise: (f64, f64),
    /// Signed eccentricity noise.
    pub eccentricity_noise: (f64, f64),
}

impl DriftBounds {
    pub fn intervals(&self) -> [(f64, f64); 3] {
        [self.altitude_decay, self.inclination_noise, self.eccentricity_noise]
    }
}

impl Default for DriftBounds {
    fn default() -> Self {
        Self {
            altitude_decay: (0.01, 0.05),
            inclination_noise: (-0.01, 0.01),
            eccentricity_noise: (-0.001, 0.001),
        }
    }
}

/// Stochastic drift: independent uniform increments every tick, no memory between ticks.
#[derive(Debug)]
pub struct DriftModel {
    bounds: DriftBounds,
    rng: StdRng,
}

impl DriftModel {
    /// Creates a new [`DriftModel`].
    ///
    /// # Arguments
    /// - `bounds`: The per-tick drift intervals.
    /// - `seed`: A fixed seed for reproducible runs, or `None` to seed from the OS.
    pub fn new(bounds: DriftBounds, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { bounds, rng }
    }

    /// Draws the next drift increment `(altitude, inclination, eccentricity)`.
    pub fn sample(&mut self) -> Vec3D<f64> {
        let decay = self.uniform(self.bounds.altitude_decay);
        let inc = self.uniform(self.bounds.inclination_noise);
        let ecc = self.uniform(self.bounds.eccentricity_noise);
        Vec3D::new(-decay, inc, ecc)
    }

    /// Degenerate intervals yield their lower bound instead of panicking in `random_range`.
    fn uniform(&mut self, (min, max): (f64, f64)) -> f64 {
        if min < max { self.rng.random_range(min..max) } else { min }
    }
}

impl Perturbation for DriftModel {
    fn perturb(&mut self, state: &mut OrbitalState) {
        let delta = self.sample();
        state.shift(delta);
    }
}
