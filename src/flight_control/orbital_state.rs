use super::common::vec3d::Vec3D;
use std::ops::RangeInclusive;

/// The three orbital parameters tracked by the station-keeping loop.
#[derive(Debug, PartialEq, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct OrbitalParams {
    /// Altitude above the planet surface in kilometers.
    pub altitude: f64,
    /// Inclination in degrees.
    pub inclination: f64,
    /// Unitless orbital eccentricity.
    pub eccentricity: f64,
}

impl OrbitalParams {
    pub const fn new(altitude: f64, inclination: f64, eccentricity: f64) -> Self {
        Self { altitude, inclination, eccentricity }
    }

    /// Returns the parameters as `(altitude, inclination, eccentricity)` vector.
    pub const fn as_vec(&self) -> Vec3D<f64> {
        Vec3D::new(self.altitude, self.inclination, self.eccentricity)
    }

    /// Checks whether inclination and eccentricity already lie inside the clamp ranges.
    pub fn in_bounds(&self) -> bool {
        OrbitalState::INCLINATION_RANGE.contains(&self.inclination)
            && OrbitalState::ECCENTRICITY_RANGE.contains(&self.eccentricity)
    }
}

impl From<Vec3D<f64>> for OrbitalParams {
    fn from(vec: Vec3D<f64>) -> Self { Self::new(vec.x(), vec.y(), vec.z()) }
}

impl std::fmt::Display for OrbitalParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Alt={:.2}, Inc={:.2}, Ecc={:.2}",
            self.altitude, self.inclination, self.eccentricity
        )
    }
}

/// Mutable orbital state of the simulated body.
///
/// Inclination and eccentricity are clamped after every mutation, so out-of-range
/// inputs never surface as errors.
#[derive(Debug, Clone)]
pub struct OrbitalState {
    params: OrbitalParams,
}

impl OrbitalState {
    /// Valid inclination values in degrees.
    pub const INCLINATION_RANGE: RangeInclusive<f64> = 0.0..=180.0;
    /// Valid eccentricity values. Closed orbits only.
    pub const ECCENTRICITY_RANGE: RangeInclusive<f64> = 0.0..=0.99;

    /// Creates a new [`OrbitalState`] from `initial`, clamping it into range.
    pub fn new(initial: OrbitalParams) -> Self {
        let mut state = Self { params: initial };
        state.clamp();
        state
    }

    pub fn params(&self) -> OrbitalParams { self.params }
    pub fn altitude(&self) -> f64 { self.params.altitude }
    pub fn inclination(&self) -> f64 { self.params.inclination }
    pub fn eccentricity(&self) -> f64 { self.params.eccentricity }

    /// Adds a correction vector `[altitude, inclination, eccentricity]` to the state.
    ///
    /// # Arguments
    /// - `correction`: The raw correction components.
    ///
    /// # Returns
    /// - `true` if the correction was applied, `false` if `correction` did not hold
    ///   exactly three components and was ignored.
    pub fn apply_correction(&mut self, correction: &[f64]) -> bool {
        match Vec3D::from_slice(correction) {
            Some(delta) => {
                self.shift(delta);
                true
            }
            None => false,
        }
    }

    /// Adds `delta` component-wise and re-establishes the clamp invariants.
    pub fn shift(&mut self, delta: Vec3D<f64>) {
        self.params = OrbitalParams::from(self.params.as_vec() + delta);
        self.clamp();
    }

    /// Jumps directly to `params`, clamping them into range.
    pub fn set_params(&mut self, params: OrbitalParams) {
        self.params = params;
        self.clamp();
    }

    fn clamp(&mut self) {
        let inc = Self::INCLINATION_RANGE;
        let ecc = Self::ECCENTRICITY_RANGE;
        self.params.inclination = clamp_nan(self.params.inclination, *inc.start(), *inc.end());
        self.params.eccentricity = clamp_nan(self.params.eccentricity, *ecc.start(), *ecc.end());
    }
}

/// Clamps `value` into `[min, max]`. `NaN` collapses to `min` so the range
/// invariant holds for every input.
fn clamp_nan(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}
