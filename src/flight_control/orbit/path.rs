use super::planet::Planet;
use crate::flight_control::{common::vec3d::Vec3D, orbital_state::OrbitalParams};
use std::f64::consts::TAU;

/// A sampled, inclined ellipse used to place the body for visualisation.
///
/// This is display geometry only: `r = a(1 - e²) / (1 + e·cos θ)` with
/// `a = planet radius + altitude`, tilted about the x-axis by the inclination.
/// No dynamics are propagated.
#[derive(Debug, Clone)]
pub struct OrbitPath {
    points: Vec<Vec3D<f64>>,
}

impl OrbitPath {
    /// Default number of samples along one revolution.
    pub const DEFAULT_SAMPLES: usize = 500;

    /// Samples the full orbit with `samples` points, first and last both at `θ = 0`/`2π`.
    pub fn compute(params: &OrbitalParams, planet: Planet, samples: usize) -> Self {
        let points =
            (0..samples).map(|i| Self::point_at(params, planet, Self::theta(i, samples))).collect();
        Self { points }
    }

    /// Position at sample `index` of a `samples`-point path, without building the path.
    /// `index` wraps modulo `samples`.
    pub fn position_at(
        params: &OrbitalParams,
        planet: Planet,
        samples: usize,
        index: usize,
    ) -> Vec3D<f64> {
        if samples == 0 {
            return Vec3D::zero();
        }
        Self::point_at(params, planet, Self::theta(index % samples, samples))
    }

    /// Position at true anomaly `theta` (radians).
    pub fn point_at(params: &OrbitalParams, planet: Planet, theta: f64) -> Vec3D<f64> {
        let a = planet.radius_km() + params.altitude;
        let e = params.eccentricity;
        let r = a * (1.0 - e.powi(2)) / (1.0 + e * theta.cos());
        let inc = params.inclination.to_radians();
        let (x_p, y_p) = (r * theta.cos(), r * theta.sin());
        Vec3D::new(x_p, y_p * inc.cos(), y_p * inc.sin())
    }

    #[allow(clippy::cast_precision_loss)]
    fn theta(index: usize, samples: usize) -> f64 {
        if samples < 2 { 0.0 } else { TAU * index as f64 / (samples - 1) as f64 }
    }

    /// The largest absolute in-plane (`x`/`y`) coordinate, used to fit the path into a view.
    pub fn extent(&self) -> f64 {
        self.points.iter().map(|p| p.x().abs().max(p.y().abs())).fold(0.0, f64::max)
    }

    pub fn points(&self) -> &[Vec3D<f64>] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
}
