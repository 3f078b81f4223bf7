pub(crate) mod common;
pub(crate) mod drift;
pub(crate) mod orbit;
pub(crate) mod orbital_state;
pub(crate) mod pid;
pub(crate) mod telemetry;

pub use drift::{DriftBounds, DriftModel, Perturbation};
pub use orbital_state::{OrbitalParams, OrbitalState};
pub use pid::{PidController, PidGains};
pub use telemetry::{HistoryEntry, PositionSample, TelemetryEntry};
