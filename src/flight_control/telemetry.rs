use super::common::{ring_log::RingLog, vec3d::Vec3D};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// Snapshot of one control tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetryEntry {
    /// Wall-clock time of the tick.
    pub timestamp: DateTime<Utc>,
    /// Monotonic tick number, starting at 1.
    pub tick: u64,
    /// Orbital parameters after drift, before any correction.
    pub current_params: Vec3D<f64>,
    /// The live target read by this tick.
    pub target_params: Vec3D<f64>,
    /// The applied correction, `None` if the tick was on course.
    pub correction: Option<Vec3D<f64>>,
    pub on_course: bool,
}

impl Display for TelemetryEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Timestamp: {}", self.timestamp.format("%H:%M:%S%.3f"))?;
        writeln!(f, "Current Orbital Params: {:.4}", self.current_params)?;
        writeln!(f, "Target Orbital Params: {:.4}", self.target_params)?;
        match self.correction {
            Some(c) => writeln!(f, "Correction Vector: {c:.4}")?,
            None => writeln!(f, "Correction Vector: None")?,
        }
        write!(f, "Is On Course: {}", self.on_course)
    }
}

/// Altitude change caused by a tick in which a correction fired.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// `altitude_after_tick - altitude_before_tick` in kilometers.
    pub altitude_delta: f64,
}

impl Display for HistoryEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] Altitude Drift: {:.4}", self.timestamp.format("%H:%M:%S"), self.altitude_delta)
    }
}

/// Visualisation coordinate of the body at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionSample {
    pub tick: u64,
    pub position: Vec3D<f64>,
}

pub type TelemetryLog = RingLog<TelemetryEntry>;
pub type HistoryLog = RingLog<HistoryEntry>;
pub type PositionLog = RingLog<PositionSample>;
