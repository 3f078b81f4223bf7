use super::loop_state::LoopState;
use crate::flight_control::{
    HistoryEntry, OrbitalParams, PositionSample, TelemetryEntry, orbit::Planet,
};

/// Reconfiguration requests handed to the worker, applied before its next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetTarget(OrbitalParams),
    CorrectToDefault,
    ResetController,
    SetHistoryRecording(bool),
    ClearHistory,
    SetPlanet(Planet),
    SetOrbitSpeed(f64),
}

/// Owned snapshots pushed to observers after each tick or lifecycle change.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    Telemetry(TelemetryEntry),
    Drift(HistoryEntry),
    Position(PositionSample),
    Status(LoopState),
}

/// Result of [`super::ControlLoop::stop`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StopOutcome {
    /// The worker observed the stop request and exited.
    Stopped,
    /// The loop was not running.
    AlreadyStopped,
    /// The worker did not exit within the stop timeout and was left detached.
    TimedOut,
}
