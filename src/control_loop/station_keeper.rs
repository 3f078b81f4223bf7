use super::signal::ControlCommand;
use crate::config::LoopConfig;
use crate::flight_control::{
    DriftModel, HistoryEntry, OrbitalParams, OrbitalState, Perturbation, PidController,
    PositionSample, TelemetryEntry,
    common::vec3d::Vec3D,
    orbit::{OrbitPath, Planet},
    telemetry::{HistoryLog, PositionLog, TelemetryLog},
};
use crate::{ctrl, event, info, warn};
use chrono::Utc;

/// Everything a single tick produced, handed on to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub telemetry: TelemetryEntry,
    /// Present only while recording history and a correction fired.
    pub history: Option<HistoryEntry>,
    pub position: PositionSample,
    /// Altitude change across the whole tick, drift and correction included.
    pub altitude_delta: f64,
}

/// The synchronous station-keeping core: plant, drift, controller, and logs.
///
/// Owned by the control worker, which is its only writer while the loop runs.
pub struct StationKeeper {
    state: OrbitalState,
    drift: Box<dyn Perturbation>,
    pid: PidController,
    target: OrbitalParams,
    default_target: OrbitalParams,
    threshold: f64,
    recording_history: bool,
    planet: Planet,
    orbit_speed: f64,
    orbit_samples: usize,
    /// Fractional sample index of the body on its visualisation path.
    phase: f64,
    tick_count: u64,
    correction_count: u64,
    telemetry: TelemetryLog,
    history: HistoryLog,
    positions: PositionLog,
}

impl StationKeeper {
    /// Creates a core starting exactly on the default target with random drift.
    pub fn new(config: &LoopConfig) -> Self {
        let drift = DriftModel::new(config.drift, config.drift_seed);
        Self::with_perturbation(config, Box::new(drift))
    }

    /// Creates a core with a caller-supplied perturbation source.
    pub fn with_perturbation(config: &LoopConfig, drift: Box<dyn Perturbation>) -> Self {
        Self {
            state: OrbitalState::new(config.default_target),
            drift,
            pid: PidController::new(config.gains),
            target: config.default_target,
            default_target: config.default_target,
            threshold: config.on_course_threshold,
            recording_history: false,
            planet: config.planet,
            orbit_speed: config.orbit_speed,
            orbit_samples: config.orbit_samples,
            phase: 0.0,
            tick_count: 0,
            correction_count: 0,
            telemetry: TelemetryLog::new(config.telemetry_capacity),
            history: HistoryLog::new(config.history_capacity),
            positions: PositionLog::new(config.position_capacity),
        }
    }

    /// Runs one control tick: drift, on-course check, optional correction, logging.
    pub fn tick(&mut self) -> TickReport {
        let initial_altitude = self.state.altitude();
        self.drift.perturb(&mut self.state);

        let current = self.state.params().as_vec();
        let target = self.target.as_vec();
        let error_magnitude = current.euclid_distance(&target);
        let on_course = error_magnitude < self.threshold;

        let correction = if on_course {
            event!("On course at error norm {error_magnitude:.4}");
            None
        } else {
            let correction = self.pid.compute(target, current);
            self.state.apply_correction(&correction.to_array());
            self.correction_count += 1;
            event!("Correction {correction:.4} applied at error norm {error_magnitude:.4}");
            Some(correction)
        };
        let altitude_delta = self.state.altitude() - initial_altitude;

        self.tick_count += 1;
        let timestamp = Utc::now();
        let telemetry = TelemetryEntry {
            timestamp,
            tick: self.tick_count,
            current_params: current,
            target_params: target,
            correction,
            on_course,
        };
        self.telemetry.push(telemetry.clone());

        let history = (self.recording_history && correction.is_some())
            .then_some(HistoryEntry { timestamp, altitude_delta });
        if let Some(entry) = history {
            self.history.push(entry);
        }

        self.advance_phase();
        let position = PositionSample { tick: self.tick_count, position: self.current_position() };
        self.positions.push(position);

        TickReport { telemetry, history, position, altitude_delta }
    }

    /// Applies a reconfiguration request.
    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::SetTarget(params) => {
                self.target = params;
                info!("New target parameters set to: {params}");
            }
            ControlCommand::CorrectToDefault => {
                self.state.set_params(self.default_target);
                self.pid.reset();
                ctrl!("Orbit corrected to default: {}", self.default_target);
            }
            ControlCommand::ResetController => {
                self.pid.reset();
                ctrl!("PID controller reset");
            }
            ControlCommand::SetHistoryRecording(enabled) => {
                self.recording_history = enabled;
                info!("History recording {}", if enabled { "enabled" } else { "disabled" });
            }
            ControlCommand::ClearHistory => self.history.clear(),
            ControlCommand::SetPlanet(planet) => {
                self.planet = planet;
                info!("Central body set to {planet}");
            }
            ControlCommand::SetOrbitSpeed(speed) => {
                if speed.is_finite() && speed >= 0.0 {
                    self.orbit_speed = speed;
                } else {
                    warn!("Ignoring invalid orbit speed {speed}");
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn advance_phase(&mut self) {
        self.phase = (self.phase + self.orbit_speed) % self.orbit_samples as f64;
    }

    /// Visualisation coordinate of the body: a pure function of state, planet, and phase.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn current_position(&self) -> Vec3D<f64> {
        let index = self.phase.floor() as usize;
        OrbitPath::position_at(&self.state.params(), self.planet, self.orbit_samples, index)
    }

    /// Samples the visualisation path for the current state.
    pub fn orbit_path(&self) -> OrbitPath {
        OrbitPath::compute(&self.state.params(), self.planet, self.orbit_samples)
    }

    pub fn params(&self) -> OrbitalParams { self.state.params() }
    pub fn target(&self) -> OrbitalParams { self.target }
    pub fn pid(&self) -> &PidController { &self.pid }
    pub fn planet(&self) -> Planet { self.planet }
    pub fn orbit_speed(&self) -> f64 { self.orbit_speed }
    pub fn tick_count(&self) -> u64 { self.tick_count }
    pub fn correction_count(&self) -> u64 { self.correction_count }
    pub fn is_recording_history(&self) -> bool { self.recording_history }
    pub fn telemetry(&self) -> &TelemetryLog { &self.telemetry }
    pub fn history(&self) -> &HistoryLog { &self.history }
    pub fn positions(&self) -> &PositionLog { &self.positions }
}
