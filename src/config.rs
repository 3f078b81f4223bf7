use crate::flight_control::{DriftBounds, OrbitalParams, PidGains, orbit::Planet};
use std::{env, str::FromStr, time::Duration};
use strum_macros::Display;

/// Reasons a [`LoopConfig`] is rejected.
#[derive(Debug, Display, PartialEq)]
pub enum ConfigError {
    #[strum(to_string = "tick rate must be positive and give a representable tick period")]
    InvalidTickRate,
    #[strum(to_string = "log capacities must be non-zero")]
    ZeroCapacity,
    #[strum(to_string = "on-course threshold must be finite and non-negative")]
    InvalidThreshold,
    #[strum(to_string = "PID gains must be finite")]
    NonFiniteGains,
    #[strum(to_string = "default target is outside the valid orbital ranges")]
    TargetOutOfRange,
    #[strum(to_string = "drift interval minimum exceeds its maximum")]
    InvertedDriftBounds,
    #[strum(to_string = "drift intervals must have finite bounds and width")]
    NonFiniteDriftBounds,
    #[strum(to_string = "orbit speed must be finite and non-negative")]
    InvalidOrbitSpeed,
    #[strum(to_string = "malformed value in environment variable {var}")]
    MalformedEnv { var: String },
}

impl std::error::Error for ConfigError {}

/// Everything the control loop needs at construction. Fixed for the lifetime of a loop.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Control ticks per second.
    pub tick_rate_hz: f64,
    pub gains: PidGains,
    /// Error norm below which no correction fires.
    pub on_course_threshold: f64,
    pub telemetry_capacity: usize,
    pub history_capacity: usize,
    /// Capacity of the position log feeding live plots.
    pub position_capacity: usize,
    /// Initial state, initial live target, and jump target of `correct_to_default`.
    pub default_target: OrbitalParams,
    pub drift: DriftBounds,
    /// Fixed seed for the drift RNG. `None` seeds from the OS.
    pub drift_seed: Option<u64>,
    pub planet: Planet,
    /// Samples of the orbit path the body advances per tick.
    pub orbit_speed: f64,
    /// Samples per revolution of the visualisation path.
    pub orbit_samples: usize,
    /// Upper bound `stop()` waits for the worker to exit.
    pub stop_timeout_ms: u64,
    /// Capacity of the observer event channel.
    pub event_capacity: usize,
    /// Capacity of the command channel into the worker.
    pub command_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 4.0,
            gains: PidGains::default(),
            on_course_threshold: 0.1,
            telemetry_capacity: 1000,
            history_capacity: 500,
            position_capacity: 100,
            default_target: OrbitalParams::new(8000.0, 45.0, 0.2),
            drift: DriftBounds::default(),
            drift_seed: None,
            planet: Planet::Earth,
            orbit_speed: 1.0,
            orbit_samples: 500,
            stop_timeout_ms: 1000,
            event_capacity: 64,
            command_capacity: 32,
        }
    }
}

impl LoopConfig {
    /// Builds a configuration from defaults overridden by `STATION_*` environment variables.
    ///
    /// # Errors
    /// - [`ConfigError::MalformedEnv`] if a set variable does not parse.
    /// - Any [`LoopConfig::validate`] error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        env_override("STATION_TICK_RATE_HZ", &mut cfg.tick_rate_hz)?;
        env_override("STATION_THRESHOLD", &mut cfg.on_course_threshold)?;
        env_override("STATION_KP", &mut cfg.gains.kp)?;
        env_override("STATION_KI", &mut cfg.gains.ki)?;
        env_override("STATION_KD", &mut cfg.gains.kd)?;
        env_override("STATION_TELEMETRY_CAPACITY", &mut cfg.telemetry_capacity)?;
        env_override("STATION_HISTORY_CAPACITY", &mut cfg.history_capacity)?;
        env_override("STATION_TARGET_ALTITUDE", &mut cfg.default_target.altitude)?;
        env_override("STATION_TARGET_INCLINATION", &mut cfg.default_target.inclination)?;
        env_override("STATION_TARGET_ECCENTRICITY", &mut cfg.default_target.eccentricity)?;
        env_override("STATION_PLANET", &mut cfg.planet)?;
        env_override("STATION_ORBIT_SPEED", &mut cfg.orbit_speed)?;
        env_override("STATION_STOP_TIMEOUT_MS", &mut cfg.stop_timeout_ms)?;
        if let Ok(raw) = env::var("STATION_SEED") {
            let seed = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::MalformedEnv { var: "STATION_SEED".into() })?;
            cfg.drift_seed = Some(seed);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the configuration for values the loop cannot run with.
    ///
    /// # Errors
    /// The first violated constraint as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0)
            || Duration::try_from_secs_f64(1.0 / self.tick_rate_hz).is_err()
        {
            return Err(ConfigError::InvalidTickRate);
        }
        let capacities = [
            self.telemetry_capacity,
            self.history_capacity,
            self.position_capacity,
            self.event_capacity,
            self.command_capacity,
        ];
        if capacities.contains(&0) {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.on_course_threshold.is_finite() && self.on_course_threshold >= 0.0) {
            return Err(ConfigError::InvalidThreshold);
        }
        if !self.gains.is_finite() {
            return Err(ConfigError::NonFiniteGains);
        }
        if !(self.default_target.as_vec().is_finite() && self.default_target.in_bounds()) {
            return Err(ConfigError::TargetOutOfRange);
        }
        let intervals = self.drift.intervals();
        if intervals.iter().any(|(min, max)| !(max - min).is_finite()) {
            return Err(ConfigError::NonFiniteDriftBounds);
        }
        if intervals.iter().any(|(min, max)| min > max) {
            return Err(ConfigError::InvertedDriftBounds);
        }
        if !(self.orbit_speed.is_finite() && self.orbit_speed >= 0.0) || self.orbit_samples == 0 {
            return Err(ConfigError::InvalidOrbitSpeed);
        }
        Ok(())
    }

    /// Duration of a single control tick. Only meaningful on a validated config.
    pub fn tick_period(&self) -> Duration { Duration::from_secs_f64(1.0 / self.tick_rate_hz) }

    pub fn stop_timeout(&self) -> Duration { Duration::from_millis(self.stop_timeout_ms) }
}

/// Replaces `field` with the parsed value of `var` if the variable is set.
fn env_override<T: FromStr>(var: &str, field: &mut T) -> Result<(), ConfigError> {
    if let Ok(raw) = env::var(var) {
        *field = raw.trim().parse().map_err(|_| ConfigError::MalformedEnv { var: var.to_string() })?;
    }
    Ok(())
}
