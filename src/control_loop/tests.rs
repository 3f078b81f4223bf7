use super::{ControlCommand, ControlLoop, LoopEvent, LoopState, StationKeeper, StopOutcome};
use crate::config::LoopConfig;
use crate::flight_control::{
    OrbitalParams, OrbitalState, Perturbation, common::vec3d::Vec3D, orbit::Planet,
};
use crate::{info, log};
use itertools::Itertools;
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

/// Adds the same increment every tick.
struct FixedDrift(Vec3D<f64>);

impl Perturbation for FixedDrift {
    fn perturb(&mut self, state: &mut OrbitalState) { state.shift(self.0); }
}

/// Blocks the worker thread inside every tick.
struct StallingDrift(Duration);

impl Perturbation for StallingDrift {
    fn perturb(&mut self, _state: &mut OrbitalState) { std::thread::sleep(self.0); }
}

fn no_drift() -> Box<FixedDrift> { Box::new(FixedDrift(Vec3D::zero())) }

fn fast_config() -> LoopConfig {
    LoopConfig { tick_rate_hz: 200.0, drift_seed: Some(5), stop_timeout_ms: 500, ..LoopConfig::default() }
}

async fn next_telemetry(rx: &mut broadcast::Receiver<LoopEvent>) -> crate::flight_control::TelemetryEntry {
    loop {
        let event = timeout(Duration::from_secs(2), rx.recv()).await;
        if let Ok(Ok(LoopEvent::Telemetry(entry))) = event {
            return entry;
        }
        assert!(event.is_ok(), "no telemetry within timeout");
    }
}

#[test]
fn test_on_course_tick_skips_correction() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, no_drift());
    let before = keeper.params();
    let report = keeper.tick();
    assert!(report.telemetry.on_course);
    assert_eq!(report.telemetry.correction, None);
    assert_eq!(report.history, None);
    assert_eq!(keeper.params(), before);
    assert_eq!(keeper.correction_count(), 0);
    assert_eq!(keeper.pid().integral(), Vec3D::zero());
    assert_eq!(keeper.telemetry().len(), 1);
}

#[test]
fn test_drift_beyond_threshold_fires_correction() {
    let config = LoopConfig::default();
    let drift = FixedDrift(Vec3D::new(-2.7, 0.004, 0.0001));
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(drift));
    keeper.apply(ControlCommand::SetHistoryRecording(true));

    let report = keeper.tick();
    let entry = &report.telemetry;
    assert!(!entry.on_course);
    assert!((entry.current_params.x() - 7997.3).abs() < 1e-9);
    let correction = entry.correction.expect("correction must fire");
    // kp + ki + kd = 1.5 on the first step
    assert!((correction.x() - 1.5 * 2.7).abs() < 1e-9, "{correction}");
    assert!((correction.y() + 1.5 * 0.004).abs() < 1e-9);
    assert!((keeper.params().altitude - (7997.3 + 4.05)).abs() < 1e-9);
    assert!((report.altitude_delta - 1.35).abs() < 1e-9);
    assert_eq!(keeper.correction_count(), 1);

    let history = report.history.expect("history is recorded");
    assert!((history.altitude_delta - 1.35).abs() < 1e-9);
    assert_eq!(keeper.history().len(), 1);
}

#[test]
fn test_history_needs_recording_and_correction() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-1.0, 0.0, 0.0))));
    keeper.tick();
    assert!(keeper.history().is_empty());

    let mut quiet = StationKeeper::with_perturbation(&config, no_drift());
    quiet.apply(ControlCommand::SetHistoryRecording(true));
    quiet.tick();
    assert!(quiet.history().is_empty());
    assert_eq!(quiet.telemetry().len(), 1);
}

#[test]
fn test_control_converges_under_constant_decay() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-0.03, 0.0, 0.0))));
    for _ in 0..200 {
        keeper.tick();
    }
    let error = (keeper.params().altitude - config.default_target.altitude).abs();
    log!("Altitude error after 200 ticks: {error}");
    assert!(error < 1.0, "{error}");
}

#[test]
fn test_telemetry_log_is_bounded_and_ordered() {
    let config = LoopConfig { telemetry_capacity: 10, position_capacity: 4, ..LoopConfig::default() };
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-0.5, 0.0, 0.0))));
    for _ in 0..25 {
        keeper.tick();
    }
    let ticks = keeper.telemetry().iter().map(|e| e.tick).collect::<Vec<_>>();
    assert_eq!(ticks, (16..=25).collect::<Vec<_>>());
    assert_eq!(keeper.positions().len(), 4);
    assert_eq!(keeper.tick_count(), 25);
}

#[test]
fn test_set_target_keeps_pid_state() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-1.0, 0.0, 0.0))));
    keeper.tick();
    let integral = keeper.pid().integral();
    assert_ne!(integral, Vec3D::zero());

    keeper.apply(ControlCommand::SetTarget(OrbitalParams::new(9000.0, 30.0, 0.1)));
    assert_eq!(keeper.target(), OrbitalParams::new(9000.0, 30.0, 0.1));
    assert_eq!(keeper.pid().integral(), integral);

    keeper.apply(ControlCommand::ResetController);
    assert_eq!(keeper.pid().integral(), Vec3D::zero());
}

#[test]
fn test_correct_to_default_jumps_and_resets() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-3.0, 0.5, 0.01))));
    keeper.apply(ControlCommand::SetTarget(OrbitalParams::new(8500.0, 50.0, 0.3)));
    for _ in 0..5 {
        keeper.tick();
    }
    keeper.apply(ControlCommand::CorrectToDefault);
    assert_eq!(keeper.params(), config.default_target);
    assert_eq!(keeper.pid().integral(), Vec3D::zero());
    assert_eq!(keeper.pid().previous_error(), Vec3D::zero());
    // the live target is not touched
    assert_eq!(keeper.target(), OrbitalParams::new(8500.0, 50.0, 0.3));
}

#[test]
fn test_clear_history_and_invalid_orbit_speed() {
    let config = LoopConfig::default();
    let mut keeper = StationKeeper::with_perturbation(&config, Box::new(FixedDrift(Vec3D::new(-1.0, 0.0, 0.0))));
    keeper.apply(ControlCommand::SetHistoryRecording(true));
    for _ in 0..3 {
        keeper.tick();
    }
    assert_eq!(keeper.history().len(), 3);
    keeper.apply(ControlCommand::ClearHistory);
    assert!(keeper.history().is_empty());
    assert_eq!(keeper.telemetry().len(), 3);

    keeper.apply(ControlCommand::SetOrbitSpeed(f64::NAN));
    keeper.apply(ControlCommand::SetOrbitSpeed(-2.0));
    assert!((keeper.orbit_speed() - config.orbit_speed).abs() < f64::EPSILON);
    keeper.apply(ControlCommand::SetOrbitSpeed(0.0));
    let before = keeper.positions().latest().copied();
    keeper.tick();
    let after = keeper.positions().latest().copied();
    assert_eq!(keeper.orbit_speed(), 0.0);
    // a frozen phase keeps the body on the same sample index
    assert!(before.unwrap().position.euclid_distance(&after.unwrap().position) < 10.0);
}

#[test]
fn test_position_follows_phase_and_planet() {
    let config = LoopConfig { orbit_speed: 5.0, orbit_samples: 100, ..LoopConfig::default() };
    let mut keeper = StationKeeper::with_perturbation(&config, no_drift());
    let start = keeper.current_position();
    let report = keeper.tick();
    assert_ne!(report.position.position, start);
    assert_eq!(report.position.position, keeper.current_position());
    let earth_path = keeper.orbit_path();
    assert_eq!(earth_path.points()[5], keeper.current_position());

    keeper.apply(ControlCommand::SetPlanet(Planet::Moon));
    assert_eq!(keeper.planet(), Planet::Moon);
    assert!(keeper.orbit_path().extent() < earth_path.extent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lifecycle_is_idempotent() {
    let control = ControlLoop::with_perturbation(fast_config(), no_drift()).unwrap();
    assert_eq!(control.status(), LoopState::Stopped);
    assert_eq!(control.stop().await, StopOutcome::AlreadyStopped);
    assert!(!control.pause());
    assert!(!control.resume());

    assert!(control.start().await);
    assert!(!control.start().await);
    assert_eq!(control.status(), LoopState::Running);
    assert!(!control.resume());
    assert!(control.pause());
    assert!(!control.pause());
    assert_eq!(control.status(), LoopState::Paused);
    assert!(control.resume());

    assert_eq!(control.stop().await, StopOutcome::Stopped);
    assert_eq!(control.status(), LoopState::Stopped);
    assert_eq!(control.stop().await, StopOutcome::AlreadyStopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_arrive_in_tick_order() {
    let control = ControlLoop::new(fast_config()).unwrap();
    let mut rx = control.subscribe();
    control.start().await;
    assert_eq!(
        timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap(),
        LoopEvent::Status(LoopState::Running)
    );
    let mut entries = Vec::new();
    for _ in 0..10 {
        entries.push(next_telemetry(&mut rx).await);
    }
    control.stop().await;
    info!("Received {} telemetry entries", entries.len());
    assert!(entries.iter().tuple_windows().all(|(a, b)| b.tick == a.tick + 1));
    assert!(entries.iter().tuple_windows().all(|(a, b)| b.timestamp >= a.timestamp));

    let logged = control.telemetry_history().await;
    assert!(logged.len() >= entries.len());
    assert!(logged.iter().tuple_windows().all(|(a, b)| b.tick == a.tick + 1));
    assert_eq!(control.latest_telemetry().await.as_ref(), logged.last());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_paused_loop_does_not_tick() {
    let control = ControlLoop::with_perturbation(fast_config(), no_drift()).unwrap();
    control.start().await;
    sleep(Duration::from_millis(50)).await;
    assert!(control.pause());
    sleep(Duration::from_millis(30)).await;
    let paused_at = control.tick_count().await;
    assert!(paused_at > 0);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(control.tick_count().await, paused_at);

    assert!(control.resume());
    sleep(Duration::from_millis(50)).await;
    assert!(control.tick_count().await > paused_at);
    assert_eq!(control.stop().await, StopOutcome::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_paused_worker_stops_promptly() {
    let config = LoopConfig { tick_rate_hz: 0.5, ..fast_config() };
    let control = ControlLoop::with_perturbation(config, no_drift()).unwrap();
    control.start().await;
    sleep(Duration::from_millis(20)).await;
    control.pause();
    let started = tokio::time::Instant::now();
    assert_eq!(control.stop().await, StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_commands_reach_running_and_stopped_loop() {
    let control = ControlLoop::with_perturbation(fast_config(), no_drift()).unwrap();
    control.set_target(8100.0, 40.0, 0.1).await;
    assert_eq!(control.target().await, OrbitalParams::new(8100.0, 40.0, 0.1));

    let mut rx = control.subscribe();
    control.start().await;
    let entry = next_telemetry(&mut rx).await;
    assert_eq!(entry.target_params, Vec3D::new(8100.0, 40.0, 0.1));
    assert!(!entry.on_course);

    control.set_history_recording(true).await;
    control.set_target(8000.0, 45.0, 0.2).await;
    sleep(Duration::from_millis(50)).await;
    assert!(control.is_recording_history().await);
    assert_eq!(control.target().await, OrbitalParams::new(8000.0, 45.0, 0.2));
    assert!(control.correction_count().await > 0);
    assert!(!control.drift_history().await.is_empty());

    control.correct_to_default().await;
    assert_eq!(control.stop().await, StopOutcome::Stopped);
    assert_eq!(control.current_params().await, OrbitalParams::new(8000.0, 45.0, 0.2));

    control.clear_history().await;
    assert!(control.drift_history().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_continues_counting() {
    let control = ControlLoop::with_perturbation(fast_config(), no_drift()).unwrap();
    control.start().await;
    sleep(Duration::from_millis(30)).await;
    control.stop().await;
    let first_run = control.tick_count().await;
    assert!(first_run > 0);

    assert!(control.start().await);
    sleep(Duration::from_millis(30)).await;
    control.stop().await;
    assert!(control.tick_count().await > first_run);
    assert!(!control.position_history().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_times_out_on_stalled_worker() {
    let config = LoopConfig { stop_timeout_ms: 20, ..fast_config() };
    let drift = Box::new(StallingDrift(Duration::from_millis(300)));
    let control = ControlLoop::with_perturbation(config, drift).unwrap();
    control.start().await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(control.stop().await, StopOutcome::TimedOut);
    assert_eq!(control.status(), LoopState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_not_blocked_by_full_command_channel() {
    let config = LoopConfig { stop_timeout_ms: 20, command_capacity: 1, ..fast_config() };
    let drift = Box::new(StallingDrift(Duration::from_millis(600)));
    let control = Arc::new(ControlLoop::with_perturbation(config, drift).unwrap());
    control.start().await;
    sleep(Duration::from_millis(50)).await;

    let sender = Arc::clone(&control);
    let pending = tokio::spawn(async move {
        for altitude in [8100.0, 8200.0, 8300.0] {
            sender.set_target(altitude, 45.0, 0.2).await;
        }
    });
    sleep(Duration::from_millis(30)).await;

    let started = tokio::time::Instant::now();
    assert_eq!(control.stop().await, StopOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_millis(300), "{:?}", started.elapsed());

    // the detached worker drains what it accepted and refuses the rest, keeping send order
    timeout(Duration::from_secs(3), pending).await.unwrap().unwrap();
    assert_eq!(control.target().await, OrbitalParams::new(8300.0, 45.0, 0.2));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = LoopConfig { tick_rate_hz: 0.0, ..LoopConfig::default() };
    assert!(ControlLoop::new(config).is_err());
}
