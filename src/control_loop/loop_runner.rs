use super::{
    loop_state::LoopState,
    signal::{ControlCommand, LoopEvent, StopOutcome},
    station_keeper::{StationKeeper, TickReport},
};
use crate::config::{ConfigError, LoopConfig};
use crate::flight_control::{
    HistoryEntry, OrbitalParams, Perturbation, PositionSample, TelemetryEntry,
    common::vec3d::Vec3D,
    orbit::{OrbitPath, Planet},
};
use crate::{error, event, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, broadcast, mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until, timeout},
};
use tokio_util::sync::CancellationToken;

/// Handle of a spawned control worker.
struct Worker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    cmd_tx: mpsc::Sender<ControlCommand>,
}

/// Closed-loop station-keeping orchestrator.
///
/// A single background task runs the ticks and is the only writer of the
/// [`StationKeeper`] while the loop is active. Callers reconfigure the loop
/// through commands and observe it through owned [`LoopEvent`] snapshots or
/// copied log snapshots.
pub struct ControlLoop {
    config: LoopConfig,
    core: Arc<Mutex<StationKeeper>>,
    state_tx: watch::Sender<LoopState>,
    event_tx: broadcast::Sender<LoopEvent>,
    worker: Mutex<Option<Worker>>,
}

impl ControlLoop {
    /// Creates a stopped loop whose body starts on the configured default target.
    ///
    /// # Errors
    /// Any [`ConfigError`] reported by [`LoopConfig::validate`].
    pub fn new(config: LoopConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let core = StationKeeper::new(&config);
        Ok(Self::from_core(config, core))
    }

    /// Creates a stopped loop driven by a caller-supplied perturbation source.
    ///
    /// # Errors
    /// Any [`ConfigError`] reported by [`LoopConfig::validate`].
    pub fn with_perturbation(
        config: LoopConfig,
        drift: Box<dyn Perturbation>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let core = StationKeeper::with_perturbation(&config, drift);
        Ok(Self::from_core(config, core))
    }

    fn from_core(config: LoopConfig, core: StationKeeper) -> Self {
        let (state_tx, _) = watch::channel(LoopState::Stopped);
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            config,
            core: Arc::new(Mutex::new(core)),
            state_tx,
            event_tx,
            worker: Mutex::new(None),
        }
    }

    /// Spawns the control worker. Must be called from within a tokio runtime.
    ///
    /// # Returns
    /// `false` if the loop was already running or paused.
    pub async fn start(&self) -> bool {
        let mut slot = self.worker.lock().await;
        let started = self.state_tx.send_if_modified(|state| {
            if *state == LoopState::Stopped {
                *state = LoopState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return false;
        }
        let cancel = CancellationToken::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_capacity);
        let ctx = WorkerContext {
            core: Arc::clone(&self.core),
            state_rx: self.state_tx.subscribe(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            cancel: cancel.clone(),
            tick_period: self.config.tick_period(),
        };
        info!("Control loop started at {} Hz", self.config.tick_rate_hz);
        // Announce before spawning so observers see the status ahead of the first tick.
        self.emit(LoopEvent::Status(LoopState::Running));
        let handle = tokio::spawn(ctx.run());
        *slot = Some(Worker { handle, cancel, cmd_tx });
        true
    }

    /// Suspends ticking without stopping the worker.
    ///
    /// # Returns
    /// `false` if the loop was not running.
    pub fn pause(&self) -> bool { self.transition(LoopState::Running, LoopState::Paused) }

    /// Resumes a paused loop. The worker wakes immediately.
    ///
    /// # Returns
    /// `false` if the loop was not paused.
    pub fn resume(&self) -> bool { self.transition(LoopState::Paused, LoopState::Running) }

    fn transition(&self, from: LoopState, to: LoopState) -> bool {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            info!("Control loop {from} -> {to}");
            self.emit(LoopEvent::Status(to));
        }
        changed
    }

    /// Stops the worker and waits for it to exit, at most for the configured stop timeout.
    /// A worker that misses the deadline is left detached; it exits on its own once it
    /// observes the cancellation.
    pub async fn stop(&self) -> StopOutcome {
        let mut slot = self.worker.lock().await;
        self.state_tx.send_replace(LoopState::Stopped);
        let Some(worker) = slot.take() else {
            return StopOutcome::AlreadyStopped;
        };
        worker.cancel.cancel();
        drop(worker.cmd_tx);

        let outcome = match timeout(self.config.stop_timeout(), worker.handle).await {
            Ok(Ok(())) => {
                info!("Control loop stopped");
                StopOutcome::Stopped
            }
            Ok(Err(join_err)) => {
                error!("Control worker terminated abnormally: {join_err}");
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!(
                    "Control worker did not exit within {}ms, continuing without it",
                    self.config.stop_timeout_ms
                );
                StopOutcome::TimedOut
            }
        };
        self.emit(LoopEvent::Status(LoopState::Stopped));
        outcome
    }

    /// Routes a command to the running worker, or applies it directly while no worker exists.
    /// The worker slot is released before sending, so a full command channel never blocks `stop()`.
    async fn dispatch(&self, command: ControlCommand) {
        let cmd_tx = self.worker.lock().await.as_ref().map(|w| w.cmd_tx.clone());
        let undelivered = match cmd_tx {
            Some(tx) => tx.send(command).await.err().map(|e| e.0),
            None => Some(command),
        };
        if let Some(cmd) = undelivered {
            self.core.lock().await.apply(cmd);
        }
    }

    /// Sets the live target read by the next tick. The PID state is left untouched.
    pub async fn set_target(&self, altitude: f64, inclination: f64, eccentricity: f64) {
        let target = OrbitalParams::new(altitude, inclination, eccentricity);
        self.dispatch(ControlCommand::SetTarget(target)).await;
    }

    /// Jumps the body to the configured default target and resets the PID state.
    pub async fn correct_to_default(&self) { self.dispatch(ControlCommand::CorrectToDefault).await }

    pub async fn reset_controller(&self) { self.dispatch(ControlCommand::ResetController).await }

    pub async fn set_history_recording(&self, enabled: bool) {
        self.dispatch(ControlCommand::SetHistoryRecording(enabled)).await;
    }

    pub async fn clear_history(&self) { self.dispatch(ControlCommand::ClearHistory).await }

    pub async fn set_planet(&self, planet: Planet) {
        self.dispatch(ControlCommand::SetPlanet(planet)).await;
    }

    pub async fn set_orbit_speed(&self, samples_per_tick: f64) {
        self.dispatch(ControlCommand::SetOrbitSpeed(samples_per_tick)).await;
    }

    /// Registers a new observer. Events are delivered in tick order; a receiver that
    /// falls more than `event_capacity` events behind loses the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> { self.event_tx.subscribe() }

    pub fn status(&self) -> LoopState { *self.state_tx.borrow() }

    pub async fn latest_telemetry(&self) -> Option<TelemetryEntry> {
        self.core.lock().await.telemetry().latest().cloned()
    }

    /// The retained telemetry entries, oldest first.
    pub async fn telemetry_history(&self) -> Vec<TelemetryEntry> {
        self.core.lock().await.telemetry().snapshot()
    }

    /// The retained drift history entries, oldest first.
    pub async fn drift_history(&self) -> Vec<HistoryEntry> {
        self.core.lock().await.history().snapshot()
    }

    /// The retained position samples, oldest first.
    pub async fn position_history(&self) -> Vec<PositionSample> {
        self.core.lock().await.positions().snapshot()
    }

    pub async fn current_position(&self) -> Vec3D<f64> { self.core.lock().await.current_position() }

    pub async fn orbit_path(&self) -> OrbitPath { self.core.lock().await.orbit_path() }

    pub async fn current_params(&self) -> OrbitalParams { self.core.lock().await.params() }

    pub async fn target(&self) -> OrbitalParams { self.core.lock().await.target() }

    pub async fn tick_count(&self) -> u64 { self.core.lock().await.tick_count() }

    pub async fn correction_count(&self) -> u64 { self.core.lock().await.correction_count() }

    pub async fn is_recording_history(&self) -> bool {
        self.core.lock().await.is_recording_history()
    }

    fn emit(&self, event: LoopEvent) {
        // No subscribers is not an error.
        let _ = self.event_tx.send(event);
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
        }
    }
}

/// State moved into the spawned worker task.
struct WorkerContext {
    core: Arc<Mutex<StationKeeper>>,
    state_rx: watch::Receiver<LoopState>,
    event_tx: broadcast::Sender<LoopEvent>,
    cmd_rx: mpsc::Receiver<ControlCommand>,
    cancel: CancellationToken,
    tick_period: Duration,
}

impl WorkerContext {
    async fn run(mut self) {
        loop {
            while let Ok(cmd) = self.cmd_rx.try_recv() {
                self.core.lock().await.apply(cmd);
            }
            if self.cancel.is_cancelled() {
                break;
            }
            let state = *self.state_rx.borrow_and_update();
            match state {
                LoopState::Stopped => break,
                LoopState::Paused => {
                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        changed = self.state_rx.changed() => if changed.is_err() { break },
                        Some(cmd) = self.cmd_rx.recv() => self.core.lock().await.apply(cmd),
                    }
                    continue;
                }
                LoopState::Running => {}
            }

            let tick_start = Instant::now();
            let report = self.core.lock().await.tick();
            self.publish(report);

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = sleep_until(tick_start + self.tick_period) => {}
            }
        }
        // Commands accepted before the stop request still take effect. Senders still
        // waiting for capacity are refused and fall back to applying on the core directly,
        // which blocks on this guard until the drain is done.
        let mut core = self.core.lock().await;
        self.cmd_rx.close();
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            core.apply(cmd);
        }
        drop(core);
        event!("Control worker exited");
    }

    fn publish(&self, report: TickReport) {
        let TickReport { telemetry, history, position, .. } = report;
        let _ = self.event_tx.send(LoopEvent::Telemetry(telemetry));
        if let Some(entry) = history {
            let _ = self.event_tx.send(LoopEvent::Drift(entry));
        }
        let _ = self.event_tx.send(LoopEvent::Position(position));
    }
}
