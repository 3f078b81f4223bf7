#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod config;
mod control_loop;
mod flight_control;
mod logger;

use crate::config::LoopConfig;
use crate::control_loop::{ControlLoop, LoopEvent, StopOutcome};
use std::env;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let config = LoopConfig::from_env().unwrap_or_else(|e| fatal!("Invalid configuration: {e}"));
    let max_ticks: Option<u64> = env::var("STATION_MAX_TICKS").ok().and_then(|v| v.trim().parse().ok());
    let json_output = env::var("STATION_JSON").is_ok_and(|v| v == "1");
    let record_history = env::var("STATION_RECORD_HISTORY").is_ok_and(|v| v == "1");

    info!(
        "Station keeping around {} with gains {:?}, threshold {}",
        config.default_target, config.gains, config.on_course_threshold
    );
    let control = ControlLoop::new(config).unwrap_or_else(|e| fatal!("Invalid configuration: {e}"));
    let mut events = control.subscribe();
    control.set_history_recording(record_history).await;
    control.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping control loop");
                break;
            }
            event = events.recv() => match event {
                Ok(LoopEvent::Telemetry(entry)) => {
                    if json_output {
                        match serde_json::to_string(&entry) {
                            Ok(line) => println!("{line}"),
                            Err(e) => error!("Failed to serialize telemetry: {e}"),
                        }
                    } else {
                        log!("Tick {}\n{entry}", entry.tick);
                    }
                    if max_ticks.is_some_and(|max| entry.tick >= max) {
                        break;
                    }
                }
                Ok(LoopEvent::Drift(entry)) => log!("{entry}"),
                Ok(LoopEvent::Position(sample)) => event!("Position {:.1}", sample.position),
                Ok(LoopEvent::Status(state)) => info!("Status: {state}"),
                Err(RecvError::Lagged(missed)) => warn!("Observer lagged behind, {missed} events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    let corrections = control.correction_count().await;
    let ticks = control.tick_count().await;
    match control.stop().await {
        StopOutcome::TimedOut => warn!("Shutdown after {ticks} ticks did not complete in time"),
        _ => info!("Shutdown after {ticks} ticks, {corrections} corrections"),
    }
}
