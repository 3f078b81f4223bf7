mod loop_runner;
mod loop_state;
mod signal;
mod station_keeper;
#[cfg(test)]
mod tests;

pub use loop_runner::ControlLoop;
pub use loop_state::LoopState;
pub use signal::{ControlCommand, LoopEvent, StopOutcome};
pub use station_keeper::StationKeeper;
