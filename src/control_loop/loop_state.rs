use strum_macros::Display;

/// Lifecycle state of a [`super::ControlLoop`].
///
/// ```text
/// Stopped -> Running <-> Paused
///    ^         |           |
///    +---------+-----------+  (stop)
/// ```
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Display, serde::Serialize)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
    Paused,
}
