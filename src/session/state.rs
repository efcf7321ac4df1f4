use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one simulation session.
///
/// The happy path is strictly linear from `Idle` to `Completed`. `Failed`
/// is reachable from any non-terminal phase, and `Terminating` can be
/// entered early when shutdown is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Cleaning,
    Copying,
    Building,
    Launching,
    Stabilizing,
    Activating,
    RunningUserNode,
    Injecting,
    Monitoring,
    Terminating,
    Completed,
    Failed,
}

impl SessionState {
    /// Next phase on the happy path. `None` for terminal states.
    pub fn next(self) -> Option<Self> {
        use SessionState::*;
        match self {
            Idle => Some(Cleaning),
            Cleaning => Some(Copying),
            Copying => Some(Building),
            Building => Some(Launching),
            Launching => Some(Stabilizing),
            Stabilizing => Some(Activating),
            Activating => Some(RunningUserNode),
            RunningUserNode => Some(Injecting),
            Injecting => Some(Monitoring),
            Monitoring => Some(Terminating),
            Terminating => Some(Completed),
            Completed | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
