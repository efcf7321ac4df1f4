//! Simulation sessions
//!
//! - [`state`]: the session lifecycle states
//! - [`commands`]: the shell commands a session issues
//! - [`simulation`]: the orchestrator that owns spawned process groups

pub mod commands;
pub mod simulation;
pub mod state;

pub use simulation::{SessionOutcome, SessionTimings, SimulationSession};
pub use state::SessionState;
