//! Kernel primitives
//!
//! - [`process`]: process-group signalling, reaping and subreaper setup
//! - [`signal`]: async-safe shutdown flag for SIGINT/SIGTERM

pub mod process;
pub mod signal;
