//! Utilities
//!
//! - [`output`]: bounded output capture for spawned process groups

pub mod output;
