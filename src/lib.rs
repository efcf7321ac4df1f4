//! robograde: static checks and simulation runs for ROS 2 package submissions
//!
//! # Architecture
//!
//! The crate has two halves that share configuration and the submission
//! model but never call each other. The calling layer ([`cli`]) chains them.
//!
//! ## Code Checker ([`judge`])
//! - [`judge::structure`]: required package files
//! - [`judge::safety`]: busy-loop heuristic over normalized syntax trees
//! - [`judge::lint`]: external lint tool adapter
//! - [`judge::submission`]: submission identity and package discovery
//!
//! ## Syntax ([`syntax`])
//! - [`syntax::tree`]: language-neutral tagged syntax tree and visitor
//! - [`syntax::python`]: tree-sitter backed Python normalizer
//!
//! ## Simulation ([`session`])
//! - [`session::state`]: session lifecycle
//! - [`session::commands`]: simulator, controller, stimulus and node commands
//! - [`session::simulation`]: orchestrator owning every spawned process group
//!
//! ## Execution Control ([`exec`])
//! - [`exec::shell`]: shell lines with a sourced setup prelude
//! - [`exec::process_group`]: owned process groups with TERM/KILL teardown
//! - [`exec::build`]: workspace build runner
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::process`]: group signalling, reaping and subreaper setup
//! - [`kernel::signal`]: SIGINT/SIGTERM shutdown flag
//!
//! ## Safety ([`safety`])
//! - [`safety::workspace`]: workspace cleaning and staging
//! - [`safety::lock`]: advisory lock serializing sessions
//!
//! ## Observability ([`observability`])
//! - [`observability::events`]: structured session event trail
//!
//! ## Configuration ([`config`])
//! - [`config::settings`]: `GraderConfig` and its sections
//! - [`config::validator`]: config sanity checks
//! - [`config::types`]: reports, findings and the crate error type
//!
//! ## Utilities ([`utils`])
//! - [`utils::output`]: bounded output collection

// Kernel Primitives
pub mod kernel;

// Execution Control
pub mod exec;

// Code Checker
pub mod judge;
pub mod syntax;

// Simulation
pub mod session;

// Safety
pub mod safety;

// Observability
pub mod observability;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint wiring for the robograde binary.
pub mod cli;

pub use config::types::*;
