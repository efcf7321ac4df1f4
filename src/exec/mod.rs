//! Execution control
//!
//! Shell command construction, owned process groups, and the build runner.

pub mod build;
pub mod process_group;
pub mod shell;
