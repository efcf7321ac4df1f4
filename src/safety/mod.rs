//! Safety and cleanup
//!
//! Workspace pruning and staging, plus the advisory lock that keeps one
//! session per workspace.

pub mod lock;
pub mod workspace;
