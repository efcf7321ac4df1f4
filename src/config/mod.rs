//! Configuration
//!
//! Shared types and errors, robograde.json loading, and startup validation.

pub mod settings;
pub mod types;
pub mod validator;
