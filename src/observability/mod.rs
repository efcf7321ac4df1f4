//! Observability
//!
//! - [`events`]: per-session structured event trail

pub mod events;
