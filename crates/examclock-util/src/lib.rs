//! Shared utilities for examclock
//!
//! This crate provides:
//! - ID types (ExamId, ClientId)
//! - Time utilities (mockable wall clock, countdown and clock formatting)
//! - Error types
//! - Serde helpers for millisecond durations
//! - Default paths for socket, data, and config files

mod error;
mod ids;
pub mod millis;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
