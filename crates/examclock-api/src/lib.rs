//! Protocol and model types for examclock
//!
//! This crate defines the data shared by the timing core, the service and
//! its clients:
//! - The exam and session model (persisted as-is)
//! - Commands (the only way state changes)
//! - Requests/responses for the IPC protocol
//! - Events (service -> clients)
//! - Display projections
//! - Versioning

mod commands;
mod events;
mod settings;
mod types;
mod view;

pub use commands::*;
pub use events::*;
pub use settings::*;
pub use types::*;
pub use view::*;

/// Current API version
pub const API_VERSION: u32 = 1;
