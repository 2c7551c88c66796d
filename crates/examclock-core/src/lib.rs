//! Session state machine for examclockd
//!
//! This crate is the heart of examclockd, containing:
//! - The transition function (`reduce`) applying commands to session state
//! - End-time recalculation for every running exam
//! - Auto-start scheduling and timing watches (auto-finish, budget exhaustion)
//! - Projection of state into what the display shows at one instant
//! - `SessionEngine`, which owns the state and persists it after each change

mod engine;
mod events;
mod recalc;
mod scheduler;
mod transition;
mod view;

pub use engine::*;
pub use events::*;
pub use recalc::*;
pub use scheduler::*;
pub use transition::*;
pub use view::*;
