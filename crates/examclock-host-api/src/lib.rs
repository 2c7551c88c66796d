//! Display host interfaces for examclockd
//!
//! This crate defines what the service needs from the machine driving the
//! exam room display: an exclusive fullscreen view and a screen that does
//! not go to sleep. It contains no platform code itself.

mod capabilities;
mod mock;
mod traits;

pub use capabilities::*;
pub use mock::*;
pub use traits::*;
