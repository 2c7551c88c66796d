//! Linux display host for examclockd
//!
//! Provides:
//! - Exclusive fullscreen through `swaymsg`
//! - Sleep and idle inhibit through a long-lived `systemd-inhibit` child,
//!   held in its own process group and released with SIGTERM

mod adapter;
mod process;

pub use adapter::*;
pub use process::*;
