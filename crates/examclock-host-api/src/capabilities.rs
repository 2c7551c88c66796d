//! Display host capabilities model

use serde::{Deserialize, Serialize};

/// Describes what a display host can do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Can put the timer display into exclusive fullscreen
    pub can_force_fullscreen: bool,

    /// Can keep the screen from blanking or the machine from sleeping
    pub can_inhibit_sleep: bool,

    /// Can undo a sleep inhibit without restarting the service
    pub can_release_sleep: bool,
}

impl HostCapabilities {
    /// A host that can do nothing; every request is a logged no-op
    pub fn none() -> Self {
        Self {
            can_force_fullscreen: false,
            can_inhibit_sleep: false,
            can_release_sleep: false,
        }
    }

    /// Linux desktop under Sway with systemd-logind
    pub fn linux_full() -> Self {
        Self {
            can_force_fullscreen: true,
            can_inhibit_sleep: true,
            can_release_sleep: true,
        }
    }

    /// Whether any unattended-display preparation is possible
    pub fn can_prepare_display(&self) -> bool {
        self.can_force_fullscreen || self.can_inhibit_sleep
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::none()
    }
}
