//! Linux display host implementation

use async_trait::async_trait;
use examclock_host_api::{DisplayHost, HostCapabilities, HostError, HostResult};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::process::InhibitorProcess;

/// Commands used to drive the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxHostConfig {
    /// Run once to make the timer window fullscreen
    pub fullscreen_command: Vec<String>,
    /// Kept running for as long as the screen must stay awake
    pub inhibit_command: Vec<String>,
}

impl Default for LinuxHostConfig {
    fn default() -> Self {
        Self {
            fullscreen_command: ["swaymsg", "fullscreen", "enable"]
                .map(String::from)
                .to_vec(),
            inhibit_command: [
                "systemd-inhibit",
                "--what=idle:sleep",
                "--who=examclockd",
                "--why=Examination session in progress",
                "--mode=block",
                "sleep",
                "infinity",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Linux display host
pub struct LinuxDisplayHost {
    capabilities: HostCapabilities,
    config: LinuxHostConfig,
    inhibitor: Mutex<Option<InhibitorProcess>>,
}

impl LinuxDisplayHost {
    pub fn new() -> Self {
        Self::with_config(LinuxHostConfig::default())
    }

    pub fn with_config(config: LinuxHostConfig) -> Self {
        let mut capabilities = HostCapabilities::linux_full();
        if std::env::var_os("SWAYSOCK").is_none() {
            debug!("SWAYSOCK not set, fullscreen requests may fail");
            capabilities.can_force_fullscreen = false;
        }

        Self {
            capabilities,
            config,
            inhibitor: Mutex::new(None),
        }
    }

    fn lock_inhibitor(&self) -> HostResult<std::sync::MutexGuard<'_, Option<InhibitorProcess>>> {
        self.inhibitor
            .lock()
            .map_err(|_| HostError::Internal("inhibitor lock poisoned".into()))
    }
}

impl Default for LinuxDisplayHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisplayHost for LinuxDisplayHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn request_exclusive_display(&self) -> HostResult<()> {
        let Some((program, args)) = self.config.fullscreen_command.split_first() else {
            return Err(HostError::Unsupported("no fullscreen command configured".into()));
        };

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| HostError::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HostError::CommandFailed(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        info!(program = %program, "Exclusive display requested");
        Ok(())
    }

    async fn inhibit_sleep(&self) -> HostResult<()> {
        let mut inhibitor = self.lock_inhibitor()?;

        if let Some(existing) = inhibitor.as_mut() {
            if existing.is_running() {
                debug!(pid = existing.pid, "Sleep already inhibited");
                return Ok(());
            }
            warn!(pid = existing.pid, "Inhibitor exited early, restarting");
        }

        let process = InhibitorProcess::spawn(&self.config.inhibit_command)?;
        info!(pid = process.pid, "Sleep inhibited");
        *inhibitor = Some(process);
        Ok(())
    }

    async fn release_sleep(&self) -> HostResult<()> {
        let process = self.lock_inhibitor()?.take();

        match process {
            Some(process) => {
                let pid = process.pid;
                process.release()?;
                info!(pid = pid, "Sleep inhibit released");
            }
            None => debug!("No sleep inhibit to release"),
        }
        Ok(())
    }

    fn is_sleep_inhibited(&self) -> bool {
        match self.inhibitor.lock() {
            Ok(mut inhibitor) => inhibitor.as_mut().is_some_and(|p| p.is_running()),
            Err(_) => false,
        }
    }

    fn is_healthy(&self) -> bool {
        self.inhibitor.lock().is_ok()
    }
}
