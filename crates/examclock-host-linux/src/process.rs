//! Inhibitor child process management

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

use examclock_host_api::{HostError, HostResult};

/// A child process whose lifetime holds a resource (a sleep inhibit lock).
///
/// The child leads its own process group so the whole tree can be signalled.
/// Dropping it terminates the group.
pub struct InhibitorProcess {
    child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl InhibitorProcess {
    /// Spawn `argv` in a new session with no stdio
    pub fn spawn(argv: &[String]) -> HostResult<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(HostError::Internal("Empty inhibit command".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(std::io::Error::from)?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            HostError::CommandFailed(format!("Failed to spawn {}: {}", program, e))
        })?;

        let pid = child.id();
        debug!(pid = pid, program = %program, "Inhibitor spawned");

        Ok(Self {
            child,
            pid,
            // After setsid, pid == pgid
            pgid: pid,
        })
    }

    /// Send SIGTERM to the process group
    pub fn terminate(&self) -> HostResult<()> {
        let pgid = Pid::from_raw(-(self.pgid as i32));

        match signal::kill(pgid, Signal::SIGTERM) {
            Ok(()) => {
                debug!(pgid = self.pgid, "Sent SIGTERM to inhibitor");
                Ok(())
            }
            // Already gone
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(HostError::CommandFailed(format!(
                "Failed to send SIGTERM: {}",
                e
            ))),
        }
    }

    /// Whether the child is still holding the inhibit (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = self.pid, status = ?status, "Inhibitor exited");
                false
            }
            Err(e) => {
                warn!(pid = self.pid, error = %e, "Error checking inhibitor status");
                false
            }
        }
    }

    /// Terminate and reap the child
    pub fn release(mut self) -> HostResult<()> {
        self.terminate()?;
        self.child
            .wait()
            .map_err(|e| HostError::Internal(format!("Wait failed: {}", e)))?;
        Ok(())
    }
}

impl Drop for InhibitorProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.terminate();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(InhibitorProcess::spawn(&[]).is_err());
    }

    #[test]
    fn missing_program_is_reported() {
        let result = InhibitorProcess::spawn(&argv(&["/nonexistent/examclock-inhibit"]));
        assert!(matches!(result, Err(HostError::CommandFailed(_))));
    }

    #[test]
    fn release_stops_a_sleeping_child() {
        let mut proc = InhibitorProcess::spawn(&argv(&["sleep", "60"])).unwrap();
        assert_eq!(proc.pid, proc.pgid);
        assert!(proc.is_running());

        proc.release().unwrap();
    }

    #[test]
    fn short_lived_child_is_noticed() {
        let mut proc = InhibitorProcess::spawn(&argv(&["true"])).unwrap();
        std::thread::sleep(Duration::from_millis(200));
        assert!(!proc.is_running());
    }
}
