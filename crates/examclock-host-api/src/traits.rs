//! Display host traits

use async_trait::async_trait;
use thiserror::Error;

use crate::HostCapabilities;

/// Errors from display host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Not supported by this host: {0}")]
    Unsupported(String),

    #[error("Host command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// The machine showing the timers.
///
/// Every operation is best-effort: callers log failures and carry on, a
/// session never fails to start because the display could not be prepared.
#[async_trait]
pub trait DisplayHost: Send + Sync {
    /// Get the capabilities of this host
    fn capabilities(&self) -> &HostCapabilities;

    /// Put the timer display into exclusive fullscreen
    async fn request_exclusive_display(&self) -> HostResult<()>;

    /// Keep the screen awake until [`DisplayHost::release_sleep`]; calling
    /// again while inhibited is a no-op
    async fn inhibit_sleep(&self) -> HostResult<()>;

    /// Let the screen sleep again; a no-op when not inhibited
    async fn release_sleep(&self) -> HostResult<()>;

    /// Whether a sleep inhibit is currently held
    fn is_sleep_inhibited(&self) -> bool;

    /// Optional: check if the host is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

/// A host for machines with nothing to control (headless or unsupported)
#[derive(Debug, Default)]
pub struct NullDisplayHost {
    capabilities: HostCapabilities,
}

impl NullDisplayHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisplayHost for NullDisplayHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn request_exclusive_display(&self) -> HostResult<()> {
        Err(HostError::Unsupported("exclusive display".into()))
    }

    async fn inhibit_sleep(&self) -> HostResult<()> {
        Err(HostError::Unsupported("sleep inhibit".into()))
    }

    async fn release_sleep(&self) -> HostResult<()> {
        Ok(())
    }

    fn is_sleep_inhibited(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_host_refuses_politely() {
        let host = NullDisplayHost::new();
        assert!(!host.capabilities().can_prepare_display());
        assert!(matches!(
            host.request_exclusive_display().await,
            Err(HostError::Unsupported(_))
        ));
        assert!(host.release_sleep().await.is_ok());
        assert!(!host.is_sleep_inhibited());
    }
}
