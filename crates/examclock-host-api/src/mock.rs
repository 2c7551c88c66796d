//! Mock display host for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{DisplayHost, HostCapabilities, HostError, HostResult};

/// A call made on the mock, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    ExclusiveDisplay,
    InhibitSleep,
    ReleaseSleep,
}

/// Mock display host for unit/integration testing
pub struct MockDisplayHost {
    capabilities: HostCapabilities,
    calls: Mutex<Vec<HostCall>>,
    inhibited: AtomicBool,

    /// Configure exclusive display requests to fail
    pub fail_display: AtomicBool,

    /// Configure sleep inhibit to fail
    pub fail_inhibit: AtomicBool,
}

impl MockDisplayHost {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::linux_full(),
            calls: Mutex::new(Vec::new()),
            inhibited: AtomicBool::new(false),
            fail_display: AtomicBool::new(false),
            fail_inhibit: AtomicBool::new(false),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: HostCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Default for MockDisplayHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisplayHost for MockDisplayHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn request_exclusive_display(&self) -> HostResult<()> {
        self.record(HostCall::ExclusiveDisplay);
        if self.fail_display.load(Ordering::SeqCst) {
            return Err(HostError::CommandFailed("Mock display failure".into()));
        }
        Ok(())
    }

    async fn inhibit_sleep(&self) -> HostResult<()> {
        self.record(HostCall::InhibitSleep);
        if self.fail_inhibit.load(Ordering::SeqCst) {
            return Err(HostError::CommandFailed("Mock inhibit failure".into()));
        }
        self.inhibited.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn release_sleep(&self) -> HostResult<()> {
        self.record(HostCall::ReleaseSleep);
        self.inhibited.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_sleep_inhibited(&self) -> bool {
        self.inhibited.load(Ordering::SeqCst)
    }
}
