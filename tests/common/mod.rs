//! Shared utilities for integration testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Error returned by [`Backend`] while it is down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDown {
    pub attempt: u32,
}

impl std::fmt::Display for BackendDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend down on attempt {}", self.attempt)
    }
}

impl std::error::Error for BackendDown {}

/// A programmable backend that counts how often it is invoked.
#[derive(Debug, Clone, Default)]
pub struct Backend {
    healthy: Arc<AtomicBool>,
    calls: Arc<AtomicU32>,
}

impl Backend {
    pub fn healthy() -> Self {
        let backend = Self::default();
        backend.set_healthy(true);
        backend
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Synchronous request echoing its input.
    pub fn handle(&self, input: u32) -> Result<u32, BackendDown> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.healthy.load(Ordering::SeqCst) {
            Ok(input)
        } else {
            Err(BackendDown { attempt })
        }
    }

    /// Asynchronous request with a little latency.
    pub async fn fetch(&self) -> Result<&'static str, BackendDown> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.handle(0).map(|_| "ok")
    }
}
