//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section is optional; missing fields fall back to their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the `breaker-sim` binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Circuit breaker thresholds.
    pub breaker: CircuitBreakerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Simulated workload driven through the breaker.
    pub simulation: SimulationConfig,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit. Must be at least 1.
    pub max_failures: u32,

    /// How long the circuit stays open before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            reset_timeout_ms: 1000,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration. `max_failures` is clamped to at least 1.
    pub fn new(max_failures: u32, reset_timeout: Duration) -> Self {
        Self {
            max_failures: max_failures.max(1),
            reset_timeout_ms: reset_timeout.as_millis() as u64,
        }
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Simulated flaky dependency used by the CLI.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Name attached to the breaker in log output.
    pub breaker_name: String,

    /// Total number of calls to attempt.
    pub calls: u32,

    /// Pause between calls in milliseconds.
    pub interval_ms: u64,

    /// Probability (0.0 - 1.0) that a call fails outside the outage window.
    pub failure_rate: f64,

    /// Number of leading calls that always fail, modelling an outage.
    pub outage_calls: u32,

    /// Simulated latency of each call in milliseconds.
    pub latency_ms: u64,

    /// Seed for the failure generator; random when unset.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            breaker_name: "simulated-dependency".to_string(),
            calls: 40,
            interval_ms: 50,
            failure_rate: 0.1,
            outage_calls: 6,
            latency_ms: 5,
            seed: None,
        }
    }
}
