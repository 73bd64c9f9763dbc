//! Simulated workload for exercising a circuit breaker.
//!
//! # Data Flow
//! ```text
//! SimulationConfig
//!     → FlakyDependency (outage window, then random failures)
//!     → CircuitBreaker::protect_async_call
//!     → `calls` attempts, `interval_ms` apart
//!     → SimulationReport
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::config::{CircuitBreakerConfig, SimulationConfig};
use crate::resilience::{CircuitBreaker, CircuitBreakerError, StateKind};

/// Failure reported by the simulated dependency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("dependency outage (invocation {0})")]
    Outage(u32),

    #[error("dependency request failed (invocation {0})")]
    Transient(u32),
}

/// A remote dependency that is down for a while, then fails at random.
#[derive(Debug)]
pub struct FlakyDependency {
    invocations: AtomicU32,
    outage_calls: u32,
    failure_rate: f64,
    latency: Duration,
    rng: Mutex<fastrand::Rng>,
}

impl FlakyDependency {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        Self {
            invocations: AtomicU32::new(0),
            outage_calls: config.outage_calls,
            failure_rate: config.failure_rate,
            latency: Duration::from_millis(config.latency_ms),
            rng: Mutex::new(rng),
        }
    }

    /// Number of times the dependency was actually invoked.
    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Perform one request.
    pub async fn request(&self) -> Result<u32, DependencyError> {
        let n = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if n <= self.outage_calls {
            return Err(DependencyError::Outage(n));
        }

        let roll = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .f64();
        if roll < self.failure_rate {
            Err(DependencyError::Transient(n))
        } else {
            Ok(n)
        }
    }
}

/// Outcome counts of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    pub succeeded: u32,
    pub failed: u32,
    pub rejected: u32,
    pub invocations: u32,
    pub final_state: StateKind,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded={} failed={} rejected={} invocations={} final_state={}",
            self.succeeded, self.failed, self.rejected, self.invocations, self.final_state
        )
    }
}

/// Drive one breaker against a [`FlakyDependency`].
pub async fn run_simulation(
    breaker_config: CircuitBreakerConfig,
    simulation: &SimulationConfig,
) -> Result<SimulationReport, CircuitBreakerError<DependencyError>> {
    let breaker =
        CircuitBreaker::new(breaker_config).named(simulation.breaker_name.clone());
    let dependency = FlakyDependency::new(simulation);
    let protected = breaker.protect_async_call(|| dependency.request())?;
    let interval = Duration::from_millis(simulation.interval_ms);

    tracing::info!(
        circuit_breaker = %breaker.name(),
        max_failures = breaker_config.max_failures,
        reset_timeout_ms = breaker_config.reset_timeout_ms,
        calls = simulation.calls,
        "Simulation starting"
    );

    let (mut succeeded, mut failed, mut rejected) = (0, 0, 0);
    for attempt in 1..=simulation.calls {
        match protected.call().await {
            Ok(invocation) => {
                succeeded += 1;
                tracing::debug!(attempt, invocation, "Call succeeded");
            }
            Err(CircuitBreakerError::FailFast) => {
                rejected += 1;
                tracing::debug!(attempt, "Call rejected");
            }
            Err(CircuitBreakerError::Inner(err)) => {
                failed += 1;
                tracing::debug!(attempt, error = %err, "Call failed");
            }
            Err(err @ CircuitBreakerError::AlreadyInUse) => return Err(err),
        }

        if attempt < simulation.calls && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    let report = SimulationReport {
        succeeded,
        failed,
        rejected,
        invocations: dependency.invocations(),
        final_state: breaker.state().kind(),
    };
    tracing::info!(%report, "Simulation finished");
    Ok(report)
}
