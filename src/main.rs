//! Circuit breaker simulator.
//!
//! Drives a single circuit breaker against a simulated flaky dependency and
//! logs every state change.
//!
//! ```text
//!   config file ──▶ AppConfig ──▶ CLI overrides
//!                                     │
//!                                     ▼
//!   FlakyDependency ◀── ProtectedAsyncCall ◀── CircuitBreaker
//!                                     │
//!                                     ▼
//!                              SimulationReport
//! ```

use std::path::PathBuf;

use clap::Parser;

use circuit_breaker::config::{load_config, AppConfig};
use circuit_breaker::observability::init_logging;
use circuit_breaker::simulation::run_simulation;

#[derive(Parser)]
#[command(name = "breaker-sim")]
#[command(about = "Run a circuit breaker against a simulated flaky dependency", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Consecutive failures that trip the circuit.
    #[arg(long)]
    max_failures: Option<u32>,

    /// Milliseconds the circuit stays open before probing.
    #[arg(long)]
    reset_timeout_ms: Option<u64>,

    /// Number of calls to attempt.
    #[arg(long)]
    calls: Option<u32>,

    /// Pause between calls in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Probability that a call fails after the outage.
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Number of leading calls that always fail.
    #[arg(long)]
    outage_calls: Option<u32>,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(max_failures) = self.max_failures {
            config.breaker = config.breaker.with_max_failures(max_failures);
        }
        if let Some(reset_timeout_ms) = self.reset_timeout_ms {
            config.breaker.reset_timeout_ms = reset_timeout_ms;
        }
        if let Some(calls) = self.calls {
            config.simulation.calls = calls;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.simulation.interval_ms = interval_ms;
        }
        if let Some(failure_rate) = self.failure_rate {
            config.simulation.failure_rate = failure_rate.clamp(0.0, 1.0);
        }
        if let Some(outage_calls) = self.outage_calls {
            config.simulation.outage_calls = outage_calls;
        }
        if self.seed.is_some() {
            config.simulation.seed = self.seed;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(&config.observability);

    tracing::info!(
        config_file = ?cli.config,
        max_failures = config.breaker.max_failures,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        "Configuration loaded"
    );

    let report = run_simulation(config.breaker, &config.simulation).await?;
    println!("{report}");

    Ok(())
}
