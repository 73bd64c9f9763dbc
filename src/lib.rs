//! Circuit breaker library.
//!
//! Wraps a fallible synchronous or asynchronous operation and fails fast once
//! it has failed `max_failures` times in a row, probing again after
//! `reset_timeout_ms`.

pub mod config;
pub mod observability;
pub mod resilience;
pub mod simulation;

pub use config::CircuitBreakerConfig;
pub use resilience::{CircuitBreaker, CircuitBreakerError, CircuitState};
