//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience subsystem produces:
//!     → tracing events on every circuit state change
//!
//! Consumers:
//!     → logging.rs installs the subscriber (stdout, env-filtered)
//! ```
//!
//! # Design Decisions
//! - Structured fields (breaker name, transition) over free-form text
//! - The library only emits events; installing a subscriber is the binary's job

pub mod logging;

pub use logging::init_logging;
