//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! ProtectedCall::call / ProtectedAsyncCall::call
//!     → circuit_breaker.rs (bind-once guard, before/after signals)
//!     → state_machine.rs   (transition table, predicates)
//!     → state.rs           (Closed / Open / HalfOpen values)
//!     → clock.rs           (timestamps for tripping and reset timeout)
//! ```
//!
//! # Design Decisions
//! - Every failure counts the same; there is no failure classification
//! - No retries: an open circuit fails fast and the caller decides what next
//! - State lives in memory only, one breaker per protected resource

pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod state;
pub mod state_machine;

pub use circuit_breaker::{CircuitBreaker, ProtectedAsyncCall, ProtectedCall};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::CircuitBreakerError;
pub use state::{CallPermission, CircuitState, Closed, HalfOpen, Open, StateKind};
pub use state_machine::{Event, StateMachine};
