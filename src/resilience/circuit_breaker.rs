//! Circuit breaker guarding a single protected call.
//!
//! # Protocol
//! ```text
//! call(args)
//!     → BeforeCall     (Open may become HalfOpen once the timeout elapsed)
//!     → fail fast if the state forbids calls; the operation is not invoked
//!     → invoke the operation
//!     → CallSucceeded / CallFailed
//!     → return the operation's value or its error, unchanged
//! ```
//!
//! # Design Decisions
//! - One breaker binds exactly one call; binding again is `AlreadyInUse`
//! - The snapshot is replaced under a mutex, never held across the wrapped
//!   call or an await
//! - Only state changes are logged, not every event

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::CircuitBreakerConfig;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::error::CircuitBreakerError;
use crate::resilience::state::{CircuitState, StateKind};
use crate::resilience::state_machine::{Event, StateMachine};

const DEFAULT_NAME: &str = "circuit-breaker";

/// State shared between a breaker and the call it protects.
#[derive(Debug)]
struct Shared {
    name: String,
    machine: Mutex<StateMachine>,
}

impl Shared {
    /// Apply one event: read the snapshot, compute its successor, replace it.
    fn signal(&self, event: Event) -> StateMachine {
        let mut machine = self.machine.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = machine.current_state();
        let next = machine.transition(event);
        log_transition(&self.name, previous, next.current_state());
        *machine = next.clone();
        next
    }

    fn snapshot(&self) -> StateMachine {
        self.machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the before-call half of the protocol.
    fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        if self.signal(Event::BeforeCall).should_fail_fast() {
            tracing::debug!(
                circuit_breaker = %self.name,
                "Circuit breaker open, failing fast"
            );
            return Err(CircuitBreakerError::FailFast);
        }
        Ok(())
    }

    /// Run the after-call half of the protocol.
    fn record<T, E>(&self, outcome: Result<T, E>) -> Result<T, CircuitBreakerError<E>> {
        match outcome {
            Ok(value) => {
                self.signal(Event::CallSucceeded);
                Ok(value)
            }
            Err(err) => {
                self.signal(Event::CallFailed);
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }
}

fn log_transition(name: &str, from: CircuitState, to: CircuitState) {
    let (from_kind, to_kind) = (from.kind(), to.kind());
    if from_kind == to_kind {
        return;
    }

    match (from_kind, to_kind) {
        (StateKind::Closed, StateKind::Open) => {
            let failures = match from {
                CircuitState::Closed(closed) => closed.fail_count + 1,
                _ => 0,
            };
            tracing::warn!(
                circuit_breaker = %name,
                transition = "Closed -> Open",
                consecutive_failures = failures,
                "Circuit breaker opened due to consecutive failures"
            );
        }
        (StateKind::HalfOpen, StateKind::Open) => {
            tracing::warn!(
                circuit_breaker = %name,
                transition = "HalfOpen -> Open",
                "Circuit breaker re-opened after failed probe"
            );
        }
        (StateKind::Open, StateKind::HalfOpen) => {
            tracing::info!(
                circuit_breaker = %name,
                transition = "Open -> HalfOpen",
                "Circuit breaker allowing probe call"
            );
        }
        (StateKind::HalfOpen, StateKind::Closed) => {
            tracing::info!(
                circuit_breaker = %name,
                transition = "HalfOpen -> Closed",
                "Circuit breaker closed after successful probe"
            );
        }
        (from_kind, to_kind) => {
            tracing::debug!(
                circuit_breaker = %name,
                from = %from_kind,
                to = %to_kind,
                "Circuit breaker state changed"
            );
        }
    }
}

/// A circuit breaker bound to at most one protected call.
///
/// # Example
///
/// ```rust
/// use circuit_breaker::resilience::{CircuitBreaker, CircuitBreakerError};
/// use circuit_breaker::config::CircuitBreakerConfig;
///
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig::default().with_max_failures(2));
/// let parse = breaker
///     .protect_call(|input: &str| input.parse::<u32>())
///     .expect("first binding");
///
/// assert_eq!(parse.call("42").ok(), Some(42));
/// assert!(parse.call("nope").is_err());
/// assert!(parse.call("nope").is_err());
///
/// // Two consecutive failures tripped the circuit.
/// assert!(matches!(parse.call("7"), Err(CircuitBreakerError::FailFast)));
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    shared: Arc<Shared>,
    bound: AtomicBool,
}

impl CircuitBreaker {
    /// Create a breaker that reads the wall clock.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a breaker with an explicit clock.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                name: DEFAULT_NAME.to_string(),
                machine: Mutex::new(StateMachine::with_config(config, clock)),
            }),
            bound: AtomicBool::new(false),
        }
    }

    /// Set the name used in log output. Has no effect once a call is bound.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.name = name.into();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state of the circuit.
    pub fn state(&self) -> CircuitState {
        self.shared.snapshot().current_state()
    }

    /// True when the circuit currently forbids calls.
    ///
    /// This does not advance Open to HalfOpen; only an attempted call does.
    pub fn should_fail_fast(&self) -> bool {
        self.shared.snapshot().should_fail_fast()
    }

    /// Whether a call has been bound to this breaker.
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Bind the breaker to a synchronous operation.
    ///
    /// Fails with [`CircuitBreakerError::AlreadyInUse`] if this breaker has
    /// already been bound by either `protect_call` or `protect_async_call`.
    pub fn protect_call<F, A, T, E>(
        &self,
        call: F,
    ) -> Result<ProtectedCall<F>, CircuitBreakerError<E>>
    where
        F: Fn(A) -> Result<T, E>,
    {
        self.bind::<E>()?;
        Ok(ProtectedCall {
            call,
            shared: self.shared.clone(),
        })
    }

    /// Bind the breaker to an asynchronous operation.
    ///
    /// `call` is invoked lazily, once per [`ProtectedAsyncCall::call`], and
    /// only when the circuit permits it.
    pub fn protect_async_call<F, Fut, T, E>(
        &self,
        call: F,
    ) -> Result<ProtectedAsyncCall<F>, CircuitBreakerError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.bind::<E>()?;
        Ok(ProtectedAsyncCall {
            call,
            shared: self.shared.clone(),
        })
    }

    fn bind<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        self.bound
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| {
                tracing::error!(
                    circuit_breaker = %self.shared.name,
                    "Circuit breaker is already bound to a protected call"
                );
                CircuitBreakerError::AlreadyInUse
            })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

/// A synchronous operation guarded by a circuit breaker.
pub struct ProtectedCall<F> {
    call: F,
    shared: Arc<Shared>,
}

impl<F> ProtectedCall<F> {
    /// Invoke the operation if the circuit allows it.
    pub fn call<A, T, E>(&self, arg: A) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn(A) -> Result<T, E>,
    {
        self.shared.admit::<E>()?;
        let outcome = (self.call)(arg);
        self.shared.record(outcome)
    }

    pub fn state(&self) -> CircuitState {
        self.shared.snapshot().current_state()
    }
}

/// An asynchronous operation guarded by a circuit breaker.
pub struct ProtectedAsyncCall<F> {
    call: F,
    shared: Arc<Shared>,
}

impl<F> ProtectedAsyncCall<F> {
    /// Create and await the operation's future if the circuit allows it.
    pub async fn call<Fut, T, E>(&self) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.shared.admit::<E>()?;
        let outcome = (self.call)().await;
        self.shared.record(outcome)
    }

    pub fn state(&self) -> CircuitState {
        self.shared.snapshot().current_state()
    }
}

impl<F> fmt::Debug for ProtectedCall<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedCall")
            .field("circuit_breaker", &self.shared.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<F> fmt::Debug for ProtectedAsyncCall<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedAsyncCall")
            .field("circuit_breaker", &self.shared.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
