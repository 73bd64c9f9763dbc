//! Circuit breaker state machine.
//!
//! # State Transitions
//! ```text
//! Closed(f)  + CallSucceeded → Closed(0)
//! Closed(f)  + CallFailed    → Open(now)      if f + 1 >= max_failures
//!                            → Closed(f + 1)  otherwise
//! Open(t)    + BeforeCall    → HalfOpen       if t + reset_timeout < now
//!                            → Open(t)        otherwise
//! HalfOpen   + CallSucceeded → Closed(0)
//! HalfOpen   + CallFailed    → Open(now)
//! ```
//! Every other (state, event) pair leaves the machine unchanged.
//!
//! # Design Decisions
//! - A machine is an immutable snapshot; `transition` returns the successor
//! - The whole table lives in one exhaustive `match`
//! - Threshold and timeout checks are injected closures, evaluated at
//!   transition time against the injected clock

use std::fmt;
use std::sync::Arc;

use crate::config::CircuitBreakerConfig;
use crate::resilience::clock::{Clock, Timestamp};
use crate::resilience::state::{CallPermission, CircuitState, Closed, Open};

/// Signals emitted by the breaker around a protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    BeforeCall,
    CallSucceeded,
    CallFailed,
}

/// Decides whether a failure count has reached the trip threshold.
pub type ThresholdPredicate = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// Decides whether an open circuit has waited long enough to probe.
pub type TimeoutPredicate = Arc<dyn Fn(&Open) -> bool + Send + Sync>;

/// Snapshot of a circuit breaker: the current state plus the rules that
/// move it forward.
#[derive(Clone)]
pub struct StateMachine {
    current: CircuitState,
    is_threshold_reached: ThresholdPredicate,
    is_timeout_reached: TimeoutPredicate,
    clock: Arc<dyn Clock>,
}

impl StateMachine {
    /// Build a machine from explicit predicates.
    pub fn new(
        current: CircuitState,
        is_threshold_reached: ThresholdPredicate,
        is_timeout_reached: TimeoutPredicate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            current,
            is_threshold_reached,
            is_timeout_reached,
            clock,
        }
    }

    /// Build a closed machine whose predicates follow `config`.
    pub fn with_config(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let max_failures = config.max_failures;
        let reset_timeout_ms = config.reset_timeout_ms;
        let timeout_clock = clock.clone();

        Self::new(
            Closed::start().into(),
            Arc::new(move |fails: u32| fails >= max_failures),
            Arc::new(move |open: &Open| {
                open.opened_at.saturating_add(reset_timeout_ms) < timeout_clock.now()
            }),
            clock,
        )
    }

    pub fn current_state(&self) -> CircuitState {
        self.current
    }

    /// True when the current state forbids calls.
    pub fn should_fail_fast(&self) -> bool {
        !self.current.is_call_permitted()
    }

    /// Compute the machine that follows `event`.
    pub fn transition(&self, event: Event) -> StateMachine {
        let next = match (self.current, event) {
            (CircuitState::Closed(closed), Event::CallSucceeded) => closed.reset().into(),
            (CircuitState::Closed(closed), Event::CallFailed) => {
                if (self.is_threshold_reached)(closed.fail_count + 1) {
                    closed.trip(self.now()).into()
                } else {
                    closed.increase_fails().into()
                }
            }
            (CircuitState::Open(open), Event::BeforeCall) => {
                if (self.is_timeout_reached)(&open) {
                    open.try_reset().into()
                } else {
                    open.into()
                }
            }
            (CircuitState::HalfOpen(half_open), Event::CallSucceeded) => {
                half_open.reset().into()
            }
            (CircuitState::HalfOpen(half_open), Event::CallFailed) => {
                half_open.trip(self.now()).into()
            }
            (CircuitState::Closed(_), Event::BeforeCall)
            | (CircuitState::Open(_), Event::CallSucceeded | Event::CallFailed)
            | (CircuitState::HalfOpen(_), Event::BeforeCall) => self.current,
        };

        self.transition_to(next)
    }

    fn transition_to(&self, next: CircuitState) -> StateMachine {
        StateMachine {
            current: next,
            is_threshold_reached: self.is_threshold_reached.clone(),
            is_timeout_reached: self.is_timeout_reached.clone(),
            clock: self.clock.clone(),
        }
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::ManualClock;
    use crate::resilience::state::HalfOpen;
    use std::time::Duration;

    fn machine(max_failures: u32, reset_timeout_ms: u64, clock: &ManualClock) -> StateMachine {
        let config = CircuitBreakerConfig {
            max_failures,
            reset_timeout_ms,
        };
        StateMachine::with_config(config, Arc::new(clock.clone()))
    }

    fn with_state(machine: &StateMachine, state: impl Into<CircuitState>) -> StateMachine {
        machine.transition_to(state.into())
    }

    #[test]
    fn test_starts_closed() {
        let clock = ManualClock::new(0);
        let m = machine(3, 100, &clock);
        assert_eq!(m.current_state(), CircuitState::Closed(Closed::start()));
        assert!(!m.should_fail_fast());
    }

    #[test]
    fn test_failures_accumulate_until_threshold() {
        let clock = ManualClock::new(500);
        let mut m = machine(3, 100, &clock);

        for expected in 1..3 {
            m = m.transition(Event::CallFailed);
            assert_eq!(
                m.current_state(),
                CircuitState::Closed(Closed {
                    fail_count: expected
                })
            );
            assert!(!m.should_fail_fast());
        }

        m = m.transition(Event::CallFailed);
        assert_eq!(m.current_state(), CircuitState::Open(Open { opened_at: 500 }));
        assert!(m.should_fail_fast());
    }

    #[test]
    fn test_single_failure_trips_when_threshold_is_one() {
        let clock = ManualClock::new(9);
        let m = machine(1, 100, &clock).transition(Event::CallFailed);
        assert_eq!(m.current_state(), CircuitState::Open(Open { opened_at: 9 }));
    }

    #[test]
    fn test_success_resets_fail_count() {
        let clock = ManualClock::new(0);
        let base = machine(5, 100, &clock);

        for k in 0..5 {
            let m = with_state(&base, Closed { fail_count: k }).transition(Event::CallSucceeded);
            assert_eq!(m.current_state(), CircuitState::Closed(Closed::start()));
        }
    }

    #[test]
    fn test_open_waits_for_reset_timeout() {
        let clock = ManualClock::new(0);
        let base = machine(2, 100, &clock);
        let open = with_state(&base, Open { opened_at: 1_000 });

        clock.set(1_000 + 100 - 1);
        let m = open.transition(Event::BeforeCall);
        assert_eq!(m.current_state(), CircuitState::Open(Open { opened_at: 1_000 }));
        assert!(m.should_fail_fast());

        // Exactly at the boundary the timeout has not yet been exceeded.
        clock.set(1_000 + 100);
        let m = open.transition(Event::BeforeCall);
        assert_eq!(m.current_state().kind(), crate::resilience::StateKind::Open);

        clock.set(1_000 + 100 + 1);
        let m = open.transition(Event::BeforeCall);
        assert_eq!(m.current_state(), CircuitState::HalfOpen(HalfOpen));
        assert!(!m.should_fail_fast());
    }

    #[test]
    fn test_half_open_outcomes() {
        let clock = ManualClock::new(0);
        let half_open = with_state(&machine(2, 100, &clock), HalfOpen);

        let closed = half_open.transition(Event::CallSucceeded);
        assert_eq!(closed.current_state(), CircuitState::Closed(Closed::start()));

        clock.advance(Duration::from_millis(1_234));
        let reopened = half_open.transition(Event::CallFailed);
        assert_eq!(
            reopened.current_state(),
            CircuitState::Open(Open { opened_at: 1_234 })
        );
    }

    #[test]
    fn test_unmatched_events_are_no_ops() {
        let clock = ManualClock::new(0);
        let base = machine(2, 100, &clock);

        let cases: Vec<(CircuitState, Event)> = vec![
            (Closed { fail_count: 1 }.into(), Event::BeforeCall),
            (Open { opened_at: 3 }.into(), Event::CallSucceeded),
            (Open { opened_at: 3 }.into(), Event::CallFailed),
            (HalfOpen.into(), Event::BeforeCall),
        ];

        for (state, event) in cases {
            let m = with_state(&base, state).transition(event);
            assert_eq!(m.current_state(), state, "{state:?} + {event:?}");
        }
    }

    #[test]
    fn test_custom_predicates() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
        let m = StateMachine::new(
            Closed::start().into(),
            Arc::new(|_: u32| true),
            Arc::new(|_: &Open| true),
            clock,
        );

        let m = m.transition(Event::CallFailed);
        assert!(m.should_fail_fast());

        let m = m.transition(Event::BeforeCall);
        assert_eq!(m.current_state(), CircuitState::HalfOpen(HalfOpen));
    }

    #[test]
    fn test_transition_does_not_mutate_snapshot() {
        let clock = ManualClock::new(0);
        let snapshot = machine(2, 100, &clock);
        let _next = snapshot.transition(Event::CallFailed);
        assert_eq!(snapshot.current_state(), CircuitState::Closed(Closed::start()));
    }
}
