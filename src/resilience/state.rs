//! Circuit states.
//!
//! # States
//! - Closed: calls pass through, consecutive failures are counted
//! - Open: calls are rejected, remembers when it opened
//! - Half-Open: calls pass through as a probe
//!
//! # Design Decisions
//! - States are immutable values; every operation returns a new state
//! - Deciding *when* to apply an operation belongs to the state machine

use std::fmt;

use crate::resilience::clock::Timestamp;

/// Whether a state lets calls through.
pub trait CallPermission {
    /// Returns true if a call may be attempted in this state.
    fn is_call_permitted(&self) -> bool;
}

/// Normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Closed {
    /// Consecutive failures observed since the last success.
    pub fail_count: u32,
}

impl Closed {
    /// Initial state of every breaker.
    pub const fn start() -> Self {
        Self { fail_count: 0 }
    }

    pub const fn reset(self) -> Self {
        Self::start()
    }

    pub const fn increase_fails(self) -> Self {
        Self {
            fail_count: self.fail_count + 1,
        }
    }

    pub const fn trip(self, now: Timestamp) -> Open {
        Open { opened_at: now }
    }
}

impl CallPermission for Closed {
    fn is_call_permitted(&self) -> bool {
        true
    }
}

/// Tripped; calls fail fast until the reset timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Open {
    /// When the circuit tripped.
    pub opened_at: Timestamp,
}

impl Open {
    pub const fn try_reset(self) -> HalfOpen {
        HalfOpen
    }
}

impl CallPermission for Open {
    fn is_call_permitted(&self) -> bool {
        false
    }
}

/// Probing whether the protected operation has recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HalfOpen;

impl HalfOpen {
    pub const fn reset(self) -> Closed {
        Closed::start()
    }

    pub const fn trip(self, now: Timestamp) -> Open {
        Open { opened_at: now }
    }
}

impl CallPermission for HalfOpen {
    fn is_call_permitted(&self) -> bool {
        true
    }
}

/// Current state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed(Closed),
    Open(Open),
    HalfOpen(HalfOpen),
}

impl CircuitState {
    /// The variant without its data.
    pub fn kind(&self) -> StateKind {
        match self {
            CircuitState::Closed(_) => StateKind::Closed,
            CircuitState::Open(_) => StateKind::Open,
            CircuitState::HalfOpen(_) => StateKind::HalfOpen,
        }
    }
}

impl Default for CircuitState {
    fn default() -> Self {
        CircuitState::Closed(Closed::start())
    }
}

impl CallPermission for CircuitState {
    fn is_call_permitted(&self) -> bool {
        match self {
            CircuitState::Closed(closed) => closed.is_call_permitted(),
            CircuitState::Open(open) => open.is_call_permitted(),
            CircuitState::HalfOpen(half_open) => half_open.is_call_permitted(),
        }
    }
}

impl From<Closed> for CircuitState {
    fn from(state: Closed) -> Self {
        CircuitState::Closed(state)
    }
}

impl From<Open> for CircuitState {
    fn from(state: Open) -> Self {
        CircuitState::Open(state)
    }
}

impl From<HalfOpen> for CircuitState {
    fn from(state: HalfOpen) -> Self {
        CircuitState::HalfOpen(state)
    }
}

/// Fieldless view of [`CircuitState`], for logs and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Closed => write!(f, "Closed"),
            StateKind::Open => write!(f, "Open"),
            StateKind::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_permission_per_state() {
        assert!(Closed::start().is_call_permitted());
        assert!(HalfOpen.is_call_permitted());
        assert!(!Open { opened_at: 0 }.is_call_permitted());

        assert!(!CircuitState::from(Open { opened_at: 5 }).is_call_permitted());
        assert!(CircuitState::default().is_call_permitted());
    }

    #[test]
    fn test_closed_operations() {
        let closed = Closed::start().increase_fails().increase_fails();
        assert_eq!(closed.fail_count, 2);
        assert_eq!(closed.reset(), Closed { fail_count: 0 });
        assert_eq!(closed.trip(42), Open { opened_at: 42 });
    }

    #[test]
    fn test_half_open_and_open_operations() {
        assert_eq!(HalfOpen.reset(), Closed::start());
        assert_eq!(HalfOpen.trip(7), Open { opened_at: 7 });
        assert_eq!(Open { opened_at: 7 }.try_reset(), HalfOpen);
    }

    #[test]
    fn test_state_kind_display() {
        assert_eq!(CircuitState::default().kind().to_string(), "Closed");
        assert_eq!(CircuitState::from(HalfOpen).kind().to_string(), "HalfOpen");
        assert_eq!(
            CircuitState::from(Open { opened_at: 1 }).kind(),
            StateKind::Open
        );
    }
}
