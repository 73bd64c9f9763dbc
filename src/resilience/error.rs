//! Errors surfaced by a protected call.

use thiserror::Error;

/// Circuit breaker error.
///
/// `E` is the error type of the wrapped operation. It is carried unchanged in
/// [`CircuitBreakerError::Inner`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError<E> {
    /// The breaker is already bound to a protected call.
    #[error("circuit breaker is already bound to a protected call")]
    AlreadyInUse,

    /// The circuit is open; the operation was not attempted.
    #[error("circuit breaker is open, call was not attempted")]
    FailFast,

    /// The wrapped operation failed.
    #[error("operation failed: {0}")]
    Inner(#[source] E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_fail_fast(&self) -> bool {
        matches!(self, CircuitBreakerError::FailFast)
    }

    pub fn is_already_in_use(&self) -> bool {
        matches!(self, CircuitBreakerError::AlreadyInUse)
    }

    /// The wrapped operation's error, if that is what this is.
    pub fn inner(&self) -> Option<&E> {
        match self {
            CircuitBreakerError::Inner(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_error_messages() {
        let err: CircuitBreakerError<io::Error> = CircuitBreakerError::FailFast;
        assert!(err.to_string().contains("open"));
        assert!(err.is_fail_fast());

        let err: CircuitBreakerError<io::Error> = CircuitBreakerError::AlreadyInUse;
        assert!(err.to_string().contains("already bound"));
        assert!(err.is_already_in_use());
    }

    #[test]
    fn test_inner_keeps_source() {
        let err = CircuitBreakerError::Inner(io::Error::other("disk on fire"));
        assert!(err.to_string().contains("disk on fire"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk on fire"));

        let inner = err.into_inner().expect("inner error");
        assert_eq!(inner.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_breaker_errors_have_no_inner() {
        let err: CircuitBreakerError<String> = CircuitBreakerError::FailFast;
        assert!(err.inner().is_none());
        assert!(err.into_inner().is_none());
    }
}
