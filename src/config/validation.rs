//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, probabilities within [0, 1])
//! - Reject log levels the subscriber would not understand
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `breaker.max_failures`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.breaker.max_failures == 0 {
        errors.push(ValidationError::new(
            "breaker.max_failures",
            "must be at least 1",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "unknown level '{}', expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    let rate = config.simulation.failure_rate;
    if !(0.0..=1.0).contains(&rate) {
        errors.push(ValidationError::new(
            "simulation.failure_rate",
            format!("{rate} is outside [0.0, 1.0]"),
        ));
    }

    if config.simulation.breaker_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "simulation.breaker_name",
            "must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.breaker.max_failures = 0;
        config.observability.log_level = "loud".into();
        config.simulation.failure_rate = 1.5;
        config.simulation.breaker_name = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "breaker.max_failures",
                "observability.log_level",
                "simulation.failure_rate",
                "simulation.breaker_name",
            ]
        );
        assert!(errors[1].to_string().contains("loud"));
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = AppConfig::default();
        config.observability.log_level = "WARN".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_reset_timeout_is_allowed() {
        let mut config = AppConfig::default();
        config.breaker.reset_timeout_ms = 0;
        assert!(validate_config(&config).is_ok());
    }
}
