//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CircuitBreakerConfig handed to the breaker at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a breaker never sees a config change
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::ObservabilityConfig;
pub use schema::SimulationConfig;
