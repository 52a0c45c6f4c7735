//! Prelude module - Commonly used types for quick imports
//!
//! This module re-exports the most commonly used types from Circuitron,
//! allowing users to import them with a single `use circuitron::prelude::*;`
//! statement instead of importing each type individually.

// Core types - always available
pub use crate::circuit_breaker::{CircuitBreaker, StateTransition};
pub use crate::config::CircuitBreakerConfig;
pub use crate::error::{BreakerError, CircuitState};
pub use crate::fallback::{Fallback, FallbackInvoker};

// Feature-gated exports
#[cfg(feature = "monitoring")]
pub use crate::telemetry::BreakerMetrics;
