//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Centralized configuration constants for Circuitron.
//!
//! All default values used by [`CircuitBreakerConfig`] are defined here.
//!
//! [`CircuitBreakerConfig`]: crate::config::CircuitBreakerConfig

// ============================================================================
// Circuit Breaker Constants
// ============================================================================

/// Default timeout for the protected action (1 second).
///
/// An action that has not completed after this long is counted as a failure.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Default cooldown before an open circuit admits a probe (30 seconds).
pub const DEFAULT_RESET_TIMEOUT_MS: u64 = 30_000;

/// Default failure-rate boundary, in percent.
///
/// The circuit trips once the floor-rounded failure rate reaches this value.
pub const DEFAULT_ERROR_THRESHOLD_PERCENT: u32 = 50;

/// Upper bound for `error_threshold_percent`.
pub const MAX_ERROR_THRESHOLD_PERCENT: u32 = 100;

/// Capacity of the state transition broadcast channel.
///
/// Slow subscribers that fall further behind than this observe `Lagged`.
pub const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Prefix used for generated breaker names.
pub const DEFAULT_BREAKER_NAME_PREFIX: &str = "breaker";
