//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Circuitron - Async Circuit Breaker
//!
//! Protects callers from a persistently failing downstream operation: tracks the
//! failure rate of recent calls and, once a threshold is crossed, short-circuits
//! further calls until the downstream is likely to have recovered.
//!
//! # API Layers
//!
//! ## Prelude (Quick Start)
//!
//! Use `use circuitron::prelude::*;` to import all commonly used types.
//!
//! ## Core API
//!
//! - [`CircuitBreaker`] - State machine guarding an async action
//! - [`CircuitBreakerConfig`] - Timeout, cooldown and threshold configuration
//! - [`BreakerError`] - Error types
//! - [`FallbackInvoker`] / [`Fallback`] - Substitute results
//!
//! ## Building Blocks
//!
//! - [`TimeoutGuard`] - Races an action against a deadline
//! - [`FailureRateTracker`] - Cumulative failure percentage
//! - [`adapter`] - Turns stream/callback style responses into a single future
//!
//! ## Extensions (feature-gated)
//!
//! - Prometheus metrics (requires `monitoring` feature)
//!
//! # Examples
//!
//! ```rust
//! use circuitron::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1秒超时，30秒冷却，失败率50%熔断
//!     let config = CircuitBreakerConfig::new(Duration::from_secs(1), Duration::from_secs(30), 50);
//!     let breaker = CircuitBreaker::new(config)
//!         .unwrap()
//!         .with_fallback(|| async { Ok::<u32, String>(0) });
//!
//!     let sum = breaker.fire(|| async { Ok::<u32, String>(1 + 2 + 3) }).await;
//!     assert_eq!(sum.unwrap(), 6);
//! }
//! ```

pub mod prelude;

pub mod adapter;
pub mod circuit_breaker;
pub mod config;
pub mod constants;
pub mod error;
pub mod failure_rate;
pub mod fallback;
#[cfg(feature = "monitoring")]
pub mod telemetry;
pub mod timeout_guard;

// 重新导出常用类型
pub use adapter::{completion, first_value, AdapterError, Completer};
pub use circuit_breaker::{CircuitBreaker, StateTransition};
pub use config::CircuitBreakerConfig;
pub use error::{BreakerError, CircuitBreakerStats, CircuitState, ConfigError, ErrorKind};
pub use failure_rate::FailureRateTracker;
pub use fallback::{Fallback, FallbackInvoker};
#[cfg(feature = "monitoring")]
pub use telemetry::BreakerMetrics;
pub use timeout_guard::TimeoutGuard;
