//! 监控模块
//!
//! 熔断器的Prometheus指标。
//!
//! # 示例
//!
//! ```rust
//! use circuitron::telemetry::BreakerMetrics;
//!
//! let metrics = BreakerMetrics::new("math_service").unwrap();
//! metrics.calls_total.inc();
//! assert!(metrics.gather().contains("circuitron_calls_total"));
//! ```

use crate::error::CircuitState;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use tracing::error;

/// 熔断器监控指标
#[derive(Clone)]
pub struct BreakerMetrics {
    /// 总调用数
    pub calls_total: IntCounter,
    /// 成功数
    pub successes_total: IntCounter,
    /// 失败数（含超时）
    pub failures_total: IntCounter,
    /// 超时数
    pub timeouts_total: IntCounter,
    /// 熔断拒绝数
    pub rejections_total: IntCounter,
    /// 降级调用数
    pub fallbacks_total: IntCounter,
    /// 状态转换数
    pub transitions_total: IntCounter,
    /// 当前状态：0=Closed, 1=HalfOpen, 2=Open
    pub state: IntGauge,
    registry: Registry,
}

impl BreakerMetrics {
    /// 创建并注册指标，所有指标带 `breaker` 常量标签
    pub fn new(breaker: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let calls_total = counter(
            &registry,
            breaker,
            "circuitron_calls_total",
            "Total number of fire calls",
        )?;
        let successes_total = counter(
            &registry,
            breaker,
            "circuitron_successes_total",
            "Total number of successful protected actions",
        )?;
        let failures_total = counter(
            &registry,
            breaker,
            "circuitron_failures_total",
            "Total number of failed protected actions, including timeouts",
        )?;
        let timeouts_total = counter(
            &registry,
            breaker,
            "circuitron_timeouts_total",
            "Total number of protected actions that timed out",
        )?;
        let rejections_total = counter(
            &registry,
            breaker,
            "circuitron_rejections_total",
            "Total number of calls short-circuited by an open circuit",
        )?;
        let fallbacks_total = counter(
            &registry,
            breaker,
            "circuitron_fallbacks_total",
            "Total number of fallback invocations",
        )?;
        let transitions_total = counter(
            &registry,
            breaker,
            "circuitron_transitions_total",
            "Total number of state transitions",
        )?;

        let state = IntGauge::with_opts(
            Opts::new("circuitron_state", "Current circuit state (0=closed, 1=half_open, 2=open)")
                .const_label("breaker", breaker),
        )?;
        registry.register(Box::new(state.clone()))?;

        Ok(Self {
            calls_total,
            successes_total,
            failures_total,
            timeouts_total,
            rejections_total,
            fallbacks_total,
            transitions_total,
            state,
            registry,
        })
    }

    /// 记录状态转换
    pub fn record_transition(&self, to: CircuitState) {
        self.transitions_total.inc();
        self.state.set(state_value(to));
    }

    /// 指标注册表
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 导出文本格式指标
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn counter(
    registry: &Registry,
    breaker: &str,
    name: &str,
    help: &str,
) -> Result<IntCounter, prometheus::Error> {
    let counter = IntCounter::with_opts(Opts::new(name, help).const_label("breaker", breaker))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn state_value(state: CircuitState) -> i64 {
    match state {
        CircuitState::Closed => 0,
        CircuitState::HalfOpen => 1,
        CircuitState::Open => 2,
    }
}
