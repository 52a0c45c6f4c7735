//! 熔断器实现
//!
//! 提供熔断器功能，支持三状态转换、超时守卫和降级。
//!
//! # 特性
//!
//! - **三状态**: Closed（关闭）、Open（打开）、HalfOpen（半开）
//! - **失败率熔断**: 失败率达到阈值自动熔断
//! - **自动恢复**: 冷却期结束后放行单个探测请求
//! - **超时守卫**: 超时按失败计数
//! - **降级**: 熔断或失败时返回替代结果
//! - **状态事件**: 通过广播通道订阅状态变更
//!
//! 状态和计数由同一把锁保护，每次"检查-决策-变更"都在一个临界区内完成；
//! 被保护的操作本身在锁外并发执行。

use crate::config::CircuitBreakerConfig;
use crate::constants::TRANSITION_CHANNEL_CAPACITY;
use crate::error::{BreakerError, CircuitBreakerStats, CircuitState, ConfigError};
use crate::failure_rate::FailureRateTracker;
use crate::fallback::{Fallback, FallbackInvoker};
#[cfg(feature = "monitoring")]
use crate::telemetry::BreakerMetrics;
use crate::timeout_guard::TimeoutGuard;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "monitoring")]
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// 更新Prometheus指标，未启用 `monitoring` 时为空操作
macro_rules! record_metric {
    ($breaker:expr, $m:ident => $body:expr) => {{
        #[cfg(feature = "monitoring")]
        {
            if let Some($m) = &$breaker.metrics {
                $body;
            }
        }
    }};
}

/// 状态变更事件
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateTransition {
    /// 熔断器名称
    pub breaker: String,
    /// 原状态
    pub from: CircuitState,
    /// 新状态
    pub to: CircuitState,
    /// 变更时间
    pub at: DateTime<Utc>,
}

/// 锁内的可变状态
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    tracker: FailureRateTracker,
    /// 打开状态下允许下一次探测的时间点
    next_attempt_at: Option<Instant>,
    /// 当前在途探测的编号
    probe: Option<u64>,
    next_probe_id: u64,
    last_state_change: Option<DateTime<Utc>>,
}

/// 准入结果
enum Admission {
    Admitted { probe: Option<u64> },
    Rejected { retry_after: Duration },
}

/// 熔断器
///
/// `T` 为被保护操作的结果类型，`E` 为其错误类型。降级操作必须产生相同的类型。
pub struct CircuitBreaker<T, E> {
    name: String,
    config: CircuitBreakerConfig,
    guard: TimeoutGuard,
    fallback: FallbackInvoker<T, E>,
    inner: Mutex<BreakerState>,
    total_calls: AtomicU64,
    rejected_calls: AtomicU64,
    timeouts: AtomicU64,
    fallback_calls: AtomicU64,
    transitions: broadcast::Sender<StateTransition>,
    #[cfg(feature = "monitoring")]
    metrics: Option<Arc<BreakerMetrics>>,
}

impl<T, E> CircuitBreaker<T, E> {
    /// 创建新的熔断器
    ///
    /// # 参数
    /// - `config`: 熔断器配置，创建前会校验
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::{CircuitBreaker, CircuitBreakerConfig};
    /// use std::time::Duration;
    ///
    /// let config = CircuitBreakerConfig::new(
    ///     Duration::from_secs(1),
    ///     Duration::from_secs(30),
    ///     50,
    /// );
    /// let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config).unwrap();
    /// ```
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "创建熔断器: name={}, timeout_ms={}, reset_timeout_ms={}, error_threshold_percent={}",
            config.name, config.timeout_ms, config.reset_timeout_ms, config.error_threshold_percent
        );

        Ok(Self::build(config))
    }

    fn build(config: CircuitBreakerConfig) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Self {
            name: config.name.clone(),
            guard: TimeoutGuard::new(config.timeout_duration()),
            config,
            fallback: FallbackInvoker::none(),
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                tracker: FailureRateTracker::new(),
                next_attempt_at: None,
                probe: None,
                next_probe_id: 0,
                last_state_change: Some(Utc::now()),
            }),
            total_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            fallback_calls: AtomicU64::new(0),
            transitions,
            #[cfg(feature = "monitoring")]
            metrics: None,
        }
    }

    /// 设置降级操作
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fallback<T, E> + 'static,
    {
        self.fallback = FallbackInvoker::new(fallback);
        self
    }

    /// 设置降级调用器
    pub fn with_fallback_invoker(mut self, fallback: FallbackInvoker<T, E>) -> Self {
        self.fallback = fallback;
        self
    }

    /// 挂载Prometheus指标
    #[cfg(feature = "monitoring")]
    pub fn with_metrics(mut self, metrics: Arc<BreakerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// 执行操作，自动处理熔断、超时和降级
    ///
    /// # 参数
    /// - `action`: 要保护的操作，每次调用最多执行一次
    ///
    /// # 返回
    /// - `Ok(T)`: 操作成功，或降级成功
    /// - `Err(BreakerError::FallbackUnavailable)`: 熔断拒绝且未配置降级
    /// - `Err(BreakerError::Timeout | BreakerError::Action)`: 操作失败且未配置降级
    /// - `Err(BreakerError::Fallback)`: 降级本身失败
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::{CircuitBreaker, CircuitBreakerConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let breaker = CircuitBreaker::new(CircuitBreakerConfig::default())
    ///     .unwrap()
    ///     .with_fallback(|| async { Ok::<u32, String>(0) });
    ///
    /// let result = breaker.fire(|| async { Ok::<u32, String>(6) }).await;
    /// assert_eq!(result.unwrap(), 6);
    /// # }
    /// ```
    pub async fn fire<F, Fut>(&self, action: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        record_metric!(self, m => m.calls_total.inc());

        let probe = match self.admit() {
            Admission::Admitted { probe } => probe,
            Admission::Rejected { retry_after } => {
                self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                record_metric!(self, m => m.rejections_total.inc());
                warn!(
                    "熔断器打开，拒绝请求: name={}, retry_after={:?}",
                    self.name, retry_after
                );
                return self
                    .fallback_or(BreakerError::FallbackUnavailable {
                        breaker: self.name.clone(),
                        retry_after,
                    })
                    .await;
            }
        };

        // 调用方在操作完成前丢弃 future 时释放探测名额
        let mut slot = ProbeSlot {
            breaker: self,
            probe,
        };

        let outcome = self.guard.run(action).await;
        slot.disarm();

        match outcome {
            Ok(value) => {
                self.on_success(probe);
                Ok(value)
            }
            Err(error) => {
                self.on_failure(probe, error.is_timeout());
                self.fallback_or(error).await
            }
        }
    }

    /// 检查状态并决定是否放行，整个过程在一个临界区内
    fn admit(&self) -> Admission {
        let mut inner = self.inner.lock();
        let state = inner.state;
        let next_attempt_at = inner.next_attempt_at;

        match state {
            CircuitState::Closed => Admission::Admitted { probe: None },
            CircuitState::Open => {
                let now = Instant::now();
                match next_attempt_at {
                    Some(at) if now <= at => Admission::Rejected {
                        retry_after: at - now,
                    },
                    _ => {
                        // 先转换到半开，再执行探测
                        self.transition(&mut inner, CircuitState::HalfOpen);
                        Admission::Admitted {
                            probe: Some(start_probe(&mut inner)),
                        }
                    }
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe.is_some() {
                    Admission::Rejected {
                        retry_after: Duration::ZERO,
                    }
                } else {
                    Admission::Admitted {
                        probe: Some(start_probe(&mut inner)),
                    }
                }
            }
        }
    }

    /// 操作成功时的处理
    fn on_success(&self, probe: Option<u64>) {
        record_metric!(self, m => m.successes_total.inc());

        let mut inner = self.inner.lock();
        inner.tracker.record_success();
        let is_probe = finish_probe(&mut inner, probe);
        let state = inner.state;

        match state {
            CircuitState::HalfOpen if is_probe => {
                let rate = inner.tracker.current_rate_percent();
                if rate < self.config.error_threshold_percent {
                    self.transition(&mut inner, CircuitState::Closed);
                } else {
                    // 失败率仍高于阈值，保持半开，下一次调用继续探测
                    debug!(
                        "探测成功但失败率未降到阈值以下: name={}, rate={}%",
                        self.name, rate
                    );
                }
            }
            state => {
                trace!("操作成功: name={}, state={:?}", self.name, state);
            }
        }
    }

    /// 操作失败时的处理
    fn on_failure(&self, probe: Option<u64>, timed_out: bool) {
        record_metric!(self, m => m.failures_total.inc());
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
            record_metric!(self, m => m.timeouts_total.inc());
        }

        let mut inner = self.inner.lock();
        inner.tracker.record_failure();
        let is_probe = finish_probe(&mut inner, probe);
        let rate = inner.tracker.current_rate_percent();
        let state = inner.state;

        match state {
            // 探测失败无论失败率如何都重新打开
            CircuitState::HalfOpen if is_probe => {
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed if rate >= self.config.error_threshold_percent => {
                self.transition(&mut inner, CircuitState::Open);
            }
            state => {
                trace!(
                    "操作失败: name={}, state={:?}, rate={}%, timed_out={}",
                    self.name,
                    state,
                    rate,
                    timed_out
                );
            }
        }
    }

    /// 状态转换，调用方必须持有锁
    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        let now = Utc::now();
        inner.last_state_change = Some(now);

        match to {
            CircuitState::Open => {
                inner.next_attempt_at = Some(Instant::now() + self.config.reset_timeout_duration());
                inner.probe = None;
                warn!(
                    "熔断器状态变更: {:?} -> Open (name={}, failure_count={}, success_count={}, rate={}%)",
                    from,
                    self.name,
                    inner.tracker.failure_count(),
                    inner.tracker.success_count(),
                    inner.tracker.current_rate_percent()
                );
            }
            CircuitState::HalfOpen => {
                info!("熔断器状态变更: {:?} -> HalfOpen (name={})", from, self.name);
            }
            CircuitState::Closed => {
                inner.tracker.reset();
                inner.next_attempt_at = None;
                inner.probe = None;
                info!("熔断器状态变更: {:?} -> Closed (name={})", from, self.name);
            }
        }

        record_metric!(self, m => m.record_transition(to));

        // 没有订阅者时发送失败，忽略即可
        let _ = self.transitions.send(StateTransition {
            breaker: self.name.clone(),
            from,
            to,
            at: now,
        });
    }

    /// 调用降级；未配置降级时返回给定错误
    async fn fallback_or(&self, error: BreakerError<E>) -> Result<T, BreakerError<E>> {
        match self.fallback.invoke().await {
            Some(result) => {
                self.fallback_calls.fetch_add(1, Ordering::Relaxed);
                record_metric!(self, m => m.fallbacks_total.inc());
                debug!("执行降级: name={}, reason={}", self.name, error.kind().as_str());
                result
            }
            None => Err(error),
        }
    }

    /// 订阅状态变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.transitions.subscribe()
    }

    /// 检查熔断器是否打开
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// 检查熔断器是否半开
    pub fn is_half_open(&self) -> bool {
        self.state() == CircuitState::HalfOpen
    }

    /// 检查熔断器是否关闭
    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// 获取当前状态
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// 打开状态下允许下一次探测的时间点
    pub fn next_attempt_at(&self) -> Option<Instant> {
        self.inner.lock().next_attempt_at
    }

    /// 重置熔断器到关闭状态
    pub fn reset(&self) {
        info!("重置熔断器: name={}", self.name);
        let mut inner = self.inner.lock();
        self.transition(&mut inner, CircuitState::Closed);
        inner.tracker.reset();
        inner.next_attempt_at = None;
        inner.probe = None;
    }

    /// 获取统计信息
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        let retry_after = match (inner.state, inner.next_attempt_at) {
            (CircuitState::Open, Some(at)) => Some(at.saturating_duration_since(Instant::now())),
            _ => None,
        };

        CircuitBreakerStats {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.tracker.failure_count(),
            success_count: inner.tracker.success_count(),
            failure_rate_percent: inner.tracker.current_rate_percent(),
            total_calls: self.total_calls.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            fallback_calls: self.fallback_calls.load(Ordering::Relaxed),
            last_state_change: inner.last_state_change,
            retry_after,
        }
    }

    /// 熔断器名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取配置
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl<T, E> Default for CircuitBreaker<T, E> {
    fn default() -> Self {
        Self::build(CircuitBreakerConfig::default())
    }
}

impl<T, E> std::fmt::Debug for CircuitBreaker<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("config", &self.config)
            .field("fallback", &self.fallback)
            .finish()
    }
}

fn start_probe(inner: &mut BreakerState) -> u64 {
    let id = inner.next_probe_id;
    inner.next_probe_id = inner.next_probe_id.wrapping_add(1);
    inner.probe = Some(id);
    id
}

/// 若结果来自当前在途探测则释放名额并返回true
fn finish_probe(inner: &mut BreakerState, probe: Option<u64>) -> bool {
    match probe {
        Some(id) if inner.probe == Some(id) => {
            inner.probe = None;
            true
        }
        _ => false,
    }
}

/// 探测名额守卫
///
/// `fire` 的 future 在操作完成前被丢弃时，释放探测名额，让后续调用可以重新探测。
struct ProbeSlot<'a, T, E> {
    breaker: &'a CircuitBreaker<T, E>,
    probe: Option<u64>,
}

impl<T, E> ProbeSlot<'_, T, E> {
    fn disarm(&mut self) {
        self.probe = None;
    }
}

impl<T, E> Drop for ProbeSlot<'_, T, E> {
    fn drop(&mut self) {
        if self.probe.is_some() {
            let mut inner = self.breaker.inner.lock();
            if finish_probe(&mut inner, self.probe) {
                debug!("探测被取消: name={}", self.breaker.name);
            }
        }
    }
}
