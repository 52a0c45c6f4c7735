//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 错误类型定义
//!
//! 使用thiserror定义所有错误类型。

use std::time::Duration;
use thiserror::Error;

/// 熔断器调用错误
///
/// `E` 为被保护操作（以及降级操作）自身的错误类型。
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    /// 操作超时
    #[error("操作超时: 超过 {0:?} 未完成")]
    Timeout(Duration),

    /// 操作失败
    #[error("操作失败: {0}")]
    Action(E),

    /// 熔断器打开且未配置降级
    #[error("熔断器 {breaker} 打开，请求被拒绝且未配置降级 (剩余冷却 {retry_after:?})")]
    FallbackUnavailable {
        /// 熔断器名称
        breaker: String,
        /// 距离下一次探测的剩余时间
        retry_after: Duration,
    },

    /// 降级操作失败
    #[error("降级失败: {0}")]
    Fallback(E),
}

impl<E> BreakerError<E> {
    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, BreakerError::Timeout(_))
    }

    /// 是否为熔断拒绝（操作未被执行）
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerError::FallbackUnavailable { .. })
    }

    /// 取出被保护操作的原始错误
    pub fn into_action_error(self) -> Option<E> {
        match self {
            BreakerError::Action(e) => Some(e),
            _ => None,
        }
    }

    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            BreakerError::Timeout(_) => ErrorKind::Timeout,
            BreakerError::Action(_) => ErrorKind::ActionFailure,
            BreakerError::FallbackUnavailable { .. } => ErrorKind::FallbackUnavailable,
            BreakerError::Fallback(_) => ErrorKind::FallbackFailure,
        }
    }
}

/// 错误分类，用于日志和指标标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// 超时
    Timeout,
    /// 操作失败
    ActionFailure,
    /// 无可用降级
    FallbackUnavailable,
    /// 降级失败
    FallbackFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ActionFailure => "action_failure",
            ErrorKind::FallbackUnavailable => "fallback_unavailable",
            ErrorKind::FallbackFailure => "fallback_failure",
        }
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 校验失败
    #[error("配置错误: {0}")]
    Invalid(String),

    /// YAML解析错误
    #[error("YAML解析错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML解析错误
    #[error("TOML解析错误: {0}")]
    Toml(#[from] toml::de::Error),
}

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CircuitState {
    /// 关闭状态（正常）
    Closed,
    /// 打开状态（熔断）
    Open,
    /// 半开状态（探测）
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 熔断器统计信息
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerStats {
    /// 熔断器名称
    pub name: String,
    /// 当前状态
    pub state: CircuitState,
    /// 失败次数（自上次关闭起）
    pub failure_count: u64,
    /// 成功次数（自上次关闭起）
    pub success_count: u64,
    /// 当前失败率（百分比，向下取整）
    pub failure_rate_percent: u32,
    /// 总调用次数
    pub total_calls: u64,
    /// 被拒绝的调用次数
    pub rejected_calls: u64,
    /// 超时次数
    pub timeouts: u64,
    /// 降级调用次数
    pub fallback_calls: u64,
    /// 最后状态变更时间
    pub last_state_change: Option<chrono::DateTime<chrono::Utc>>,
    /// 距离下一次探测的剩余时间（仅打开状态）
    pub retry_after: Option<Duration>,
}
