//! 超时守卫
//!
//! 让被保护操作与计时器竞争，先完成者决定结果。
//!
//! 计时器先触发时操作的 future 会被直接丢弃，
//! 因此迟到的结果既不会交付给调用方，也不会再次修改熔断器状态。

use crate::error::BreakerError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// 超时守卫
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    timeout: Option<Duration>,
}

impl TimeoutGuard {
    /// 创建超时守卫，`None` 表示不限制时间
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// 超时时间，`None` 表示不限制
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 执行操作
    ///
    /// # 返回
    /// - `Ok(T)`: 操作在截止时间前成功
    /// - `Err(BreakerError::Action)`: 操作在截止时间前失败，错误原样转发
    /// - `Err(BreakerError::Timeout)`: 计时器先触发
    pub async fn run<F, Fut, T, E>(&self, action: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(limit) = self.timeout else {
            return action().await.map_err(BreakerError::Action);
        };

        match tokio::time::timeout(limit, action()).await {
            Ok(result) => result.map_err(BreakerError::Action),
            Err(_) => {
                debug!("操作超时: limit={:?}", limit);
                Err(BreakerError::Timeout(limit))
            }
        }
    }
}
