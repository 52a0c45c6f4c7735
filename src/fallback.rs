//! 降级实现
//!
//! 熔断器打开或操作失败时提供替代结果。
//!
//! # 特性
//!
//! - **异步降级**: 降级操作本身可以是异步的
//! - **闭包即降级**: 任何 `Fn() -> Future<Output = Result<T, E>>` 都可直接作为降级
//! - **显式缺省**: 未配置降级时由熔断器返回明确的错误，而不是空值

use crate::error::BreakerError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// 降级操作
#[async_trait]
pub trait Fallback<T, E>: Send + Sync {
    /// 产生替代结果
    async fn call(&self) -> Result<T, E>;
}

#[async_trait]
impl<T, E, F, Fut> Fallback<T, E> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn call(&self) -> Result<T, E> {
        (self)().await
    }
}

/// 降级调用器
///
/// 包装一个可选的降级操作。
pub struct FallbackInvoker<T, E> {
    fallback: Option<Arc<dyn Fallback<T, E>>>,
}

impl<T, E> FallbackInvoker<T, E> {
    /// 未配置降级
    pub fn none() -> Self {
        Self { fallback: None }
    }

    /// 使用给定的降级操作
    pub fn new<F>(fallback: F) -> Self
    where
        F: Fallback<T, E> + 'static,
    {
        Self {
            fallback: Some(Arc::new(fallback)),
        }
    }

    /// 是否已配置降级
    pub fn is_configured(&self) -> bool {
        self.fallback.is_some()
    }

    /// 调用降级操作
    ///
    /// # 返回
    /// - `None`: 未配置降级
    /// - `Some(Ok(T))`: 降级成功
    /// - `Some(Err(BreakerError::Fallback))`: 降级本身失败，错误原样包装
    pub async fn invoke(&self) -> Option<Result<T, BreakerError<E>>> {
        let fallback = self.fallback.as_ref()?;
        debug!("执行降级操作");
        Some(fallback.call().await.map_err(BreakerError::Fallback))
    }
}

impl<T, E> FallbackInvoker<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// 始终返回固定值的降级
    pub fn value(value: T) -> Self {
        Self::new(move || {
            let value = value.clone();
            async move { Ok(value) }
        })
    }
}

impl<T, E> Clone for FallbackInvoker<T, E> {
    fn clone(&self) -> Self {
        Self {
            fallback: self.fallback.clone(),
        }
    }
}

impl<T, E> Default for FallbackInvoker<T, E> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T, E> std::fmt::Debug for FallbackInvoker<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackInvoker")
            .field("configured", &self.is_configured())
            .finish()
    }
}
