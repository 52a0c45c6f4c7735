//! 边界适配器
//!
//! 熔断器只需要"最终成功或失败的一个 future"。
//! 这里把事件流式、回调式的客户端响应转换成这样的 future，
//! 调用方在边界处完成适配后再交给 [`CircuitBreaker::fire`](crate::CircuitBreaker::fire)。

use futures::{Stream, StreamExt};
use std::future::Future;
use thiserror::Error;
use tokio::sync::oneshot;

/// 适配错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AdapterError<E> {
    /// 响应流结束但没有产生任何值
    #[error("响应流为空")]
    Empty,

    /// 回调在完成前被丢弃
    #[error("回调在完成前被丢弃")]
    Dropped,

    /// 上游返回的错误
    #[error("上游错误: {0}")]
    Upstream(E),
}

/// 取响应流的第一个元素
///
/// # 示例
/// ```rust
/// use circuitron::adapter::first_value;
/// use futures::stream;
///
/// # #[tokio::main]
/// # async fn main() {
/// let response = stream::iter(vec![Ok::<u32, String>(6)]);
/// assert_eq!(first_value(response).await.unwrap(), 6);
/// # }
/// ```
pub async fn first_value<S, T, E>(stream: S) -> Result<T, AdapterError<E>>
where
    S: Stream<Item = Result<T, E>>,
{
    futures::pin_mut!(stream);
    match stream.next().await {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(AdapterError::Upstream(e)),
        None => Err(AdapterError::Empty),
    }
}

/// 回调完成器
///
/// 交给回调式API，在 `next`/`error` 回调里调用一次即可。
#[derive(Debug)]
pub struct Completer<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Completer<T, E> {
    /// 以成功结果完成
    pub fn resolve(self, value: T) {
        self.complete(Ok(value));
    }

    /// 以失败结果完成
    pub fn reject(self, error: E) {
        self.complete(Err(error));
    }

    /// 完成回调；等待方已放弃时结果被丢弃
    pub fn complete(self, result: Result<T, E>) {
        let _ = self.sender.send(result);
    }
}

/// 创建一对回调完成器和对应的 future
pub fn completion<T, E>() -> (
    Completer<T, E>,
    impl Future<Output = Result<T, AdapterError<E>>>,
) {
    let (sender, receiver) = oneshot::channel();
    let future = async move {
        match receiver.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AdapterError::Upstream(e)),
            Err(_) => Err(AdapterError::Dropped),
        }
    };
    (Completer { sender }, future)
}
