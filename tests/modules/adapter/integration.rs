//! 适配器模块集成测试
//!
//! 测试回调式/流式客户端经适配后交给熔断器

use circuitron::{completion, first_value, AdapterError, BreakerError, CircuitBreaker};
use circuitron::CircuitBreakerConfig;
use futures::stream;
use std::time::Duration;

/// 模拟回调式客户端：在 next/error 回调中交付结果
fn send_with_callback(payload: Vec<u32>, completer: circuitron::Completer<u32, String>) {
    tokio::spawn(async move {
        if payload.is_empty() {
            completer.reject("empty payload".to_string());
        } else {
            completer.resolve(payload.iter().sum());
        }
    });
}

#[tokio::test]
async fn test_callback_client_through_breaker() {
    let breaker: CircuitBreaker<u32, AdapterError<String>> =
        CircuitBreaker::new(CircuitBreakerConfig::default().name("sum")).unwrap();

    let result = breaker
        .fire(|| {
            let (completer, response) = completion();
            send_with_callback(vec![1, 2, 3], completer);
            response
        })
        .await;
    assert_eq!(result.unwrap(), 6);

    let result = breaker
        .fire(|| {
            let (completer, response) = completion();
            send_with_callback(vec![], completer);
            response
        })
        .await;
    assert!(matches!(
        result,
        Err(BreakerError::Action(AdapterError::Upstream(ref e))) if e == "empty payload"
    ));
}

#[tokio::test]
async fn test_stream_client_through_breaker() {
    let breaker: CircuitBreaker<u32, AdapterError<String>> =
        CircuitBreaker::new(CircuitBreakerConfig::default().error_threshold_percent(100)).unwrap();

    let result = breaker
        .fire(|| first_value(stream::iter(vec![Ok::<u32, String>(6)])))
        .await;
    assert_eq!(result.unwrap(), 6);

    // 空流按失败计数
    let result = breaker
        .fire(|| first_value(stream::empty::<Result<u32, String>>()))
        .await;
    assert!(matches!(result, Err(BreakerError::Action(AdapterError::Empty))));
    assert_eq!(breaker.stats().failure_count, 1);
    assert!(breaker.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_never_completed_callback_times_out() {
    let breaker: CircuitBreaker<u32, AdapterError<String>> = CircuitBreaker::new(
        CircuitBreakerConfig::default().timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let (completer, response) = completion::<u32, String>();
    let result = breaker.fire(|| response).await;
    assert!(result.unwrap_err().is_timeout());
    drop(completer);
}
