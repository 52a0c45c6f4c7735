//! 降级模块集成测试
//!
//! 测试降级与熔断器的配合

use crate::common::{create_breaker, DownstreamError, MockDownstream, Step};
use circuitron::{BreakerError, FallbackInvoker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 操作失败时调用降级
#[tokio::test(start_paused = true)]
async fn test_fallback_on_action_failure() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();
    let breaker = create_breaker("fallback_on_failure").with_fallback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<u32, DownstreamError>(7) }
    });
    let downstream = MockDownstream::new([Step::Ok(1), Step::Ok(2), Step::Fail("down")]);

    assert_eq!(breaker.fire(|| downstream.call()).await.unwrap(), 1);
    assert_eq!(breaker.fire(|| downstream.call()).await.unwrap(), 2);
    // 1/3 = 33%，未熔断但仍走降级
    assert_eq!(breaker.fire(|| downstream.call()).await.unwrap(), 7);
    assert!(breaker.is_closed());
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(breaker.stats().fallback_calls, 1);
}

/// 超时同样走降级
#[tokio::test(start_paused = true)]
async fn test_fallback_on_timeout() {
    let breaker = create_breaker("fallback_on_timeout")
        .with_fallback_invoker(FallbackInvoker::value(0));
    let downstream = MockDownstream::new([Step::Hang]);

    assert_eq!(breaker.fire(|| downstream.call()).await.unwrap(), 0);
    assert_eq!(breaker.stats().timeouts, 1);
}

/// 降级本身失败时原样返回给调用方
#[tokio::test(start_paused = true)]
async fn test_fallback_failure_propagates() {
    let breaker = create_breaker("fallback_failure").with_fallback(|| async {
        Err::<u32, DownstreamError>(DownstreamError("cache miss".to_string()))
    });
    let downstream = MockDownstream::new([Step::Fail("down")]);

    let result = breaker.fire(|| downstream.call()).await;
    match result {
        Err(BreakerError::Fallback(DownstreamError(reason))) => assert_eq!(reason, "cache miss"),
        other => panic!("unexpected result: {:?}", other),
    }

    // 打开状态下的降级失败同样透传
    let result = breaker.fire(|| downstream.call()).await;
    assert!(matches!(result, Err(BreakerError::Fallback(_))));
    assert_eq!(downstream.calls(), 1);
}

/// 成功时不调用降级
#[tokio::test(start_paused = true)]
async fn test_fallback_not_invoked_on_success() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();
    let breaker = create_breaker("fallback_unused").with_fallback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<u32, DownstreamError>(0) }
    });
    let downstream = MockDownstream::new([Step::Ok(6)]);

    assert_eq!(breaker.fire(|| downstream.call()).await.unwrap(), 6);
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}
