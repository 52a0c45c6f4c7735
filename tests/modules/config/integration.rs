//! 配置模块集成测试
//!
//! 测试从配置文件内容构建熔断器

use crate::common::{DownstreamError, MockDownstream, Step};
use circuitron::{CircuitBreaker, CircuitBreakerConfig, ConfigError};
use std::time::Duration;

/// 从YAML构建熔断器
#[tokio::test(start_paused = true)]
async fn test_breaker_from_yaml() {
    let yaml = r#"
name: "math_service"
timeout_ms: 200
reset_timeout_ms: 5000
error_threshold_percent: 100
"#;
    let config = CircuitBreakerConfig::from_yaml_str(yaml).unwrap();
    let breaker: CircuitBreaker<u32, DownstreamError> = CircuitBreaker::new(config).unwrap();
    assert_eq!(breaker.name(), "math_service");

    let downstream = MockDownstream::new([Step::Slow(Duration::from_millis(300), 1)]);
    let result = breaker.fire(|| downstream.call()).await;
    assert!(result.unwrap_err().is_timeout());
    assert!(breaker.is_open());
    assert_eq!(breaker.stats().retry_after, Some(Duration::from_millis(5000)));
}

/// 从TOML构建熔断器，未写的字段使用默认值
#[test]
fn test_breaker_from_toml_defaults() {
    let config = CircuitBreakerConfig::from_toml_str("name = \"partial\"\n").unwrap();
    let breaker: CircuitBreaker<u32, DownstreamError> = CircuitBreaker::new(config).unwrap();

    let config = breaker.config();
    assert_eq!(config.timeout_duration(), Some(Duration::from_millis(1000)));
    assert_eq!(config.reset_timeout_duration(), Duration::from_millis(30000));
    assert_eq!(config.error_threshold_percent, 50);
}

/// 无效配置在构建时被拒绝
#[test]
fn test_invalid_config_rejected() {
    let config = CircuitBreakerConfig::default().reset_timeout(Duration::ZERO);
    let result: Result<CircuitBreaker<u32, DownstreamError>, _> = CircuitBreaker::new(config);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let result = CircuitBreakerConfig::from_yaml_str("timeout_ms: [1, 2]");
    assert!(matches!(result, Err(ConfigError::Yaml(_))));
}
