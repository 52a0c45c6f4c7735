//! 配置模块
//!
//! 定义熔断器的配置结构，支持从YAML/TOML加载。

use crate::constants::{
    DEFAULT_BREAKER_NAME_PREFIX, DEFAULT_ERROR_THRESHOLD_PERCENT, DEFAULT_RESET_TIMEOUT_MS,
    DEFAULT_TIMEOUT_MS, MAX_ERROR_THRESHOLD_PERCENT,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 熔断器配置
///
/// 所有字段都有默认值，配置文件中可以只写需要覆盖的部分。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// 熔断器名称（用于日志、指标和状态事件）
    pub name: String,
    /// 被保护操作的超时时间（毫秒），0 表示不限制
    pub timeout_ms: u64,
    /// 打开状态的冷却时间（毫秒），之后允许一次探测
    pub reset_timeout_ms: u64,
    /// 失败率阈值（百分比），达到即熔断
    pub error_threshold_percent: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: generate_name(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reset_timeout_ms: DEFAULT_RESET_TIMEOUT_MS,
            error_threshold_percent: DEFAULT_ERROR_THRESHOLD_PERCENT,
        }
    }
}

/// 转换为毫秒：非零的亚毫秒时长向上取整到1毫秒，超出范围时饱和
fn duration_to_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis().max(u128::from(!duration.is_zero()));
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn generate_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", DEFAULT_BREAKER_NAME_PREFIX, &id[..8])
}

impl CircuitBreakerConfig {
    /// 创建新的熔断器配置
    pub fn new(timeout: Duration, reset_timeout: Duration, error_threshold_percent: u32) -> Self {
        Self {
            timeout_ms: duration_to_millis(timeout),
            reset_timeout_ms: duration_to_millis(reset_timeout),
            error_threshold_percent,
            ..Default::default()
        }
    }

    /// 设置名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置超时时间
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_to_millis(timeout);
        self
    }

    /// 设置冷却时间
    pub fn reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout_ms = duration_to_millis(reset_timeout);
        self
    }

    /// 设置失败率阈值
    pub fn error_threshold_percent(mut self, percent: u32) -> Self {
        self.error_threshold_percent = percent;
        self
    }

    /// 超时时间，`None` 表示不限制
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// 冷却时间
    pub fn reset_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("熔断器名称不能为空".to_string()));
        }

        if self.error_threshold_percent == 0
            || self.error_threshold_percent > MAX_ERROR_THRESHOLD_PERCENT
        {
            return Err(ConfigError::Invalid(format!(
                "无效的失败率阈值: {}, 有效范围: 1..={}",
                self.error_threshold_percent, MAX_ERROR_THRESHOLD_PERCENT
            )));
        }

        // 冷却时间为0时打开状态无法保证 next_attempt_at 在未来
        if self.reset_timeout_ms == 0 {
            return Err(ConfigError::Invalid("冷却时间必须大于0".to_string()));
        }

        Ok(())
    }

    /// 从YAML字符串加载并校验
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从TOML字符串加载并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
