//! 失败率统计
//!
//! 累计自上次重置以来的成功/失败次数，计算向下取整的失败百分比。
//! 没有时间窗口或衰减；需要滑动窗口的调用方应在外层自行封装。

/// 失败率统计器
///
/// 本身不做同步，由 [`CircuitBreaker`](crate::CircuitBreaker) 在锁内调用。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureRateTracker {
    success_count: u64,
    failure_count: u64,
}

impl FailureRateTracker {
    /// 创建空的统计器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功
    pub fn record_success(&mut self) {
        self.success_count = self.success_count.saturating_add(1);
    }

    /// 记录一次失败
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
    }

    /// 当前失败率：`floor(100 * failure / (failure + success))`，无记录时为0
    pub fn current_rate_percent(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        // u128 避免 100 * failure 溢出
        ((self.failure_count as u128 * 100) / total as u128) as u32
    }

    /// 成功和失败计数一起清零
    pub fn reset(&mut self) {
        self.success_count = 0;
        self.failure_count = 0;
    }

    /// 成功次数
    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    /// 失败次数
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// 已记录的结果总数
    pub fn total(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }
}
