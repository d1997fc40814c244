// crates/dfvm_foundation/src/metrics.rs

//! 计时钩子
//!
//! 数值核心不直接做性能统计，只在各阶段结束时把 `(名称, 耗时)` 交给
//! 可选的 [`TimingHook`]。闭包可直接作为钩子使用；[`TimingLog`] 是一个可
//! 在线程间共享的累积收集器。
//!
//! # 使用示例
//!
//! ```
//! use std::time::Duration;
//! use dfvm_foundation::metrics::{TimingHook, TimingLog};
//!
//! let log = TimingLog::new();
//! let mut hook = log.clone();
//! hook.record("solve", Duration::from_millis(3));
//! hook.record("solve", Duration::from_millis(2));
//! assert_eq!(log.entry("solve").unwrap().count, 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// 阶段耗时回调
pub trait TimingHook: Send {
    /// 记录一个阶段的耗时
    fn record(&mut self, name: &'static str, elapsed: Duration);
}

impl<F> TimingHook for F
where
    F: FnMut(&'static str, Duration) + Send,
{
    fn record(&mut self, name: &'static str, elapsed: Duration) {
        self(name, elapsed)
    }
}

// =============================================================================
// 累积收集器
// =============================================================================

/// 单个阶段的累积统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingEntry {
    /// 调用次数
    pub count: u64,
    /// 累计耗时
    pub total: Duration,
    /// 单次最长耗时
    pub max: Duration,
}

impl TimingEntry {
    /// 平均耗时（秒）
    pub fn mean_sec(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total.as_secs_f64() / self.count as f64
        }
    }
}

/// 共享的阶段耗时收集器
///
/// 克隆得到的句柄共享同一份统计。
#[derive(Debug, Clone, Default)]
pub struct TimingLog {
    entries: Arc<Mutex<BTreeMap<&'static str, TimingEntry>>>,
}

impl TimingLog {
    /// 创建空收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一次耗时
    pub fn add(&self, name: &'static str, elapsed: Duration) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(name).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    /// 查询某阶段
    pub fn entry(&self, name: &str) -> Option<TimingEntry> {
        self.entries.lock().get(name).copied()
    }

    /// 全部阶段的快照
    pub fn snapshot(&self) -> BTreeMap<&'static str, TimingEntry> {
        self.entries.lock().clone()
    }

    /// 所有阶段的总耗时
    pub fn total(&self) -> Duration {
        self.entries.lock().values().map(|e| e.total).sum()
    }

    /// 清空
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

impl TimingHook for TimingLog {
    fn record(&mut self, name: &'static str, elapsed: Duration) {
        self.add(name, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_hook() {
        let mut names = Vec::new();
        {
            let mut hook = |name: &'static str, _d: Duration| names.push(name);
            hook.record("alphas", Duration::ZERO);
            hook.record("betas", Duration::ZERO);
        }
        assert_eq!(names, vec!["alphas", "betas"]);
    }

    #[test]
    fn test_timing_log_accumulates() {
        let log = TimingLog::new();
        let mut boxed: Box<dyn TimingHook> = Box::new(log.clone());
        boxed.record("solve", Duration::from_millis(4));
        boxed.record("solve", Duration::from_millis(2));
        boxed.record("assemble", Duration::from_millis(1));

        let solve = log.entry("solve").unwrap();
        assert_eq!(solve.count, 2);
        assert_eq!(solve.total, Duration::from_millis(6));
        assert_eq!(solve.max, Duration::from_millis(4));
        assert!((solve.mean_sec() - 0.003).abs() < 1e-12);
        assert_eq!(log.total(), Duration::from_millis(7));

        log.reset();
        assert!(log.snapshot().is_empty());
    }
}
