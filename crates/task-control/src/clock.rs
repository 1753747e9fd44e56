//! 单调时钟
//!
//! 阶段截止时间在进入阶段时由 [`Clock::now`] 计算一次，之后每个周期比较。
//! 测试使用 [`ManualClock`] 手动推进时间。

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 单调时钟（返回自时钟创建以来的时间）
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// 基于 `Instant` 的系统时钟
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// 手动推进的时钟，克隆体共享同一时间
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        *self.now.lock() += dt;
    }

    pub fn set(&self, now: Duration) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(30));
        other.advance(Duration::from_millis(30));
        assert_eq!(clock.now(), Duration::from_millis(60));

        clock.set(Duration::from_secs(5));
        assert_eq!(other.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
