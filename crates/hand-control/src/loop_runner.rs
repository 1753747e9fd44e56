//! 周期循环
//!
//! 使用绝对时间锚点 + `spin_sleep` 的固定周期循环：
//! - 锚点每周期前进一个周期，消除累积漂移
//! - 超时（overrun）时不睡眠，并把锚点重置为当前时间
//! - 通过 `AtomicBool` 协作式停止

use crate::ControlError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// 循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 周期
    pub period: Duration,
    /// 最大迭代次数（None 表示直到停止）
    pub max_iterations: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(30),
            max_iterations: None,
        }
    }
}

impl LoopConfig {
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }
}

/// 运行周期循环，返回执行的迭代次数
///
/// 阻塞直到 `is_running` 变为 `false` 或达到 `max_iterations`。
pub fn run_periodic<F>(config: &LoopConfig, is_running: &AtomicBool, mut tick: F) -> Result<u64, ControlError>
where
    F: FnMut(),
{
    if config.period.is_zero() {
        return Err(ControlError::InvalidConfig(
            "Invalid loop period: 0 (must be > 0)".to_string(),
        ));
    }

    let period = config.period;
    let mut next_tick = Instant::now() + period;
    let mut iterations = 0u64;

    while is_running.load(Ordering::Acquire) {
        if let Some(max) = config.max_iterations
            && iterations >= max
        {
            break;
        }

        tick();
        iterations += 1;

        let now = Instant::now();
        if next_tick > now {
            spin_sleep::sleep(next_tick - now);
            next_tick += period;
        } else {
            warn!(
                overrun = ?now.duration_since(next_tick),
                ?period,
                "Periodic loop overrun, skipping sleep"
            );
            next_tick = now + period;
        }
    }

    Ok(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_config_default() {
        let config = LoopConfig::default();
        assert_eq!(config.period, Duration::from_millis(30));
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn test_zero_period_rejected() {
        let running = AtomicBool::new(true);
        let config = LoopConfig::with_period(Duration::ZERO);
        assert!(run_periodic(&config, &running, || {}).is_err());
    }

    #[test]
    fn test_max_iterations() {
        let running = AtomicBool::new(true);
        let config = LoopConfig {
            period: Duration::from_millis(1),
            max_iterations: Some(5),
        };
        let mut count = 0;
        let iterations = run_periodic(&config, &running, || count += 1).unwrap();
        assert_eq!(iterations, 5);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_stops_when_flag_cleared() {
        let running = AtomicBool::new(true);
        let config = LoopConfig::with_period(Duration::from_millis(1));
        let mut count = 0;
        let iterations = run_periodic(&config, &running, || {
            count += 1;
            if count == 3 {
                running.store(false, Ordering::Release);
            }
        })
        .unwrap();
        assert_eq!(iterations, 3);
    }
}
