//! 手部控制配置

use crate::ControlError;
use hand_protocol::{FingerName, HandSide};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 接触搜索控制律参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekGains {
    /// 近端关节舒适角（deg）
    pub comfort_deg: f64,
    /// 近端关节归一化最大角（deg）
    pub max_deg: f64,
    /// 零空间梯度增益
    pub gain: f64,
    /// 阻尼最小二乘的阻尼系数 λ
    pub damping: f64,
    /// 伪逆奇异值截断阈值
    pub pinv_tolerance: f64,
}

impl Default for SeekGains {
    fn default() -> Self {
        Self {
            comfort_deg: 10.0,
            max_deg: 25.0,
            gain: 10.0,
            damping: 0.0,
            pinv_tolerance: 1e-9,
        }
    }
}

impl SeekGains {
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.max_deg <= 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "Invalid max_deg: {} (must be > 0)",
                self.max_deg
            )));
        }
        if self.damping < 0.0 || self.pinv_tolerance < 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "Invalid damping/pinv_tolerance: {}/{} (must be >= 0)",
                self.damping, self.pinv_tolerance
            )));
        }
        Ok(())
    }
}

/// 手部控制模块配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// 控制的手
    pub hand: HandSide,
    /// 配置的手指
    pub fingers: Vec<FingerName>,
    /// 控制周期（ms）
    pub period_ms: u64,
    /// 控制律参数
    pub gains: SeekGains,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            hand: HandSide::Right,
            fingers: vec![
                FingerName::Thumb,
                FingerName::Index,
                FingerName::Middle,
                FingerName::Ring,
            ],
            period_ms: 30,
            gains: SeekGains::default(),
        }
    }
}

impl HandConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        if self.period_ms == 0 {
            return Err(ControlError::InvalidConfig(
                "Invalid period_ms: 0 (must be > 0)".to_string(),
            ));
        }
        if self.fingers.is_empty() {
            return Err(ControlError::InvalidConfig(
                "No fingers configured".to_string(),
            ));
        }
        self.gains.validate()
    }
}
