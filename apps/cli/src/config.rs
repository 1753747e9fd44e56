//! CLI 配置文件
//!
//! 一个 TOML 文件包含三张表，缺省字段使用默认值：
//!
//! ```toml
//! [hand]
//! hand = "right"
//! fingers = ["thumb", "index"]
//!
//! [task.timeouts]
//! push_ms = 6000
//!
//! [sim]
//! contact_travel_deg = 12.0
//! ```

use anyhow::{Context, Result};
use hand_control::HandConfig;
use hand_kinematics::icub::JOINT_COUNT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use task_control::TaskConfig;

/// 仿真参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// 关节初始位置（deg）
    pub initial_joints: Vec<f64>,
    /// 手指近端关节离开初始位置多少度后产生接触
    pub contact_travel_deg: f64,
    /// 物体位置（米）
    pub object_position: [f64; 3],
    /// 机械臂初始位置（米）
    pub arm_start_position: [f64; 3],
    /// 手部 RPC 超时（毫秒）
    pub rpc_timeout_ms: u64,
    /// 命令行未指定时的指尖速度（m/s）
    pub forward_speed: f64,
    /// 命令行未指定时的复位速度（deg/s）
    pub restore_speed: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut initial_joints = vec![0.0; JOINT_COUNT];
        for (joint, value) in [(8, 30.0), (11, 15.0), (12, 20.0), (13, 15.0), (14, 20.0), (15, 30.0)] {
            initial_joints[joint] = value;
        }
        Self {
            initial_joints,
            contact_travel_deg: 12.0,
            object_position: [-0.32, 0.02, 0.03],
            arm_start_position: [-0.25, 0.15, 0.10],
            rpc_timeout_ms: 200,
            forward_speed: 0.01,
            restore_speed: 20.0,
        }
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hand: HandConfig,
    pub task: TaskConfig,
    pub sim: SimConfig,
}

impl AppConfig {
    /// 加载配置（未指定路径时使用默认值）
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.hand.validate()?;
        if self.task.period_ms == 0 {
            anyhow::bail!("Invalid task.period_ms: 0 (must be > 0)");
        }
        if self.sim.initial_joints.len() != JOINT_COUNT {
            anyhow::bail!(
                "sim.initial_joints has {} values, expected {}",
                self.sim.initial_joints.len(),
                JOINT_COUNT
            );
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_protocol::{FingerName, HandSide};

    #[test]
    fn test_default_round_trip() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.hand, config.hand);
        assert_eq!(parsed.sim.initial_joints.len(), JOINT_COUNT);
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [hand]
            hand = "left"
            fingers = ["thumb", "index"]

            [task.timeouts]
            push_ms = 6000
            "#,
        )
        .unwrap();
        assert_eq!(config.hand.hand, HandSide::Left);
        assert_eq!(config.hand.fingers, vec![FingerName::Thumb, FingerName::Index]);
        assert_eq!(config.task.timeouts.push_ms, 6000);
        assert_eq!(config.task.timeouts.arm_approach_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_joint_count() {
        let mut config = AppConfig::default();
        config.sim.initial_joints.pop();
        assert!(config.validate().is_err());
    }
}
