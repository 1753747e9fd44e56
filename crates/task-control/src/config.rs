//! 任务状态机配置

use crate::pose::palm_attitude;
use crate::{Pose, TaskPhase};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 各等待阶段的超时（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTimeouts {
    pub arm_approach_ms: u64,
    pub fingers_approach_ms: u64,
    pub push_ms: u64,
    pub fingers_restore_ms: u64,
    pub arm_restore_ms: u64,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            arm_approach_ms: 5_000,
            fingers_approach_ms: 10_000,
            push_ms: 4_000,
            fingers_restore_ms: 10_000,
            arm_restore_ms: 5_000,
        }
    }
}

impl PhaseTimeouts {
    /// 等待阶段的超时，非等待阶段返回 None
    pub fn for_phase(&self, phase: TaskPhase) -> Option<Duration> {
        let ms = match phase {
            TaskPhase::WaitArmApproachDone => self.arm_approach_ms,
            TaskPhase::WaitFingersApproachDone => self.fingers_approach_ms,
            TaskPhase::WaitPushDone => self.push_ms,
            TaskPhase::WaitFingersRestoreDone => self.fingers_restore_ms,
            TaskPhase::WaitArmRestoreDone => self.arm_restore_ms,
            _ => return None,
        };
        Some(Duration::from_millis(ms))
    }
}

/// 任务状态机配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// 控制周期（毫秒）
    pub period_ms: u64,
    /// 推动时的轨迹时间（秒）
    pub push_traj_time_s: f64,
    /// 接近位置 = 物体位置 + 偏移（米）
    pub approach_offset: [f64; 3],
    /// 推动位移（米）
    pub push_displacement: [f64; 3],
    /// 没有接近记录时的复位位置（米）
    pub home_position: [f64; 3],
    /// 复位姿态 roll/pitch/yaw（rad）
    pub home_rpy: [f64; 3],
    pub timeouts: PhaseTimeouts,
}

impl Default for TaskConfig {
    fn default() -> Self {
        let (roll, pitch, yaw) = palm_attitude().euler_angles();
        Self {
            period_ms: 30,
            push_traj_time_s: 3.0,
            approach_offset: [0.0, 0.05, 0.0],
            push_displacement: [0.0, 0.10, 0.0],
            home_position: [-0.30, 0.10, 0.05],
            home_rpy: [roll, pitch, yaw],
            timeouts: PhaseTimeouts::default(),
        }
    }
}

impl TaskConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn approach_offset(&self) -> Vector3<f64> {
        Vector3::from(self.approach_offset)
    }

    pub fn push_displacement(&self) -> Vector3<f64> {
        Vector3::from(self.push_displacement)
    }

    pub fn home_pose(&self) -> Pose {
        Pose::from_rpy(self.home_position, self.home_rpy)
    }
}
