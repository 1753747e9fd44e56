//! 任务状态机的外部协作者
//!
//! 状态机只通过这些 trait 访问机械臂、滤波器与物体位姿估计，
//! 真实系统与仿真/测试替身实现同一组接口。

use crate::{ArmError, Pose};
use hand_control::HandClient;
use std::fmt;
use std::sync::Arc;

/// 机械臂控制上下文句柄（`store_context` 返回，`restore_context` 消费）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub u64);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// 笛卡尔机械臂控制器
pub trait ArmController: Send {
    /// 开始移动到目标位姿（非阻塞）
    fn go_to_pose(&mut self, target: &Pose) -> Result<(), ArmError>;

    /// 当前轨迹是否完成
    fn check_motion_done(&mut self) -> Result<bool, ArmError>;

    /// 保存当前控制上下文（轨迹时间等）
    fn store_context(&mut self) -> Result<ContextHandle, ArmError>;

    /// 恢复之前保存的控制上下文
    fn restore_context(&mut self, handle: ContextHandle) -> Result<(), ArmError>;

    /// 设置点到点轨迹时间（秒）
    fn set_traj_time(&mut self, seconds: f64) -> Result<(), ArmError>;

    /// 当前末端位姿
    fn current_pose(&mut self) -> Result<Pose, ArmError>;

    /// 停止当前运动
    fn stop_control(&mut self) -> Result<(), ArmError>;
}

/// 接触滤波模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// 视觉定位
    Visual,
    /// 视觉 + 触觉
    Tactile,
}

/// 物体位姿滤波器（单向命令，无响应）
pub trait FilterClient: Send {
    fn enable(&self, mode: FilterMode);
    fn disable(&self);
}

/// 物体位姿估计来源
pub trait ObjectPoseSource: Send {
    /// 最近一次估计，尚无估计时为 None
    fn latest(&self) -> Option<Pose>;
}

/// 一侧的机械臂 + 手部客户端
pub struct Limb {
    pub arm: Box<dyn ArmController>,
    pub hand: Arc<dyn HandClient>,
}

impl Limb {
    pub fn new(arm: Box<dyn ArmController>, hand: Arc<dyn HandClient>) -> Self {
        Self { arm, hand }
    }
}

impl fmt::Debug for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Limb").finish_non_exhaustive()
    }
}
