//! 关节设备接口

use crate::{ControlMode, DriverError};

/// 关节设备（手臂 + 手指的完整关节向量）
///
/// 角度单位为度，速度单位为度/秒，与底层电机驱动保持一致；
/// 弧度与度之间的换算由控制层负责。
///
/// # 线程安全
///
/// 同一设备被多个手指控制器共享（`Arc<dyn JointDevice>`），
/// 因此所有方法都接收 `&self`，实现者自行负责内部同步。
///
/// # 非阻塞
///
/// 所有方法都应立即返回：运动完成通过 [`check_motion_done`](Self::check_motion_done) 轮询，
/// 而不是阻塞等待。
pub trait JointDevice: Send + Sync {
    /// 关节总数
    fn joint_count(&self) -> usize;

    /// 查询指定关节的当前控制模式
    fn control_modes(&self, joints: &[usize]) -> Result<Vec<ControlMode>, DriverError>;

    /// 设置单个关节的控制模式
    fn set_control_mode(&self, joint: usize, mode: ControlMode) -> Result<(), DriverError>;

    /// 设置位置运动的参考速度（deg/s）
    fn set_ref_speeds(&self, joints: &[usize], speeds: &[f64]) -> Result<(), DriverError>;

    /// 位置运动到目标角度（deg）
    fn position_move(&self, joints: &[usize], targets: &[f64]) -> Result<(), DriverError>;

    /// 速度运动（deg/s）
    fn velocity_move(&self, joints: &[usize], velocities: &[f64]) -> Result<(), DriverError>;

    /// 停止指定关节
    fn stop(&self, joints: &[usize]) -> Result<(), DriverError>;

    /// 指定关节的运动是否全部完成
    fn check_motion_done(&self, joints: &[usize]) -> Result<bool, DriverError>;

    /// 读取完整关节向量（deg）
    fn encoders(&self) -> Result<Vec<f64>, DriverError>;
}
