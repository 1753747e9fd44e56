//! Mock 关节设备
//!
//! 无硬件依赖的 [`JointDevice`] 实现，用于单元测试、集成测试和仿真：
//! - 记录每一次调用（包括失败的调用），测试可以断言命令序列
//! - 支持按操作类型注入失败
//! - [`MockJointDevice::advance`] 按时间步积分速度/位置运动
//!
//! `MockJointDevice` 是 `Clone` 的，所有克隆共享同一内部状态，
//! 测试代码可以保留一个句柄，同时把另一个交给控制器。

use crate::{ControlMode, DriverError, JointDevice};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// 位置运动到达判定阈值（deg）
const POSITION_TOLERANCE_DEG: f64 = 1e-6;

/// 记录的设备调用
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    ControlModes(Vec<usize>),
    SetControlMode { joint: usize, mode: ControlMode },
    SetRefSpeeds { joints: Vec<usize>, speeds: Vec<f64> },
    PositionMove { joints: Vec<usize>, targets: Vec<f64> },
    VelocityMove { joints: Vec<usize>, velocities: Vec<f64> },
    Stop(Vec<usize>),
    CheckMotionDone(Vec<usize>),
    Encoders,
}

impl DeviceCall {
    /// 对应的操作类型
    pub fn op(&self) -> DeviceOp {
        match self {
            DeviceCall::ControlModes(_) => DeviceOp::ControlModes,
            DeviceCall::SetControlMode { .. } => DeviceOp::SetControlMode,
            DeviceCall::SetRefSpeeds { .. } => DeviceOp::SetRefSpeeds,
            DeviceCall::PositionMove { .. } => DeviceOp::PositionMove,
            DeviceCall::VelocityMove { .. } => DeviceOp::VelocityMove,
            DeviceCall::Stop(_) => DeviceOp::Stop,
            DeviceCall::CheckMotionDone(_) => DeviceOp::CheckMotionDone,
            DeviceCall::Encoders => DeviceOp::Encoders,
        }
    }
}

/// 设备操作类型（用于失败注入和调用过滤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOp {
    ControlModes,
    SetControlMode,
    SetRefSpeeds,
    PositionMove,
    VelocityMove,
    Stop,
    CheckMotionDone,
    Encoders,
}

impl DeviceOp {
    fn name(self) -> &'static str {
        match self {
            DeviceOp::ControlModes => "control_modes",
            DeviceOp::SetControlMode => "set_control_mode",
            DeviceOp::SetRefSpeeds => "set_ref_speeds",
            DeviceOp::PositionMove => "position_move",
            DeviceOp::VelocityMove => "velocity_move",
            DeviceOp::Stop => "stop",
            DeviceOp::CheckMotionDone => "check_motion_done",
            DeviceOp::Encoders => "encoders",
        }
    }
}

/// 单个模拟关节
#[derive(Debug, Clone, Default)]
struct MockJoint {
    mode: ControlMode,
    position: f64,
    velocity: f64,
    ref_speed: f64,
    target: Option<f64>,
}

#[derive(Debug, Default)]
struct MockState {
    joints: Vec<MockJoint>,
    calls: Vec<DeviceCall>,
    failing: HashSet<DeviceOp>,
    motion_done_override: Option<bool>,
}

impl MockState {
    fn check_joints(&self, joints: &[usize]) -> Result<(), DriverError> {
        let count = self.joints.len();
        match joints.iter().find(|&&j| j >= count) {
            Some(&joint) => Err(DriverError::InvalidJoint { joint, count }),
            None => Ok(()),
        }
    }

    fn check_lengths(joints: &[usize], values: &[f64]) -> Result<(), DriverError> {
        if joints.len() != values.len() {
            return Err(DriverError::LengthMismatch {
                joints: joints.len(),
                values: values.len(),
            });
        }
        Ok(())
    }

    /// 记录调用并检查失败注入
    fn record(&mut self, call: DeviceCall, joints: &[usize]) -> Result<(), DriverError> {
        let op = call.op();
        self.calls.push(call);
        if self.failing.contains(&op) {
            tracing::debug!(op = op.name(), ?joints, "Mock device: injected failure");
            return Err(DriverError::command_failed(op.name(), joints));
        }
        Ok(())
    }
}

/// Mock 关节设备
#[derive(Debug, Clone)]
pub struct MockJointDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockJointDevice {
    /// 创建 `n_joints` 个关节的设备，初始位置全部为 0
    pub fn new(n_joints: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                joints: vec![MockJoint::default(); n_joints],
                ..MockState::default()
            })),
        }
    }

    /// 以给定位置（deg）创建设备
    pub fn with_positions(positions: &[f64]) -> Self {
        let device = Self::new(positions.len());
        device.set_positions(positions);
        device
    }

    /// 直接设置所有关节位置（不记录调用）
    pub fn set_positions(&self, positions: &[f64]) {
        let mut state = self.state.lock();
        for (joint, &p) in state.joints.iter_mut().zip(positions) {
            joint.position = p;
        }
    }

    /// 直接设置单个关节位置（不记录调用）
    pub fn set_position(&self, joint: usize, position: f64) {
        if let Some(j) = self.state.lock().joints.get_mut(joint) {
            j.position = position;
        }
    }

    /// 当前所有关节位置
    pub fn positions(&self) -> Vec<f64> {
        self.state.lock().joints.iter().map(|j| j.position).collect()
    }

    /// 当前所有关节速度指令
    pub fn velocities(&self) -> Vec<f64> {
        self.state.lock().joints.iter().map(|j| j.velocity).collect()
    }

    /// 单个关节的控制模式
    pub fn mode(&self, joint: usize) -> Option<ControlMode> {
        self.state.lock().joints.get(joint).map(|j| j.mode)
    }

    /// 注入（或取消）指定操作的失败
    pub fn set_failing(&self, op: DeviceOp, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// 覆盖 `check_motion_done` 的结果；`None` 恢复按仿真状态判断
    pub fn set_motion_done(&self, done: Option<bool>) {
        self.state.lock().motion_done_override = done;
    }

    /// 所有已记录的调用
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    /// 取出并清空已记录的调用
    pub fn take_calls(&self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// 某类操作的已记录调用
    pub fn calls_of(&self, op: DeviceOp) -> Vec<DeviceCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// 按时间步推进仿真
    ///
    /// - 速度模式：`position += velocity * dt`
    /// - 位置模式：以参考速度向目标移动，到达后清除目标；参考速度 ≤ 0 时直接到达
    pub fn advance(&self, dt: Duration) {
        let dt = dt.as_secs_f64();
        let mut state = self.state.lock();
        for joint in state.joints.iter_mut() {
            match joint.mode {
                ControlMode::Velocity => joint.position += joint.velocity * dt,
                ControlMode::Position => {
                    if let Some(target) = joint.target {
                        let error = target - joint.position;
                        let step = joint.ref_speed * dt;
                        if joint.ref_speed <= 0.0 || error.abs() <= step {
                            joint.position = target;
                            joint.target = None;
                        } else {
                            joint.position += step.copysign(error);
                        }
                    }
                },
                ControlMode::Idle => {},
            }
        }
    }
}

impl JointDevice for MockJointDevice {
    fn joint_count(&self) -> usize {
        self.state.lock().joints.len()
    }

    fn control_modes(&self, joints: &[usize]) -> Result<Vec<ControlMode>, DriverError> {
        let mut state = self.state.lock();
        state.record(DeviceCall::ControlModes(joints.to_vec()), joints)?;
        state.check_joints(joints)?;
        Ok(joints.iter().map(|&j| state.joints[j].mode).collect())
    }

    fn set_control_mode(&self, joint: usize, mode: ControlMode) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.record(DeviceCall::SetControlMode { joint, mode }, &[joint])?;
        state.check_joints(&[joint])?;
        let j = &mut state.joints[joint];
        j.mode = mode;
        j.velocity = 0.0;
        j.target = None;
        Ok(())
    }

    fn set_ref_speeds(&self, joints: &[usize], speeds: &[f64]) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.record(
            DeviceCall::SetRefSpeeds {
                joints: joints.to_vec(),
                speeds: speeds.to_vec(),
            },
            joints,
        )?;
        state.check_joints(joints)?;
        MockState::check_lengths(joints, speeds)?;
        for (&j, &s) in joints.iter().zip(speeds) {
            state.joints[j].ref_speed = s;
        }
        Ok(())
    }

    fn position_move(&self, joints: &[usize], targets: &[f64]) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.record(
            DeviceCall::PositionMove {
                joints: joints.to_vec(),
                targets: targets.to_vec(),
            },
            joints,
        )?;
        state.check_joints(joints)?;
        MockState::check_lengths(joints, targets)?;
        for (&j, &t) in joints.iter().zip(targets) {
            let joint = &mut state.joints[j];
            joint.target = Some(t);
            joint.velocity = 0.0;
        }
        Ok(())
    }

    fn velocity_move(&self, joints: &[usize], velocities: &[f64]) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.record(
            DeviceCall::VelocityMove {
                joints: joints.to_vec(),
                velocities: velocities.to_vec(),
            },
            joints,
        )?;
        state.check_joints(joints)?;
        MockState::check_lengths(joints, velocities)?;
        for (&j, &v) in joints.iter().zip(velocities) {
            state.joints[j].velocity = v;
        }
        Ok(())
    }

    fn stop(&self, joints: &[usize]) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.record(DeviceCall::Stop(joints.to_vec()), joints)?;
        state.check_joints(joints)?;
        for &j in joints {
            let joint = &mut state.joints[j];
            joint.velocity = 0.0;
            joint.target = None;
        }
        Ok(())
    }

    fn check_motion_done(&self, joints: &[usize]) -> Result<bool, DriverError> {
        let mut state = self.state.lock();
        state.record(DeviceCall::CheckMotionDone(joints.to_vec()), joints)?;
        state.check_joints(joints)?;
        if let Some(done) = state.motion_done_override {
            return Ok(done);
        }
        Ok(joints.iter().all(|&j| {
            let joint = &state.joints[j];
            joint.target.is_none_or(|t| (t - joint.position).abs() <= POSITION_TOLERANCE_DEG)
        }))
    }

    fn encoders(&self) -> Result<Vec<f64>, DriverError> {
        let mut state = self.state.lock();
        state.record(DeviceCall::Encoders, &[])?;
        Ok(state.joints.iter().map(|j| j.position).collect())
    }
}
