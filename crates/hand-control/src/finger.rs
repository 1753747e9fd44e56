//! 单指速度控制器
//!
//! 接触搜索控制律：在指尖横向（根坐标系 y，对掌手指为 z）上以给定线速度前进，
//! 用阻尼最小二乘求最小范数关节速度：
//!
//! ```text
//! q̇ = Jᵀ (J Jᵀ + λ² I)⁺ v
//! ```
//!
//! 两自由度耦合手指额外叠加零空间项，把近端关节推回舒适角附近：
//!
//! ```text
//! q̇ += (I − J⁺ J) · gain · g,   g[0] = −0.5 (q_prox − q_comfort) / q_max²
//! ```
//!
//! 任何设备命令失败都先停止手指再返回错误，不重试。

use crate::{ControlError, SeekGains};
use hand_driver::{ControlMode, DriverError, JointDevice};
use hand_kinematics::{FingerChainProvider, FingerKind, FingerKinematics, FingerSpec, TipPose};
use hand_protocol::{FingerName, HandSide};
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;
use tracing::{debug, warn};

/// 单指控制器
pub struct FingerController {
    device: Arc<dyn JointDevice>,
    kinematics: FingerKinematics,
    gains: SeekGains,
    /// 初始关节位置（deg），与受控关节一一对应
    home: Vec<f64>,
    /// 当前接触期内是否已经停止过
    contact_stopped: bool,
}

impl std::fmt::Debug for FingerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerController")
            .field("kinematics", &self.kinematics)
            .field("home", &self.home)
            .finish()
    }
}

impl FingerController {
    /// 创建手指控制器
    ///
    /// 不访问设备；初始位置需要随后通过 [`set_home_position`](Self::set_home_position) 设置。
    pub fn new(
        side: HandSide,
        name: FingerName,
        device: Arc<dyn JointDevice>,
        provider: &dyn FingerChainProvider,
        gains: SeekGains,
    ) -> Result<Self, ControlError> {
        let spec = FingerSpec::for_finger(name)?;
        let count = device.joint_count();
        if let Some(&joint) = spec.controlled_joints.iter().find(|&&j| j >= count) {
            return Err(ControlError::InvalidConfig(format!(
                "Finger {name} controls joint {joint} but device has {count} joints"
            )));
        }
        let kinematics = FingerKinematics::new(side, spec, provider)?;
        let home = vec![0.0; kinematics.controlled_joints().len()];

        Ok(Self {
            device,
            kinematics,
            gains,
            home,
            contact_stopped: false,
        })
    }

    pub fn name(&self) -> FingerName {
        self.kinematics.name()
    }

    pub fn kind(&self) -> FingerKind {
        self.kinematics.kind()
    }

    pub fn controlled_joints(&self) -> &[usize] {
        self.kinematics.controlled_joints()
    }

    pub fn kinematics(&self) -> &FingerKinematics {
        &self.kinematics
    }

    /// 初始位置（deg）
    pub fn home_position(&self) -> &[f64] {
        &self.home
    }

    pub fn tip_pose(&self) -> TipPose {
        self.kinematics.tip_pose()
    }

    fn device_err(&self, source: DriverError) -> ControlError {
        ControlError::device(self.name(), source)
    }

    /// 从完整编码器向量记录初始位置（原值保存）
    pub fn set_home_position(&mut self, encoders: &[f64]) -> Result<(), ControlError> {
        let mut home = Vec::with_capacity(self.controlled_joints().len());
        for &joint in self.controlled_joints() {
            let value = encoders
                .get(joint)
                .copied()
                .ok_or(hand_kinematics::KinematicsError::EncoderIndex {
                    index: joint,
                    len: encoders.len(),
                })?;
            home.push(value);
        }
        debug!(finger = %self.name(), ?home, "Home position stored");
        self.home = home;
        Ok(())
    }

    /// 用完整编码器向量（deg）刷新运动学链
    pub fn update_chain(&mut self, encoders: &[f64]) -> Result<(), ControlError> {
        Ok(self.kinematics.update(encoders)?)
    }

    /// 切换控制模式，只修改当前模式不同的关节
    pub fn set_control_mode(&self, mode: ControlMode) -> Result<(), ControlError> {
        let joints = self.controlled_joints();
        let modes = self.device.control_modes(joints).map_err(|e| self.device_err(e))?;
        for (&joint, &current) in joints.iter().zip(modes.iter()) {
            if current != mode {
                self.device
                    .set_control_mode(joint, mode)
                    .map_err(|e| self.device_err(e))?;
            }
        }
        Ok(())
    }

    /// 计算接触搜索的关节速度（受控关节，rad/s）
    pub fn seek_velocities(&self, target_speed: f64) -> Result<DVector<f64>, ControlError> {
        let jacobian = self.kinematics.jacobian()?;
        // 横向平移行
        let j = jacobian.rows(1, 1).into_owned();
        let n = j.ncols();

        let damping = self.gains.damping * self.gains.damping;
        let jjt = &j * j.transpose() + DMatrix::identity(1, 1) * damping;
        let inv = jjt
            .pseudo_inverse(self.gains.pinv_tolerance)
            .map_err(|e| ControlError::Numerical(e.to_string()))?;
        let j_pinv = j.transpose() * inv;

        let mut q_dot = &j_pinv * DVector::from_element(1, target_speed);

        if self.kind() == FingerKind::TwoDofCoupled {
            let projector = DMatrix::identity(n, n) - &j_pinv * &j;
            let comfort = self.gains.comfort_deg.to_radians();
            let max = self.gains.max_deg.to_radians();

            let mut gradient = DVector::<f64>::zeros(n);
            gradient[0] = -0.5 * (self.kinematics.proximal_angle() - comfort) / max.powi(2);
            q_dot += projector * gradient * self.gains.gain;
        }

        Ok(q_dot)
    }

    /// 失败后的安全停止（停止本身的错误只记录）
    fn stop_after_failure(&self) {
        if let Err(e) = self.device.stop(self.controlled_joints()) {
            warn!(finger = %self.name(), error = %e, "Failed to stop finger after command failure");
        }
    }

    /// 速度模式下发关节速度（rad/s → deg/s）
    fn command_velocities(&self, q_dot: &DVector<f64>) -> Result<(), ControlError> {
        self.set_control_mode(ControlMode::Velocity)?;
        let deg: Vec<f64> = q_dot.iter().map(|v| v.to_degrees()).collect();
        self.device
            .velocity_move(self.controlled_joints(), &deg)
            .map_err(|e| self.device_err(e))
    }

    /// 向接触方向前进
    pub fn seek_contact(&mut self, target_speed: f64) -> Result<(), ControlError> {
        self.contact_stopped = false;
        let q_dot = self.seek_velocities(target_speed)?;
        if let Err(e) = self.command_velocities(&q_dot) {
            self.stop_after_failure();
            return Err(e);
        }
        Ok(())
    }

    /// 保持接触：接触中的手指停止（每次接触只停一次），否则继续前进
    pub fn maintain_contact(&mut self, target_speed: f64, in_contact: bool) -> Result<(), ControlError> {
        if !in_contact {
            return self.seek_contact(target_speed);
        }
        if !self.contact_stopped {
            self.stop()?;
            self.contact_stopped = true;
        }
        Ok(())
    }

    /// 以参考速度（deg/s）恢复到初始位置
    pub fn restore(&self, ref_speed: f64) -> Result<(), ControlError> {
        let result = self.issue_restore(ref_speed);
        if result.is_err() {
            self.stop_after_failure();
        }
        result
    }

    fn issue_restore(&self, ref_speed: f64) -> Result<(), ControlError> {
        self.set_control_mode(ControlMode::Position)?;
        let joints = self.controlled_joints();
        let speeds = vec![ref_speed; joints.len()];
        self.device
            .set_ref_speeds(joints, &speeds)
            .map_err(|e| self.device_err(e))?;
        self.device
            .position_move(joints, &self.home)
            .map_err(|e| self.device_err(e))
    }

    /// 位置运动是否完成
    pub fn is_position_move_done(&self) -> Result<bool, ControlError> {
        self.device
            .check_motion_done(self.controlled_joints())
            .map_err(|e| self.device_err(e))
    }

    /// 停止手指（幂等）
    pub fn stop(&self) -> Result<(), ControlError> {
        self.device
            .stop(self.controlled_joints())
            .map_err(|e| self.device_err(e))
    }

    /// 关闭：停止手指
    pub fn close(&mut self) -> Result<(), ControlError> {
        self.contact_stopped = false;
        self.stop()
    }
}
