//! 手部协调器
//!
//! 管理一只手的所有手指控制器，并维护每根手指的"已接触"标志。
//! 每次调用只读取一次编码器，并刷新所有参与手指的运动学链。

use crate::contacts::ContactReport;
use crate::finger::FingerController;
use crate::{ControlError, SeekGains};
use hand_driver::{ControlMode, JointDevice};
use hand_kinematics::FingerChainProvider;
use hand_protocol::{FingerName, HandSide};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 手部协调器
pub struct HandController {
    side: HandSide,
    device: Arc<dyn JointDevice>,
    fingers: BTreeMap<FingerName, FingerController>,
    done: BTreeMap<FingerName, bool>,
}

impl std::fmt::Debug for HandController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandController")
            .field("side", &self.side)
            .field("fingers", &self.fingers)
            .field("done", &self.done)
            .finish()
    }
}

impl HandController {
    /// 配置手部：构造手指、读取编码器并记录每根手指的初始位置
    pub fn configure(
        side: HandSide,
        fingers: &[FingerName],
        device: Arc<dyn JointDevice>,
        provider: &dyn FingerChainProvider,
        gains: SeekGains,
    ) -> Result<Self, ControlError> {
        gains.validate()?;

        let mut controllers = BTreeMap::new();
        for &name in fingers {
            let finger = FingerController::new(side, name, Arc::clone(&device), provider, gains)?;
            controllers.insert(name, finger);
        }

        let encoders = device.encoders().map_err(ControlError::Encoders)?;
        for finger in controllers.values_mut() {
            finger.update_chain(&encoders)?;
            finger.set_home_position(&encoders)?;
        }

        let done = controllers.keys().map(|&name| (name, false)).collect();
        info!(hand = %side, fingers = ?fingers, "Hand controller configured");

        Ok(Self {
            side,
            device,
            fingers: controllers,
            done,
        })
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    /// 已配置的手指
    pub fn finger_names(&self) -> Vec<FingerName> {
        self.fingers.keys().copied().collect()
    }

    pub fn finger(&self, name: FingerName) -> Option<&FingerController> {
        self.fingers.get(&name)
    }

    /// 手指是否已接触
    pub fn is_done(&self, name: FingerName) -> bool {
        self.done.get(&name).copied().unwrap_or(false)
    }

    /// 清除所有接触标志（新一轮接近开始时调用）
    pub fn reset_contacts(&mut self) {
        for flag in self.done.values_mut() {
            *flag = false;
        }
        debug!(hand = %self.side, "Finger contacts reset");
    }

    fn check_known(&self, fingers: &[FingerName]) -> Result<(), ControlError> {
        match fingers.iter().find(|f| !self.fingers.contains_key(*f)) {
            Some(&unknown) => Err(ControlError::UnknownFinger(unknown)),
            None => Ok(()),
        }
    }

    /// 读取一次编码器并刷新指定手指的链
    fn refresh(&mut self, fingers: &[FingerName]) -> Result<(), ControlError> {
        self.check_known(fingers)?;
        let encoders = self.device.encoders().map_err(ControlError::Encoders)?;
        for name in fingers {
            if let Some(finger) = self.fingers.get_mut(name) {
                finger.update_chain(&encoders)?;
            }
        }
        Ok(())
    }

    /// 手指前进直到接触
    ///
    /// 接触到的手指标记为完成并停止一次；其余手指继续前进。
    /// 所有指定手指都完成时返回 `true`；空列表永远不算完成。
    pub fn move_until_contact(
        &mut self,
        fingers: &[FingerName],
        speed: f64,
        report: &ContactReport,
    ) -> Result<bool, ControlError> {
        self.refresh(fingers)?;

        for &name in fingers {
            let Some(finger) = self.fingers.get_mut(&name) else {
                continue;
            };
            let done = self.done.entry(name).or_insert(false);
            if *done {
                continue;
            }
            if report.in_contact(name) {
                *done = true;
                debug!(hand = %self.side, finger = %name, "Contact detected, stopping finger");
                finger.stop()?;
            } else {
                finger.seek_contact(speed)?;
            }
        }

        Ok(!fingers.is_empty() && fingers.iter().all(|name| self.is_done(*name)))
    }

    /// 保持接触：逐周期转发给每根手指
    pub fn maintain_contact(
        &mut self,
        fingers: &[FingerName],
        speed: f64,
        report: &ContactReport,
    ) -> Result<(), ControlError> {
        self.refresh(fingers)?;
        for name in fingers {
            if let Some(finger) = self.fingers.get_mut(name) {
                finger.maintain_contact(speed, report.in_contact(*name))?;
            }
        }
        Ok(())
    }

    /// 恢复指定手指到初始位置
    pub fn restore_positions(&mut self, fingers: &[FingerName], ref_speed: f64) -> Result<(), ControlError> {
        self.check_known(fingers)?;
        for name in fingers {
            if let Some(finger) = self.fingers.get(name) {
                finger.restore(ref_speed)?;
            }
        }
        Ok(())
    }

    /// 指定手指的恢复是否全部完成
    pub fn is_restore_done(&self, fingers: &[FingerName]) -> Result<bool, ControlError> {
        self.check_known(fingers)?;
        for name in fingers {
            if let Some(finger) = self.fingers.get(name)
                && !finger.is_position_move_done()?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// 停止指定手指
    ///
    /// 总是尝试所有手指，全部尝试后返回第一个错误。
    pub fn stop_fingers(&self, fingers: &[FingerName]) -> Result<(), ControlError> {
        let mut first_err = None;
        for &name in fingers {
            let result = match self.fingers.get(&name) {
                Some(finger) => finger.stop(),
                None => Err(ControlError::UnknownFinger(name)),
            };
            if let Err(e) = result {
                warn!(hand = %self.side, finger = %name, error = %e, "Failed to stop finger");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// 停止所有已配置手指
    pub fn stop_all(&self) -> Result<(), ControlError> {
        self.stop_fingers(&self.finger_names())
    }

    /// 所有手指切换到位置模式
    pub fn switch_to_position_control(&self) -> Result<(), ControlError> {
        for finger in self.fingers.values() {
            finger.set_control_mode(ControlMode::Position)?;
        }
        Ok(())
    }

    /// 关闭：停止所有手指
    pub fn close(&mut self) -> Result<(), ControlError> {
        let mut first_err = None;
        for finger in self.fingers.values_mut() {
            if let Err(e) = finger.close() {
                first_err.get_or_insert(e);
            }
        }
        info!(hand = %self.side, "Hand controller closed");
        first_err.map_or(Ok(()), Err)
    }
}
