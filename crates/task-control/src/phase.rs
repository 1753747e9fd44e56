//! 任务阶段、外部命令与状态快照

use hand_protocol::{FingerName, HandSide};
use std::fmt;

/// 任务阶段
///
/// 初始为 `Idle`，所有失败/中止路径都回到 `Idle`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    Localize,
    ArmApproach,
    WaitArmApproachDone,
    FingersApproach,
    WaitFingersApproachDone,
    Push,
    WaitPushDone,
    FingersRestore,
    WaitFingersRestoreDone,
    ArmRestore,
    WaitArmRestoreDone,
    Stop,
}

impl TaskPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPhase::Idle => "idle",
            TaskPhase::Localize => "localize",
            TaskPhase::ArmApproach => "arm_approach",
            TaskPhase::WaitArmApproachDone => "wait_arm_approach_done",
            TaskPhase::FingersApproach => "fingers_approach",
            TaskPhase::WaitFingersApproachDone => "wait_fingers_approach_done",
            TaskPhase::Push => "push",
            TaskPhase::WaitPushDone => "wait_push_done",
            TaskPhase::FingersRestore => "fingers_restore",
            TaskPhase::WaitFingersRestoreDone => "wait_fingers_restore_done",
            TaskPhase::ArmRestore => "arm_restore",
            TaskPhase::WaitArmRestoreDone => "wait_arm_restore_done",
            TaskPhase::Stop => "stop",
        }
    }

    /// 是否为带截止时间的等待阶段
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            TaskPhase::WaitArmApproachDone
                | TaskPhase::WaitFingersApproachDone
                | TaskPhase::WaitPushDone
                | TaskPhase::WaitFingersRestoreDone
                | TaskPhase::WaitArmRestoreDone
        )
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 外部任务命令
#[derive(Debug, Clone, PartialEq)]
pub enum TaskCommand {
    /// 开启视觉定位
    Localize,
    /// 机械臂接近物体，然后手指前进直到接触
    Approach {
        hand: HandSide,
        fingers: Vec<FingerName>,
        forward_speed: f64,
    },
    /// 保持接触推动物体
    Push {
        hand: HandSide,
        fingers: Vec<FingerName>,
        forward_speed: f64,
    },
    /// 手指复位，然后机械臂复位
    Restore {
        hand: HandSide,
        fingers: Vec<FingerName>,
        restore_speed: f64,
    },
    /// 停止一切并回滚
    Stop,
}

impl TaskCommand {
    /// 命令进入的第一个阶段
    pub fn entry_phase(&self) -> TaskPhase {
        match self {
            TaskCommand::Localize => TaskPhase::Localize,
            TaskCommand::Approach { .. } => TaskPhase::ArmApproach,
            TaskCommand::Push { .. } => TaskPhase::Push,
            TaskCommand::Restore { .. } => TaskPhase::FingersRestore,
            TaskCommand::Stop => TaskPhase::Stop,
        }
    }

    /// 命令针对的手（Localize/Stop 不针对具体的手）
    pub fn hand(&self) -> Option<HandSide> {
        match self {
            TaskCommand::Approach { hand, .. }
            | TaskCommand::Push { hand, .. }
            | TaskCommand::Restore { hand, .. } => Some(*hand),
            TaskCommand::Localize | TaskCommand::Stop => None,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, TaskCommand::Stop)
    }
}

/// 阶段参数（来自触发命令）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhaseParams {
    pub fingers: Vec<FingerName>,
    pub forward_speed: f64,
    pub restore_speed: f64,
}

impl PhaseParams {
    pub(crate) fn from_command(command: &TaskCommand) -> Option<Self> {
        match command {
            TaskCommand::Approach {
                fingers,
                forward_speed,
                ..
            }
            | TaskCommand::Push {
                fingers,
                forward_speed,
                ..
            } => Some(Self {
                fingers: fingers.clone(),
                forward_speed: *forward_speed,
                restore_speed: 0.0,
            }),
            TaskCommand::Restore {
                fingers,
                restore_speed,
                ..
            } => Some(Self {
                fingers: fingers.clone(),
                forward_speed: 0.0,
                restore_speed: *restore_speed,
            }),
            TaskCommand::Localize | TaskCommand::Stop => None,
        }
    }
}

/// 每个周期发布的任务状态快照
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskStatus {
    pub phase: TaskPhase,
    pub hand: Option<HandSide>,
    pub approach_done: bool,
    /// 是否持有已保存的机械臂控制上下文
    pub context_held: bool,
    /// 最近一次阶段失败
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_phase() {
        let approach = TaskCommand::Approach {
            hand: HandSide::Right,
            fingers: vec![FingerName::Index],
            forward_speed: 0.01,
        };
        assert_eq!(approach.entry_phase(), TaskPhase::ArmApproach);
        assert_eq!(approach.hand(), Some(HandSide::Right));
        assert_eq!(TaskCommand::Stop.entry_phase(), TaskPhase::Stop);
        assert_eq!(TaskCommand::Localize.hand(), None);
    }

    #[test]
    fn test_waiting_phases() {
        assert!(TaskPhase::WaitPushDone.is_waiting());
        assert!(!TaskPhase::Push.is_waiting());
        assert!(!TaskPhase::Idle.is_waiting());
    }

    #[test]
    fn test_params_from_restore() {
        let params = PhaseParams::from_command(&TaskCommand::Restore {
            hand: HandSide::Left,
            fingers: vec![FingerName::Thumb],
            restore_speed: 20.0,
        })
        .unwrap();
        assert_eq!(params.restore_speed, 20.0);
        assert_eq!(params.fingers, vec![FingerName::Thumb]);
        assert!(PhaseParams::from_command(&TaskCommand::Stop).is_none());
    }
}
