//! 手部控制 RPC 消息
//!
//! 任务状态机（客户端）与手部控制模块（服务端）之间的请求/响应。
//!
//! ```text
//! TaskStateMachine ──HandRequest──▶ HandControlModule
//!                  ◀─HandResponse──
//! ```
//!
//! 动作类命令（Approach/Follow/Restore/Stop）只在服务端暂存，由下一次控制周期执行；
//! 查询类命令（ApproachStatus/RestoreStatus）立即返回当前标志。

use crate::{FingerName, HandSide, ProtocolError};
use std::fmt;
use std::str::FromStr;

/// 手部控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HandCommand {
    /// 空命令（无操作）
    #[default]
    Empty,
    /// 空闲（无操作）
    Idle,
    /// 手指前进直到接触
    Approach,
    /// 保持接触（跟随）
    Follow,
    /// 恢复初始位置
    Restore,
    /// 停止所有手指
    Stop,
    /// 查询接近是否完成
    ApproachStatus,
    /// 查询恢复是否完成
    RestoreStatus,
}

impl HandCommand {
    /// 是否为会改变服务端当前命令的动作类命令
    pub fn is_action(self) -> bool {
        matches!(
            self,
            HandCommand::Approach | HandCommand::Follow | HandCommand::Restore | HandCommand::Stop
        )
    }

    /// 是否为状态查询
    pub fn is_query(self) -> bool {
        matches!(
            self,
            HandCommand::ApproachStatus | HandCommand::RestoreStatus
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandCommand::Empty => "empty",
            HandCommand::Idle => "idle",
            HandCommand::Approach => "approach",
            HandCommand::Follow => "follow",
            HandCommand::Restore => "restore",
            HandCommand::Stop => "stop",
            HandCommand::ApproachStatus => "approach_status",
            HandCommand::RestoreStatus => "restore_status",
        }
    }
}

impl fmt::Display for HandCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(HandCommand::Empty),
            "idle" => Ok(HandCommand::Idle),
            "approach" => Ok(HandCommand::Approach),
            "follow" => Ok(HandCommand::Follow),
            "restore" => Ok(HandCommand::Restore),
            "stop" => Ok(HandCommand::Stop),
            "approach_status" => Ok(HandCommand::ApproachStatus),
            "restore_status" => Ok(HandCommand::RestoreStatus),
            _ => Err(ProtocolError::UnknownCommand(s.to_string())),
        }
    }
}

/// 手部控制请求
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandRequest {
    /// 目标手
    pub hand: HandSide,
    /// 命令
    pub command: HandCommand,
    /// 参与的手指
    pub fingers: Vec<FingerName>,
    /// 指尖前进速度（m/s，Approach/Follow 使用）
    pub forward_speed: f64,
    /// 关节恢复参考速度（deg/s，Restore 使用）
    pub restore_speed: f64,
}

impl HandRequest {
    /// 不带参数的请求（Stop、状态查询）
    pub fn new(hand: HandSide, command: HandCommand) -> Self {
        Self {
            hand,
            command,
            fingers: Vec::new(),
            forward_speed: 0.0,
            restore_speed: 0.0,
        }
    }

    pub fn approach(hand: HandSide, fingers: Vec<FingerName>, forward_speed: f64) -> Self {
        Self {
            fingers,
            forward_speed,
            ..Self::new(hand, HandCommand::Approach)
        }
    }

    pub fn follow(hand: HandSide, fingers: Vec<FingerName>, forward_speed: f64) -> Self {
        Self {
            fingers,
            forward_speed,
            ..Self::new(hand, HandCommand::Follow)
        }
    }

    pub fn restore(hand: HandSide, fingers: Vec<FingerName>, restore_speed: f64) -> Self {
        Self {
            fingers,
            restore_speed,
            ..Self::new(hand, HandCommand::Restore)
        }
    }

    pub fn stop(hand: HandSide, fingers: Vec<FingerName>) -> Self {
        Self {
            fingers,
            ..Self::new(hand, HandCommand::Stop)
        }
    }
}

/// 手部控制响应
///
/// 默认值（全部为 false）也用作"被忽略的请求"的响应。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandResponse {
    pub approach_done: bool,
    pub restore_done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_classification() {
        assert!(HandCommand::Approach.is_action());
        assert!(HandCommand::Stop.is_action());
        assert!(!HandCommand::ApproachStatus.is_action());
        assert!(HandCommand::RestoreStatus.is_query());
        assert!(!HandCommand::Empty.is_action());
        assert!(!HandCommand::Idle.is_query());
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(
            "approach_status".parse::<HandCommand>().unwrap(),
            HandCommand::ApproachStatus
        );
        assert!("grasp".parse::<HandCommand>().is_err());
    }

    #[test]
    fn test_request_builders() {
        let req = HandRequest::approach(HandSide::Right, vec![FingerName::Index], 0.01);
        assert_eq!(req.command, HandCommand::Approach);
        assert_eq!(req.fingers, vec![FingerName::Index]);
        assert_eq!(req.forward_speed, 0.01);
        assert_eq!(req.restore_speed, 0.0);

        let req = HandRequest::restore(HandSide::Left, vec![FingerName::Thumb], 20.0);
        assert_eq!(req.hand, HandSide::Left);
        assert_eq!(req.restore_speed, 20.0);
    }

    #[test]
    fn test_default_response() {
        let resp = HandResponse::default();
        assert!(!resp.approach_done);
        assert!(!resp.restore_done);
    }
}
