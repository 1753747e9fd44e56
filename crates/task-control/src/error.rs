//! 任务层错误类型

use crate::{ContextHandle, TaskPhase};
use hand_control::ClientError;
use hand_protocol::HandSide;
use thiserror::Error;

/// 机械臂控制错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArmError {
    /// 机械臂命令被拒绝或执行失败
    #[error("Arm command '{op}' failed: {reason}")]
    CommandFailed { op: &'static str, reason: String },

    /// 控制上下文不存在（已恢复或从未保存）
    #[error("Unknown arm context {0:?}")]
    UnknownContext(ContextHandle),

    /// 控制器未连接
    #[error("Arm controller not connected")]
    NotConnected,
}

impl ArmError {
    pub fn command_failed(op: &'static str, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            op,
            reason: reason.into(),
        }
    }
}

/// 任务状态机错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    // ==================== Command Errors ====================
    /// 非空闲状态下收到新命令（不排队，不改变状态）
    #[error("Task busy in phase {phase}")]
    Busy { phase: TaskPhase },

    /// 该手没有配置机械臂/手部客户端
    #[error("No limb configured for {0} hand")]
    UnknownHand(HandSide),

    // ==================== Execution Errors ====================
    /// 当前阶段需要目标手，但没有命令指定过
    #[error("No target hand selected")]
    NoTargetHand,

    /// 还没有物体位姿估计
    #[error("No object pose estimate available")]
    NoObjectEstimate,

    /// 机械臂错误
    #[error("Arm error: {0}")]
    Arm(#[from] ArmError),

    /// 手部控制 RPC 错误
    #[error("Hand RPC error: {0}")]
    Hand(#[from] ClientError),

    /// 等待阶段超时
    #[error("Phase {phase} timed out after {timeout_ms}ms")]
    Timeout { phase: TaskPhase, timeout_ms: u64 },
}

impl TaskError {
    /// 是否为命令拒绝（对用户可见，状态未改变）
    pub fn is_rejection(&self) -> bool {
        matches!(self, TaskError::Busy { .. } | TaskError::UnknownHand(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}
