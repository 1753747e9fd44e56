//! # Hand Protocol
//!
//! 灵巧手控制的基础数据定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `hand`: 手侧（左/右）与手指名称
//! - `rpc`: 任务层与手部控制模块之间的请求/响应消息
//!
//! 所有上层 crate（驱动、运动学、控制、任务状态机）都只通过这里的类型交换身份信息，
//! 避免在各层之间传递裸字符串。

pub mod hand;
pub mod rpc;

// 重新导出常用类型
pub use hand::{FingerName, HandSide};
pub use rpc::{HandCommand, HandRequest, HandResponse};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown hand side: {0}")]
    UnknownHand(String),

    #[error("Unknown finger name: {0}")]
    UnknownFinger(String),

    #[error("Unknown hand command: {0}")]
    UnknownCommand(String),
}
