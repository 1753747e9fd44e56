//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
///
/// 所有设备调用都返回此错误；上层必须传播，不允许吞掉。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 设备拒绝或未能执行命令
    #[error("Device command '{op}' failed on joints {joints:?}")]
    CommandFailed {
        /// 操作名称
        op: &'static str,
        /// 涉及的关节
        joints: Vec<usize>,
    },

    /// 关节索引越界
    #[error("Invalid joint index {joint} (device has {count} joints)")]
    InvalidJoint { joint: usize, count: usize },

    /// 关节列表与数值列表长度不一致
    #[error("Length mismatch: {joints} joints but {values} values")]
    LengthMismatch { joints: usize, values: usize },

    /// 设备未连接
    #[error("Device not connected: {0}")]
    NotConnected(String),
}

impl DriverError {
    /// 创建命令失败错误
    pub fn command_failed(op: &'static str, joints: &[usize]) -> Self {
        Self::CommandFailed {
            op,
            joints: joints.to_vec(),
        }
    }
}
