//! 手部控制错误类型

use hand_driver::DriverError;
use hand_kinematics::KinematicsError;
use hand_protocol::FingerName;
use thiserror::Error;

/// 手部控制错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    // ==================== Configuration Errors ====================
    /// 运动学配置错误（不支持的手指、耦合形状、Jacobian 列数、编码器下标）
    #[error("Configuration error: {0}")]
    Configuration(#[from] KinematicsError),

    /// 手指未在当前手中配置
    #[error("Finger '{0}' is not configured for this hand")]
    UnknownFinger(FingerName),

    /// 配置参数无效
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ==================== Device Errors ====================
    /// 设备命令失败（已执行 stop）
    #[error("Device command failed for {finger}: {source}")]
    Device {
        finger: FingerName,
        #[source]
        source: DriverError,
    },

    /// 读取编码器失败
    #[error("Failed to read encoders: {0}")]
    Encoders(#[source] DriverError),

    // ==================== Numerical Errors ====================
    /// 数值计算失败
    #[error("Numerical error: {0}")]
    Numerical(String),
}

impl ControlError {
    /// 手指设备命令错误
    pub fn device(finger: FingerName, source: DriverError) -> Self {
        Self::Device { finger, source }
    }

    /// 是否为配置错误
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ControlError::Configuration(_)
                | ControlError::UnknownFinger(_)
                | ControlError::InvalidConfig(_)
        )
    }

    /// 是否为设备错误
    pub fn is_device(&self) -> bool {
        matches!(self, ControlError::Device { .. } | ControlError::Encoders(_))
    }
}
