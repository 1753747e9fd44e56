//! 运动学错误类型

use hand_protocol::{FingerName, HandSide};
use thiserror::Error;

/// 运动学/配置错误
///
/// 这些错误都属于配置类错误：对单次调用是致命的，对进程不是。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// 不支持的手指
    #[error("Finger '{0}' is not supported by the controller")]
    UnsupportedFinger(FingerName),

    /// 链提供者无法给出该手指的链
    #[error("No kinematic chain for {side} {finger}")]
    ChainUnavailable { side: HandSide, finger: FingerName },

    /// 列约简后的 Jacobian 列数不符合手指类型
    #[error("Reduced Jacobian of {finger} has {actual} columns, expected {expected}")]
    JacobianColumns {
        finger: FingerName,
        expected: usize,
        actual: usize,
    },

    /// 耦合矩阵形状错误
    #[error("Coupling matrix of {finger} is {actual:?}, expected {expected:?}")]
    CouplingShape {
        finger: FingerName,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// 编码器向量太短
    #[error("Encoder index {index} out of range (vector has {len} values)")]
    EncoderIndex { index: usize, len: usize },

    /// 关节数与链自由度不一致
    #[error("Chain expects {expected} joint values, got {actual}")]
    JointCount { expected: usize, actual: usize },
}

impl KinematicsError {
    /// 是否为构造期（配置）错误
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            KinematicsError::UnsupportedFinger(_)
                | KinematicsError::ChainUnavailable { .. }
                | KinematicsError::CouplingShape { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KinematicsError::JacobianColumns {
            finger: FingerName::Thumb,
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Reduced Jacobian of thumb has 2 columns, expected 1"
        );

        let err = KinematicsError::UnsupportedFinger(FingerName::Little);
        assert!(err.to_string().contains("little"));
        assert!(err.is_construction());
    }

    #[test]
    fn test_runtime_errors_are_not_construction() {
        let err = KinematicsError::EncoderIndex { index: 15, len: 8 };
        assert!(!err.is_construction());
        assert!(err.to_string().contains("15"));
    }
}
