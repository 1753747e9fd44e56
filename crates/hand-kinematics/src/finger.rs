//! 手指控制描述
//!
//! 每根手指在构造时确定一次 [`FingerKind`]，之后的 Jacobian 约简和控制律都按类型分派。

use crate::KinematicsError;
use hand_protocol::FingerName;
use nalgebra::DMatrix;

/// 手指类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerKind {
    /// 对掌（拇指）：只保留对掌关节列，运动平面为根坐标系的 x–z 平面
    Opposition,
    /// 两个电机驱动三个屈曲关节（食指、中指）
    TwoDofCoupled,
    /// 单个电机近似驱动三个屈曲关节（无名指）
    SingleDofApprox,
}

impl FingerKind {
    /// 列约简之后 Jacobian 应有的列数
    pub fn reduced_columns(self) -> usize {
        match self {
            FingerKind::Opposition => 1,
            FingerKind::TwoDofCoupled | FingerKind::SingleDofApprox => 3,
        }
    }
}

/// 手指控制描述
#[derive(Debug, Clone, PartialEq)]
pub struct FingerSpec {
    pub name: FingerName,
    pub kind: FingerKind,
    /// 受控关节（完整关节向量中的下标）
    pub controlled_joints: Vec<usize>,
    /// 耦合矩阵（约简列数 × 受控关节数）
    pub coupling: DMatrix<f64>,
    /// 链的第 0 个关节是否为被动外展关节
    pub has_abduction: bool,
    /// 提供链几何的手指
    pub kinematic_chain: FingerName,
}

impl FingerSpec {
    /// 默认手指表
    ///
    /// | 手指 | 类型 | 受控关节 | 耦合 |
    /// |---|---|---|---|
    /// | thumb | Opposition | 8 | `[1]` |
    /// | index | TwoDofCoupled | 11, 12 | `[[1,0],[0,.5],[0,.5]]` |
    /// | middle | TwoDofCoupled | 13, 14 | 同 index |
    /// | ring | SingleDofApprox | 15 | `[1/3; 3]` |
    ///
    /// 无名指没有独立的几何参数，借用食指的链（`kinematic_chain = Index`）。
    /// 小指不受支持。
    pub fn for_finger(name: FingerName) -> Result<Self, KinematicsError> {
        let two_dof_coupling = || DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 0.5, 0.0, 0.5]);

        let spec = match name {
            FingerName::Thumb => Self {
                name,
                kind: FingerKind::Opposition,
                controlled_joints: vec![8],
                coupling: DMatrix::from_element(1, 1, 1.0),
                has_abduction: false,
                kinematic_chain: FingerName::Thumb,
            },
            FingerName::Index => Self {
                name,
                kind: FingerKind::TwoDofCoupled,
                controlled_joints: vec![11, 12],
                coupling: two_dof_coupling(),
                has_abduction: true,
                kinematic_chain: FingerName::Index,
            },
            FingerName::Middle => Self {
                name,
                kind: FingerKind::TwoDofCoupled,
                controlled_joints: vec![13, 14],
                coupling: two_dof_coupling(),
                has_abduction: false,
                kinematic_chain: FingerName::Middle,
            },
            FingerName::Ring => {
                tracing::warn!(
                    "Ring finger has no dedicated geometry, using index finger chain as fallback"
                );
                Self {
                    name,
                    kind: FingerKind::SingleDofApprox,
                    controlled_joints: vec![15],
                    coupling: DMatrix::from_element(3, 1, 1.0 / 3.0),
                    has_abduction: true,
                    kinematic_chain: FingerName::Index,
                }
            },
            FingerName::Little => return Err(KinematicsError::UnsupportedFinger(name)),
        };
        Ok(spec)
    }

    /// 受控自由度（N）
    pub fn controlled_dof(&self) -> usize {
        self.controlled_joints.len()
    }

    /// 校验耦合矩阵形状
    pub fn validate(&self) -> Result<(), KinematicsError> {
        let expected = (self.kind.reduced_columns(), self.controlled_dof());
        if self.coupling.shape() != expected {
            return Err(KinematicsError::CouplingShape {
                finger: self.name,
                expected,
                actual: self.coupling.shape(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        for name in [
            FingerName::Thumb,
            FingerName::Index,
            FingerName::Middle,
            FingerName::Ring,
        ] {
            let spec = FingerSpec::for_finger(name).unwrap();
            spec.validate().unwrap();
        }
    }

    #[test]
    fn test_little_unsupported() {
        assert_eq!(
            FingerSpec::for_finger(FingerName::Little).unwrap_err(),
            KinematicsError::UnsupportedFinger(FingerName::Little)
        );
    }

    #[test]
    fn test_ring_uses_index_geometry() {
        let ring = FingerSpec::for_finger(FingerName::Ring).unwrap();
        assert_eq!(ring.kinematic_chain, FingerName::Index);
        assert_eq!(ring.controlled_joints, vec![15]);
        assert_eq!(ring.kind, FingerKind::SingleDofApprox);
    }

    #[test]
    fn test_bad_coupling_shape() {
        let mut spec = FingerSpec::for_finger(FingerName::Index).unwrap();
        spec.coupling = DMatrix::zeros(2, 2);
        assert_eq!(
            spec.validate().unwrap_err(),
            KinematicsError::CouplingShape {
                finger: FingerName::Index,
                expected: (3, 2),
                actual: (2, 2),
            }
        );
    }
}
