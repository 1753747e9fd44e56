//! 手指运动学封装
//!
//! 在手指根坐标系中给出：
//! - 指尖位姿（平面内两个坐标 + 标量姿态角）
//! - 约简 Jacobian（3×N）：列约简 → 旋转到根坐标系 → 行约简 → 右乘耦合矩阵
//!
//! ```text
//! J_geo (6×M) ──列约简──▶ 6×k ──Rᵀ──▶ J_root (6×k) ──行约简──▶ J_plane (3×k) ──·C──▶ J (3×N)
//! ```
//!
//! 其中 k = 1（对掌）或 3（其他手指），N 为受控关节数。

use crate::chain::{FingerChain, FingerChainProvider, rotation, translation};
use crate::{FingerKind, FingerSpec, KinematicsError};
use hand_protocol::{FingerName, HandSide};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use std::ops::Range;

/// 指尖位姿（根坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TipPose {
    /// 平面内第一坐标（m）
    pub x: f64,
    /// 平面内第二坐标（m）；对掌手指为根坐标系 z
    pub y: f64,
    /// 姿态角（rad）：保留关节角之和
    pub attitude: f64,
}

/// 单根手指的运动学
pub struct FingerKinematics {
    side: HandSide,
    spec: FingerSpec,
    chain: Box<dyn FingerChain>,
    root_position: Vector3<f64>,
    root_rotation: Matrix3<f64>,
}

impl std::fmt::Debug for FingerKinematics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerKinematics")
            .field("side", &self.side)
            .field("finger", &self.spec.name)
            .field("kind", &self.spec.kind)
            .field("dof", &self.chain.dof())
            .finish()
    }
}

impl FingerKinematics {
    /// 构造手指运动学
    ///
    /// 根坐标系取零位时第 0 个连杆之后的坐标系，构造后不再改变。
    pub fn new(
        side: HandSide,
        spec: FingerSpec,
        provider: &dyn FingerChainProvider,
    ) -> Result<Self, KinematicsError> {
        spec.validate()?;
        let mut chain = provider.chain(side, &spec)?;
        chain.set_angles(&DVector::zeros(chain.dof()))?;

        let root = chain.link_pose(0).ok_or(KinematicsError::JointCount {
            expected: 1,
            actual: 0,
        })?;
        let root_position = translation(&root);
        let root_rotation = rotation(&root);

        tracing::debug!(
            hand = %side,
            finger = %spec.name,
            kind = ?spec.kind,
            dof = chain.dof(),
            "Finger kinematics configured"
        );

        Ok(Self {
            side,
            spec,
            chain,
            root_position,
            root_rotation,
        })
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    pub fn name(&self) -> FingerName {
        self.spec.name
    }

    pub fn kind(&self) -> FingerKind {
        self.spec.kind
    }

    pub fn spec(&self) -> &FingerSpec {
        &self.spec
    }

    pub fn controlled_joints(&self) -> &[usize] {
        &self.spec.controlled_joints
    }

    /// 用完整编码器向量（deg）刷新链
    pub fn update(&mut self, encoders: &[f64]) -> Result<(), KinematicsError> {
        let q_deg = self.chain.chain_joints(encoders)?;
        self.chain.set_angles(&q_deg.map(f64::to_radians))
    }

    /// 当前链关节角（rad）
    pub fn angles(&self) -> DVector<f64> {
        self.chain.angles()
    }

    /// 列约简后保留的链关节
    fn retained(&self) -> Range<usize> {
        let dof = self.chain.dof();
        match self.spec.kind {
            FingerKind::Opposition => 0..dof.min(1),
            _ if self.spec.has_abduction => dof.min(1)..dof,
            _ => 0..dof,
        }
    }

    /// 近端关节角（rad）：第一个保留关节
    pub fn proximal_angle(&self) -> f64 {
        let q = self.chain.angles();
        q.get(self.retained().start).copied().unwrap_or(0.0)
    }

    /// 列约简并旋转到根坐标系的 6×k Jacobian
    pub fn root_jacobian(&self) -> Result<DMatrix<f64>, KinematicsError> {
        let cols = self.retained();
        let expected = self.spec.kind.reduced_columns();
        if cols.len() != expected {
            return Err(KinematicsError::JacobianColumns {
                finger: self.spec.name,
                expected,
                actual: cols.len(),
            });
        }

        let geo = self.chain.geo_jacobian();
        let rt = self.root_rotation.transpose();
        let mut j = DMatrix::zeros(6, cols.len());
        for (c, col) in cols.enumerate() {
            let lin = rt * geo.fixed_view::<3, 1>(0, col);
            let ang = rt * geo.fixed_view::<3, 1>(3, col);
            j.fixed_view_mut::<3, 1>(0, c).copy_from(&lin);
            j.fixed_view_mut::<3, 1>(3, c).copy_from(&ang);
        }
        Ok(j)
    }

    /// 平面约简后的 3×k Jacobian（耦合之前）
    ///
    /// 行顺序：两个平面内线速度 + 一个法向角速度。
    pub fn planar_jacobian(&self) -> Result<DMatrix<f64>, KinematicsError> {
        let j = self.root_jacobian()?;
        let rows = match self.spec.kind {
            FingerKind::Opposition => [0, 2, 4],
            FingerKind::TwoDofCoupled | FingerKind::SingleDofApprox => [0, 1, 5],
        };
        Ok(j.select_rows(rows.iter()))
    }

    /// 约简 Jacobian（3×N）
    pub fn jacobian(&self) -> Result<DMatrix<f64>, KinematicsError> {
        Ok(self.planar_jacobian()? * &self.spec.coupling)
    }

    /// 指尖位姿（根坐标系）
    pub fn tip_pose(&self) -> TipPose {
        let p = self.root_rotation.transpose() * (self.chain.tip_position() - self.root_position);
        let q = self.chain.angles();
        let attitude = self.retained().filter_map(|i| q.get(i)).sum();
        let (x, y) = match self.spec.kind {
            FingerKind::Opposition => (p.x, p.z),
            _ => (p.x, p.y),
        };
        TipPose { x, y, attitude }
    }
}
