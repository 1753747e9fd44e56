//! 默认手指几何
//!
//! 16 关节手臂+手向量的标称手指链参数：
//!
//! | 下标 | 关节 |
//! |---|---|
//! | 0–6 | 手臂（肩、肘、腕） |
//! | 7 | 手指外展（食指/无名指/小指共用） |
//! | 8 | 拇指对掌 |
//! | 9, 10 | 拇指近端 / 远端 |
//! | 11, 12 | 食指近端 / 远端 |
//! | 13, 14 | 中指近端 / 远端 |
//! | 15 | 无名指 + 小指 |

use crate::chain::{DhChain, DhLink, FingerChain, FingerChainProvider, JointSource};
use crate::{FingerSpec, KinematicsError};
use hand_protocol::{FingerName, HandSide};
use nalgebra::{Matrix4, Rotation3, Translation3, Vector3};
use std::f64::consts::FRAC_PI_2;

/// 完整关节向量长度
pub const JOINT_COUNT: usize = 16;

const DEG: f64 = std::f64::consts::PI / 180.0;

/// 标称手指链提供者
#[derive(Debug, Clone, Copy, Default)]
pub struct ICubFingerChains;

impl ICubFingerChains {
    pub fn new() -> Self {
        Self
    }

    /// 链基座（手掌坐标系中的手指根部）
    ///
    /// 左手与右手关于手掌平面镜像：基座 z 平移取反。
    fn base(side: HandSide, translation: Vector3<f64>, rotation: Rotation3<f64>) -> Matrix4<f64> {
        let mut t = translation;
        if side == HandSide::Left {
            t.z = -t.z;
        }
        Translation3::from(t).to_homogeneous() * rotation.to_homogeneous()
    }

    /// 链几何（基座 + 连杆）
    fn geometry(side: HandSide, finger: FingerName) -> Option<(Matrix4<f64>, Vec<DhLink>)> {
        let flex = |a: f64| DhLink::new(a, 0.0, 0.0, 0.0, 0.0, 90.0 * DEG);
        match finger {
            FingerName::Index => Some((
                Self::base(
                    side,
                    Vector3::new(0.0245, -0.0253, 0.0110),
                    Rotation3::identity(),
                ),
                vec![
                    DhLink::new(0.0148, 0.0, -FRAC_PI_2, 0.0, 0.0, 20.0 * DEG),
                    flex(0.0259),
                    flex(0.0220),
                    flex(0.0168),
                ],
            )),
            FingerName::Middle => Some((
                Self::base(
                    side,
                    Vector3::new(0.0178, -0.0073, 0.0),
                    Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2),
                ),
                vec![flex(0.0285), flex(0.0240), flex(0.0168)],
            )),
            FingerName::Thumb => Some((
                Self::base(
                    side,
                    Vector3::new(-0.0055, -0.0198, 0.0197),
                    Rotation3::identity(),
                ),
                vec![
                    DhLink::new(0.0, 0.0, FRAC_PI_2, 0.0, 0.0, 110.0 * DEG),
                    DhLink::new(0.0210, -0.0056, 0.0, 0.0, 0.0, 90.0 * DEG),
                    flex(0.0260),
                    flex(0.0220),
                ],
            )),
            FingerName::Ring | FingerName::Little => None,
        }
    }

    /// 编码器到链关节的映射
    fn sources(finger: FingerName) -> Option<Vec<JointSource>> {
        let sources = match finger {
            FingerName::Thumb => vec![
                JointSource::direct(8),
                JointSource::direct(9),
                JointSource::new(10, 0.5),
                JointSource::new(10, 0.5),
            ],
            FingerName::Index => vec![
                JointSource::new(7, 1.0 / 3.0),
                JointSource::direct(11),
                JointSource::new(12, 0.5),
                JointSource::new(12, 0.5),
            ],
            FingerName::Middle => vec![
                JointSource::direct(13),
                JointSource::new(14, 0.5),
                JointSource::new(14, 0.5),
            ],
            FingerName::Ring => vec![
                JointSource::new(7, 1.0 / 3.0),
                JointSource::new(15, 1.0 / 3.0),
                JointSource::new(15, 1.0 / 3.0),
                JointSource::new(15, 1.0 / 3.0),
            ],
            FingerName::Little => return None,
        };
        Some(sources)
    }
}

impl FingerChainProvider for ICubFingerChains {
    fn chain(
        &self,
        side: HandSide,
        spec: &FingerSpec,
    ) -> Result<Box<dyn FingerChain>, KinematicsError> {
        let unavailable = KinematicsError::ChainUnavailable {
            side,
            finger: spec.name,
        };
        let (base, links) = Self::geometry(side, spec.kinematic_chain).ok_or(unavailable.clone())?;
        let sources = Self::sources(spec.name).ok_or(unavailable)?;
        Ok(Box::new(DhChain::new(base, links, sources)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_dofs() {
        let provider = ICubFingerChains::new();
        for (finger, dof) in [
            (FingerName::Thumb, 4),
            (FingerName::Index, 4),
            (FingerName::Middle, 3),
            (FingerName::Ring, 4),
        ] {
            let spec = FingerSpec::for_finger(finger).unwrap();
            let chain = provider.chain(HandSide::Right, &spec).unwrap();
            assert_eq!(chain.dof(), dof, "{finger}");
        }
    }

    #[test]
    fn test_ring_reads_ring_encoder() {
        let provider = ICubFingerChains::new();
        let spec = FingerSpec::for_finger(FingerName::Ring).unwrap();
        let chain = provider.chain(HandSide::Right, &spec).unwrap();

        let mut encoders = vec![0.0; JOINT_COUNT];
        encoders[7] = 30.0;
        encoders[11] = 50.0;
        encoders[15] = 90.0;
        let q = chain.chain_joints(&encoders).unwrap();
        assert_eq!(q.as_slice(), &[10.0, 30.0, 30.0, 30.0]);
    }

    #[test]
    fn test_left_hand_mirrors_base() {
        let provider = ICubFingerChains::new();
        let spec = FingerSpec::for_finger(FingerName::Index).unwrap();
        let right = provider.chain(HandSide::Right, &spec).unwrap();
        let left = provider.chain(HandSide::Left, &spec).unwrap();
        let (pr, pl) = (right.tip_position(), left.tip_position());
        assert!((pr.x - pl.x).abs() < 1e-12);
        assert!((pr.y - pl.y).abs() < 1e-12);
        assert!((pr.z + pl.z).abs() < 1e-12);
    }

    #[test]
    fn test_little_chain_unavailable() {
        let provider = ICubFingerChains::new();
        let mut spec = FingerSpec::for_finger(FingerName::Index).unwrap();
        spec.name = FingerName::Little;
        spec.kinematic_chain = FingerName::Little;
        assert!(matches!(
            provider.chain(HandSide::Right, &spec),
            Err(KinematicsError::ChainUnavailable { .. })
        ));
    }
}
