//! 笛卡尔位姿

use nalgebra::{Rotation3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// 末端位姿（机器人根坐标系，米）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: Rotation3<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: Rotation3<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// 由位置与 roll/pitch/yaw（rad）构造
    pub fn from_rpy(position: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            position: Vector3::from(position),
            orientation: Rotation3::from_euler_angles(rpy[0], rpy[1], rpy[2]),
        }
    }

    /// 平移后的位姿（姿态不变）
    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        Self {
            position: self.position + offset,
            orientation: self.orientation,
        }
    }
}

/// 接近物体时的手掌姿态：绕 z 轴转 π，再绕新的 x 轴转 −π/2
pub fn palm_attitude() -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), PI)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}
