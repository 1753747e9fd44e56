//! # Hand Kinematics
//!
//! 手指运动学：DH 串联链、geometric Jacobian、耦合矩阵和平面约简。
//!
//! ## 模块结构
//!
//! - [`chain`]: DH 串联链与 [`FingerChain`] / [`FingerChainProvider`] 接口
//! - [`icub`]: 默认的手指几何（标称参数 + 编码器映射）
//! - [`finger`]: 每根手指的控制描述（[`FingerKind`]、受控关节、耦合矩阵）
//! - [`kinematics`]: [`FingerKinematics`]，输出指尖位姿与约简 Jacobian
//!
//! ## 单位
//!
//! 设备侧（编码器）使用度，链内部和 Jacobian 使用弧度。

pub mod chain;
pub mod error;
pub mod finger;
pub mod icub;
pub mod kinematics;

pub use chain::{DhChain, DhLink, FingerChain, FingerChainProvider, JointSource};
pub use error::KinematicsError;
pub use finger::{FingerKind, FingerSpec};
pub use icub::ICubFingerChains;
pub use kinematics::{FingerKinematics, TipPose};
