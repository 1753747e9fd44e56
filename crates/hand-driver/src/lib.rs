//! 关节设备驱动层
//!
//! 本模块定义手部/手臂关节设备的最小接口，包括：
//! - 控制模式查询与切换（位置/速度）
//! - 参考速度设置与位置运动
//! - 速度运动与停止
//! - 运动完成查询与编码器读取
//!
//! # 使用场景
//!
//! 上层控制器（`hand-control`）只依赖 [`JointDevice`] trait，
//! 实际硬件驱动或仿真设备在外部实现。启用 `mock` feature 可获得
//! [`MockJointDevice`](mock::MockJointDevice)，用于测试和仿真。

mod device;
mod error;
pub mod mode;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use device::JointDevice;
pub use error::DriverError;
pub use mode::ControlMode;

#[cfg(any(test, feature = "mock"))]
pub use mock::{DeviceCall, DeviceOp, MockJointDevice};
