//! # Hand Control
//!
//! 触觉驱动的手指速度控制与手部协调。
//!
//! ## 数据流
//!
//! ```text
//! TactileSource ──SkinContact──▶ ContactClassifier ──ContactReport──▶ HandController
//!                                                                      │
//!                                                     FingerController ×N (速度控制律)
//!                                                                      │
//!                                                     FingerKinematics (约简 Jacobian)
//!                                                                      │
//!                                                          JointDevice (驱动)
//! ```
//!
//! [`HandControlModule`] 把协调器包装成周期执行的服务，通过 [`rpc`] 接收请求。

mod config;
pub mod contacts;
mod error;
pub mod finger;
pub mod hand;
pub mod loop_runner;
pub mod module;
pub mod rpc;

pub use config::{HandConfig, SeekGains};
pub use contacts::{
    ChannelTactileSource, ContactClassifier, ContactReport, SkinContact, TactileSource,
    classify_taxel,
};
pub use error::ControlError;
pub use finger::FingerController;
pub use hand::HandController;
pub use loop_runner::{LoopConfig, run_periodic};
pub use module::{HandControlModule, ModuleCommand, ModuleStatus};
pub use rpc::{ChannelHandClient, ClientError, HandClient, HandRpcServer, LocalHandClient, rpc_channel};
