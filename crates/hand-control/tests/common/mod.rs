//! 集成测试共享工具

#![allow(dead_code)]

use crossbeam_channel::Sender;
use hand_control::{ChannelTactileSource, HandConfig, HandControlModule, HandController, SeekGains, SkinContact};
use hand_driver::{DeviceCall, DeviceOp, MockJointDevice};
use hand_kinematics::ICubFingerChains;
use hand_kinematics::icub::JOINT_COUNT;
use hand_protocol::{FingerName, HandSide};
use std::sync::Arc;

/// 手指微屈的初始关节位置（deg）
pub fn initial_encoders() -> Vec<f64> {
    let mut enc = vec![0.0; JOINT_COUNT];
    enc[8] = 30.0;
    enc[9] = 5.0;
    enc[10] = 10.0;
    enc[11] = 15.0;
    enc[12] = 20.0;
    enc[13] = 15.0;
    enc[14] = 20.0;
    enc[15] = 30.0;
    enc
}

pub fn hand_controller(fingers: &[FingerName]) -> (MockJointDevice, HandController) {
    let device = MockJointDevice::with_positions(&initial_encoders());
    let hand = HandController::configure(
        HandSide::Right,
        fingers,
        Arc::new(device.clone()),
        &ICubFingerChains,
        SeekGains::default(),
    )
    .unwrap();
    device.clear_calls();
    (device, hand)
}

pub struct ModuleFixture {
    pub device: MockJointDevice,
    pub module: HandControlModule,
    pub contacts: Sender<Vec<SkinContact>>,
}

pub fn module(fingers: &[FingerName]) -> ModuleFixture {
    let device = MockJointDevice::with_positions(&initial_encoders());
    let (contacts, rx) = crossbeam_channel::unbounded();
    let config = HandConfig {
        hand: HandSide::Right,
        fingers: fingers.to_vec(),
        ..HandConfig::default()
    };
    let module = HandControlModule::from_config(
        &config,
        Arc::new(device.clone()),
        &ICubFingerChains,
        Box::new(ChannelTactileSource::new(rx)),
    )
    .unwrap();
    device.clear_calls();
    ModuleFixture {
        device,
        module,
        contacts,
    }
}

/// 手指对应的一个 taxel
pub fn taxel_for(finger: FingerName) -> u32 {
    match finger {
        FingerName::Index => 3,
        FingerName::Middle => 15,
        FingerName::Ring => 30,
        FingerName::Little => 40,
        FingerName::Thumb => 55,
    }
}

pub fn touching(fingers: &[FingerName]) -> Vec<SkinContact> {
    fingers
        .iter()
        .map(|&f| SkinContact::new(HandSide::Right, vec![taxel_for(f)]))
        .collect()
}

/// 涉及指定关节的速度命令数
pub fn velocity_moves_for(device: &MockJointDevice, joint: usize) -> usize {
    device
        .calls_of(DeviceOp::VelocityMove)
        .iter()
        .filter(|c| matches!(c, DeviceCall::VelocityMove { joints, .. } if joints.contains(&joint)))
        .count()
}

/// 涉及指定关节的停止命令数
pub fn stops_for(device: &MockJointDevice, joint: usize) -> usize {
    device
        .calls_of(DeviceOp::Stop)
        .iter()
        .filter(|c| matches!(c, DeviceCall::Stop(joints) if joints.contains(&joint)))
        .count()
}
