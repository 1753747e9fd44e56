//! 手部控制模块集成测试

mod common;

use common::*;
use hand_control::{HandClient, ModuleCommand, rpc_channel};
use hand_driver::DeviceOp;
use hand_protocol::{FingerName, HandCommand, HandRequest, HandSide};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const FINGERS: [FingerName; 2] = [FingerName::Index, FingerName::Thumb];

fn approach_status(fixture: &ModuleFixture) -> bool {
    fixture
        .module
        .handle(&HandRequest::new(HandSide::Right, HandCommand::ApproachStatus))
        .approach_done
}

#[test]
fn test_handle_never_touches_device() {
    let f = module(&FINGERS);
    f.module
        .handle(&HandRequest::approach(HandSide::Right, FINGERS.to_vec(), 0.01));
    f.module
        .handle(&HandRequest::restore(HandSide::Right, FINGERS.to_vec(), 10.0));
    f.module.handle(&HandRequest::stop(HandSide::Right, FINGERS.to_vec()));
    assert!(f.device.calls().is_empty());
}

#[test]
fn test_other_hand_ignored() {
    let f = module(&FINGERS);
    let response = f
        .module
        .handle(&HandRequest::approach(HandSide::Left, FINGERS.to_vec(), 0.01));
    assert!(!response.approach_done && !response.restore_done);
    assert_eq!(f.module.status().command, ModuleCommand::Idle);
}

#[test]
fn test_approach_until_all_fingers_touch() {
    let f = module(&FINGERS);
    // 上一轮残留的接触应在新的 Approach 开始时被丢弃
    f.contacts.send(touching(&FINGERS)).unwrap();
    f.module
        .handle(&HandRequest::approach(HandSide::Right, FINGERS.to_vec(), 0.01));
    assert!(!approach_status(&f));

    f.module.tick();
    assert_eq!(velocity_moves_for(&f.device, 11), 1);
    assert_eq!(velocity_moves_for(&f.device, 8), 1);
    assert!(!approach_status(&f));

    f.contacts.send(touching(&[FingerName::Index])).unwrap();
    f.module.tick();
    assert_eq!(stops_for(&f.device, 11), 1);
    assert!(!approach_status(&f));

    // 空周期：没有新数据等同于没有接触
    f.module.tick();
    assert_eq!(velocity_moves_for(&f.device, 11), 1);
    assert_eq!(velocity_moves_for(&f.device, 8), 3);

    f.contacts.send(touching(&[FingerName::Thumb])).unwrap();
    f.module.tick();
    assert!(approach_status(&f));
    assert_eq!(f.module.status().command, ModuleCommand::Idle);

    // Idle 之后不再有运动命令
    f.device.clear_calls();
    f.module.tick();
    assert!(f.device.calls().is_empty());
}

#[test]
fn test_empty_finger_list_targets_all_fingers() {
    let f = module(&FINGERS);
    f.module
        .handle(&HandRequest::approach(HandSide::Right, vec![], 0.01));
    f.module.tick();

    assert!(!approach_status(&f));
    assert_eq!(f.module.status().command, ModuleCommand::Approach);
    assert_eq!(velocity_moves_for(&f.device, 11), 1);
    assert_eq!(velocity_moves_for(&f.device, 8), 1);

    f.contacts.send(touching(&FINGERS)).unwrap();
    f.module.tick();
    assert!(approach_status(&f));
}

#[test]
fn test_new_approach_resets_flags() {
    let f = module(&[FingerName::Index]);
    f.module
        .handle(&HandRequest::approach(HandSide::Right, vec![FingerName::Index], 0.01));
    // Approach 之后的第一次 tick 先清空待读数据
    f.module.tick();
    f.contacts.send(touching(&[FingerName::Index])).unwrap();
    f.module.tick();
    assert!(approach_status(&f));

    f.module
        .handle(&HandRequest::approach(HandSide::Right, vec![FingerName::Index], 0.01));
    assert!(!approach_status(&f));
    f.device.clear_calls();
    f.module.tick();
    assert_eq!(velocity_moves_for(&f.device, 11), 1);
}

#[test]
fn test_device_failure_stops_and_goes_idle() {
    let f = module(&FINGERS);
    f.device.set_failing(DeviceOp::VelocityMove, true);
    f.module
        .handle(&HandRequest::follow(HandSide::Right, FINGERS.to_vec(), 0.01));
    f.module.tick();

    assert_eq!(f.module.status().command, ModuleCommand::Idle);
    // 失败手指自身停止 + 模块停止所有指定手指
    assert!(stops_for(&f.device, 8) >= 1);
    assert!(stops_for(&f.device, 11) >= 1);
}

#[test]
fn test_restore_flow() {
    let f = module(&FINGERS);
    let home = initial_encoders();
    let mut moved = home.clone();
    moved[8] += 20.0;
    moved[11] += 20.0;
    moved[12] += 30.0;
    f.device.set_positions(&moved);

    f.module
        .handle(&HandRequest::restore(HandSide::Right, FINGERS.to_vec(), 20.0));
    f.module.tick();
    assert_eq!(f.module.status().command, ModuleCommand::WaitRestoreDone);

    f.module.tick();
    let status = f.module.status();
    assert!(!status.restore_done);
    assert_eq!(status.command, ModuleCommand::WaitRestoreDone);

    f.device.advance(Duration::from_secs(5));
    f.module.tick();
    let response = f
        .module
        .handle(&HandRequest::new(HandSide::Right, HandCommand::RestoreStatus));
    assert!(response.restore_done);
    assert_eq!(f.module.status().command, ModuleCommand::Idle);
    assert_eq!(f.device.positions()[11], home[11]);
}

#[test]
fn test_stop_runs_once_then_idle() {
    let f = module(&FINGERS);
    f.module
        .handle(&HandRequest::follow(HandSide::Right, FINGERS.to_vec(), 0.01));
    f.module.tick();
    f.module.handle(&HandRequest::stop(HandSide::Right, vec![]));
    f.device.clear_calls();

    f.module.tick();
    assert_eq!(stops_for(&f.device, 8), 1);
    assert_eq!(stops_for(&f.device, 11), 1);
    assert_eq!(f.module.status().command, ModuleCommand::Idle);

    f.module.tick();
    assert_eq!(f.device.calls_of(DeviceOp::Stop).len(), 2);
}

#[test]
fn test_rpc_channel_round_trip() {
    let f = module(&FINGERS);
    let module = Arc::new(f.module);
    let (client, server) = rpc_channel(Duration::from_secs(1));
    let running = Arc::new(AtomicBool::new(true));

    let handle = {
        let module = Arc::clone(&module);
        let running = Arc::clone(&running);
        std::thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                if server.serve_pending(&module).is_err() {
                    break;
                }
                module.tick();
                std::thread::sleep(Duration::from_millis(1));
            }
        })
    };

    client
        .send(&HandRequest::approach(HandSide::Right, FINGERS.to_vec(), 0.01))
        .unwrap();
    let response = client
        .send(&HandRequest::new(HandSide::Right, HandCommand::ApproachStatus))
        .unwrap();
    assert!(!response.approach_done);

    running.store(false, Ordering::Release);
    handle.join().unwrap();
}

#[test]
fn test_rpc_server_answers_without_ticks() {
    let f = module(&FINGERS);
    let module = Arc::new(f.module);
    let (client, server) = rpc_channel(Duration::from_secs(1));
    let running = Arc::new(AtomicBool::new(true));

    let handle = {
        let module = Arc::clone(&module);
        let running = Arc::clone(&running);
        std::thread::spawn(move || server.serve(&module, &running, Duration::from_millis(5)))
    };

    client
        .send(&HandRequest::approach(HandSide::Right, FINGERS.to_vec(), 0.01))
        .unwrap();
    let response = client
        .send(&HandRequest::new(HandSide::Right, HandCommand::ApproachStatus))
        .unwrap();
    assert!(!response.approach_done);
    assert_eq!(module.status().command, ModuleCommand::Approach);
    // 只暂存，没有控制周期就不会访问设备
    assert!(f.device.calls().is_empty());

    drop(client);
    assert_eq!(handle.join().unwrap(), 2);
    running.store(false, Ordering::Release);
}
