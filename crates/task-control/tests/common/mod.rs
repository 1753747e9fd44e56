//! 集成测试共享替身

#![allow(dead_code)]

use hand_control::{ClientError, HandClient};
use hand_protocol::{FingerName, HandCommand, HandRequest, HandResponse, HandSide};
use nalgebra::{Rotation3, Vector3};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use task_control::{
    ArmController, ArmError, ContextHandle, FilterClient, FilterMode, Limb, ManualClock,
    ObjectPoseSource, Pose, TaskCommand, TaskConfig, TaskStateMachine,
};

// ==================== 机械臂替身 ====================

#[derive(Debug, Clone, PartialEq)]
pub enum ArmCall {
    GoToPose(Pose),
    CheckMotionDone,
    StoreContext,
    RestoreContext(ContextHandle),
    SetTrajTime(f64),
    CurrentPose,
    Stop,
}

#[derive(Debug)]
struct ArmState {
    calls: Vec<ArmCall>,
    motion_done: bool,
    failing: Option<&'static str>,
    pose: Pose,
    next_context: u64,
}

/// 记录调用的机械臂，克隆体共享状态
#[derive(Debug, Clone)]
pub struct FakeArm {
    state: Arc<Mutex<ArmState>>,
}

impl FakeArm {
    pub fn new(pose: Pose) -> Self {
        Self {
            state: Arc::new(Mutex::new(ArmState {
                calls: Vec::new(),
                motion_done: false,
                failing: None,
                pose,
                next_context: 1,
            })),
        }
    }

    pub fn set_motion_done(&self, done: bool) {
        self.state.lock().motion_done = done;
    }

    /// 让指定操作失败（"go_to_pose"、"check_motion_done" 等）
    pub fn fail_on(&self, op: Option<&'static str>) {
        self.state.lock().failing = op;
    }

    pub fn calls(&self) -> Vec<ArmCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&ArmCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn targets(&self) -> Vec<Pose> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ArmCall::GoToPose(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ArmCall, op: &'static str) -> Result<(), ArmError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing == Some(op) {
            return Err(ArmError::command_failed(op, "injected failure"));
        }
        Ok(())
    }
}

impl ArmController for FakeArm {
    fn go_to_pose(&mut self, target: &Pose) -> Result<(), ArmError> {
        self.record(ArmCall::GoToPose(*target), "go_to_pose")
    }

    fn check_motion_done(&mut self) -> Result<bool, ArmError> {
        self.record(ArmCall::CheckMotionDone, "check_motion_done")?;
        Ok(self.state.lock().motion_done)
    }

    fn store_context(&mut self) -> Result<ContextHandle, ArmError> {
        self.record(ArmCall::StoreContext, "store_context")?;
        let mut state = self.state.lock();
        let handle = ContextHandle(state.next_context);
        state.next_context += 1;
        Ok(handle)
    }

    fn restore_context(&mut self, handle: ContextHandle) -> Result<(), ArmError> {
        self.record(ArmCall::RestoreContext(handle), "restore_context")
    }

    fn set_traj_time(&mut self, seconds: f64) -> Result<(), ArmError> {
        self.record(ArmCall::SetTrajTime(seconds), "set_traj_time")
    }

    fn current_pose(&mut self) -> Result<Pose, ArmError> {
        self.record(ArmCall::CurrentPose, "current_pose")?;
        Ok(self.state.lock().pose)
    }

    fn stop_control(&mut self) -> Result<(), ArmError> {
        self.record(ArmCall::Stop, "stop_control")
    }
}

// ==================== 手部客户端替身 ====================

#[derive(Debug, Default)]
struct HandState {
    requests: Vec<HandRequest>,
    approach_done: bool,
    restore_done: bool,
    disconnected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeHand {
    state: Arc<Mutex<HandState>>,
}

impl FakeHand {
    pub fn set_approach_done(&self, done: bool) {
        self.state.lock().approach_done = done;
    }

    pub fn set_restore_done(&self, done: bool) {
        self.state.lock().restore_done = done;
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }

    pub fn requests(&self) -> Vec<HandRequest> {
        self.state.lock().requests.clone()
    }

    pub fn commands(&self) -> Vec<HandCommand> {
        self.requests().iter().map(|r| r.command).collect()
    }

    pub fn count(&self, command: HandCommand) -> usize {
        self.commands().into_iter().filter(|c| *c == command).count()
    }
}

impl HandClient for FakeHand {
    fn send(&self, request: &HandRequest) -> Result<HandResponse, ClientError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        if state.disconnected {
            return Err(ClientError::Disconnected);
        }
        Ok(HandResponse {
            approach_done: state.approach_done,
            restore_done: state.restore_done,
        })
    }
}

// ==================== 滤波器与物体位姿 ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEvent {
    Enable(FilterMode),
    Disable,
}

#[derive(Debug, Clone, Default)]
pub struct FakeFilter {
    events: Arc<Mutex<Vec<FilterEvent>>>,
}

impl FakeFilter {
    pub fn events(&self) -> Vec<FilterEvent> {
        self.events.lock().clone()
    }
}

impl FilterClient for FakeFilter {
    fn enable(&self, mode: FilterMode) {
        self.events.lock().push(FilterEvent::Enable(mode));
    }

    fn disable(&self) {
        self.events.lock().push(FilterEvent::Disable);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeObject {
    pose: Arc<Mutex<Option<Pose>>>,
}

impl FakeObject {
    pub fn set(&self, pose: Option<Pose>) {
        *self.pose.lock() = pose;
    }
}

impl ObjectPoseSource for FakeObject {
    fn latest(&self) -> Option<Pose> {
        *self.pose.lock()
    }
}

// ==================== 测试夹具 ====================

pub const FINGERS: [FingerName; 2] = [FingerName::Thumb, FingerName::Index];

pub fn arm_start_pose() -> Pose {
    Pose::new(Vector3::new(-0.25, 0.15, 0.10), Rotation3::identity())
}

pub fn object_pose() -> Pose {
    Pose::new(Vector3::new(-0.35, 0.05, 0.02), Rotation3::identity())
}

pub struct Fixture {
    pub machine: TaskStateMachine,
    pub clock: ManualClock,
    pub arm: FakeArm,
    pub hand: FakeHand,
    pub filter: FakeFilter,
    pub object: FakeObject,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_hand_client(FakeHand::default())
    }

    pub fn with_hand_client(hand: FakeHand) -> Self {
        Self::build(hand, None)
    }

    /// 右手之外再配置一条左臂，返回左臂与左手替身
    pub fn two_handed() -> (Self, FakeArm, FakeHand) {
        let left_arm = FakeArm::new(arm_start_pose());
        let left_hand = FakeHand::default();
        let fixture = Self::build(
            FakeHand::default(),
            Some((left_arm.clone(), left_hand.clone())),
        );
        (fixture, left_arm, left_hand)
    }

    fn build(hand: FakeHand, left: Option<(FakeArm, FakeHand)>) -> Self {
        let clock = ManualClock::new();
        let arm = FakeArm::new(arm_start_pose());
        let filter = FakeFilter::default();
        let object = FakeObject::default();
        object.set(Some(object_pose()));

        let mut limbs = BTreeMap::new();
        limbs.insert(
            HandSide::Right,
            Limb::new(Box::new(arm.clone()), Arc::new(hand.clone())),
        );
        if let Some((left_arm, left_hand)) = left {
            limbs.insert(
                HandSide::Left,
                Limb::new(Box::new(left_arm), Arc::new(left_hand)),
            );
        }
        let machine = TaskStateMachine::new(
            TaskConfig::default(),
            Arc::new(clock.clone()),
            Box::new(filter.clone()),
            Box::new(object.clone()),
            limbs,
        );
        Self {
            machine,
            clock,
            arm,
            hand,
            filter,
            object,
        }
    }

    pub fn submit(&self, command: TaskCommand) {
        self.machine.inbox().submit(command).unwrap();
    }

    /// 推进时钟后执行一个周期
    pub fn tick_after(&mut self, dt: Duration) {
        self.clock.advance(dt);
        self.machine.tick();
    }

    pub fn tick(&mut self) {
        self.machine.tick();
    }
}

pub fn approach() -> TaskCommand {
    TaskCommand::Approach {
        hand: HandSide::Right,
        fingers: FINGERS.to_vec(),
        forward_speed: 0.01,
    }
}

pub fn push() -> TaskCommand {
    TaskCommand::Push {
        hand: HandSide::Right,
        fingers: FINGERS.to_vec(),
        forward_speed: 0.005,
    }
}

pub fn restore() -> TaskCommand {
    TaskCommand::Restore {
        hand: HandSide::Right,
        fingers: FINGERS.to_vec(),
        restore_speed: 20.0,
    }
}
