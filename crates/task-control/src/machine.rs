//! 任务状态机
//!
//! ```text
//! Idle ─Localize─▶ Localize ─▶ Idle
//! Idle ─Approach─▶ ArmApproach ─▶ WaitArmApproachDone ─▶ FingersApproach ─▶ WaitFingersApproachDone ─▶ Idle
//! Idle ─Push─────▶ Push ─▶ WaitPushDone ─▶ Idle
//! Idle ─Restore──▶ FingersRestore ─▶ WaitFingersRestoreDone ─▶ ArmRestore ─▶ WaitArmRestoreDone ─▶ Idle
//! any  ─Stop─────▶ Stop ─▶ Idle
//! ```
//!
//! 每个 `tick()` 执行一个阶段处理函数。等待阶段先检查完成条件，再检查截止时间；
//! 失败与超时停止相关子系统后回到 `Idle`。

use crate::pose::palm_attitude;
use crate::{
    Clock, ContextHandle, FilterClient, FilterMode, Limb, ObjectPoseSource, PhaseParams, Pose,
    TaskCommand, TaskConfig, TaskError, TaskInbox, TaskPhase, TaskStatus,
};
use hand_control::{ControlError, LoopConfig, run_periodic};
use hand_protocol::{HandCommand, HandRequest, HandSide};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 接触搜索任务状态机
///
/// 只由控制线程持有并驱动；外部通过 [`TaskInbox`] 提交命令、读取状态快照。
pub struct TaskStateMachine {
    config: TaskConfig,
    inbox: Arc<TaskInbox>,
    clock: Arc<dyn Clock>,
    limbs: BTreeMap<HandSide, Limb>,
    filter: Box<dyn FilterClient>,
    objects: Box<dyn ObjectPoseSource>,

    phase: TaskPhase,
    hand: Option<HandSide>,
    params: PhaseParams,
    deadline: Option<Duration>,
    /// 最近一次完成接近（手指已接触）的手
    approached: Option<HandSide>,
    saved_context: Option<(HandSide, ContextHandle)>,
    /// 接近开始时的机械臂位姿（机械臂复位目标）
    approach_start: Option<(HandSide, Pose)>,
    last_error: Option<TaskError>,
}

impl TaskStateMachine {
    pub fn new(
        config: TaskConfig,
        clock: Arc<dyn Clock>,
        filter: Box<dyn FilterClient>,
        objects: Box<dyn ObjectPoseSource>,
        limbs: BTreeMap<HandSide, Limb>,
    ) -> Self {
        let inbox = Arc::new(TaskInbox::new(limbs.keys().copied().collect()));
        info!(hands = ?limbs.keys().collect::<Vec<_>>(), "Task state machine created");
        Self {
            config,
            inbox,
            clock,
            limbs,
            filter,
            objects,
            phase: TaskPhase::Idle,
            hand: None,
            params: PhaseParams::default(),
            deadline: None,
            approached: None,
            saved_context: None,
            approach_start: None,
            last_error: None,
        }
    }

    // ==================== 访问器 ====================

    /// 命令邮箱（可在其他线程提交命令）
    pub fn inbox(&self) -> Arc<TaskInbox> {
        Arc::clone(&self.inbox)
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn hand(&self) -> Option<HandSide> {
        self.hand
    }

    pub fn params(&self) -> &PhaseParams {
        &self.params
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// 当前手是否已完成接近
    pub fn approach_done(&self) -> bool {
        self.hand.is_some() && self.approached == self.hand
    }

    pub fn approached_hand(&self) -> Option<HandSide> {
        self.approached
    }

    pub fn saved_context(&self) -> Option<ContextHandle> {
        self.saved_context.map(|(_, handle)| handle)
    }

    pub fn last_error(&self) -> Option<&TaskError> {
        self.last_error.as_ref()
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            phase: self.phase,
            hand: self.hand,
            approach_done: self.approach_done(),
            context_held: self.saved_context.is_some(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    // ==================== 周期执行 ====================

    /// 执行一个控制周期
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if let Some(command) = self.inbox.take() {
            self.accept(command, now);
        }
        self.step(now);
        self.inbox.publish(self.status());
    }

    /// 以配置的周期运行，直到 `is_running` 变为 `false`
    pub fn run(&mut self, is_running: &AtomicBool) -> Result<u64, ControlError> {
        let config = LoopConfig::with_period(self.config.period());
        run_periodic(&config, is_running, || self.tick())
    }

    fn accept(&mut self, command: TaskCommand, now: Duration) {
        if command.is_stop() {
            info!(phase = %self.phase, "Stop requested");
            self.enter(TaskPhase::Stop, now);
            return;
        }
        if self.phase != TaskPhase::Idle {
            warn!(phase = %self.phase, ?command, "Command arrived while busy, dropping");
            return;
        }
        if let Some(hand) = command.hand() {
            if !self.limbs.contains_key(&hand) {
                warn!(%hand, "No limb configured for hand, dropping command");
                return;
            }
            self.hand = Some(hand);
        }
        if let Some(params) = PhaseParams::from_command(&command) {
            self.params = params;
        }
        self.last_error = None;
        info!(?command, "Task command accepted");
        self.enter(command.entry_phase(), now);
    }

    fn enter(&mut self, phase: TaskPhase, now: Duration) {
        debug!(from = %self.phase, to = %phase, "Task phase transition");
        self.phase = phase;
        self.deadline = self.config.timeouts.for_phase(phase).map(|timeout| now + timeout);
    }

    fn step(&mut self, now: Duration) {
        let phase = self.phase;
        let result = match phase {
            TaskPhase::Idle => Ok(TaskPhase::Idle),
            TaskPhase::Localize => {
                self.filter.enable(FilterMode::Visual);
                Ok(TaskPhase::Idle)
            },
            TaskPhase::ArmApproach => self.start_arm_approach(),
            TaskPhase::WaitArmApproachDone => self.wait_arm(now).map(|done| {
                if done {
                    TaskPhase::FingersApproach
                } else {
                    phase
                }
            }),
            TaskPhase::FingersApproach => self.start_fingers_approach(),
            TaskPhase::WaitFingersApproachDone => self.wait_fingers_approach(now),
            TaskPhase::Push => self.start_push(),
            TaskPhase::WaitPushDone => self.wait_push(now),
            TaskPhase::FingersRestore => self.start_fingers_restore(),
            TaskPhase::WaitFingersRestoreDone => self.wait_fingers_restore(now),
            TaskPhase::ArmRestore => self.start_arm_restore(),
            TaskPhase::WaitArmRestoreDone => self.wait_arm(now).map(|done| {
                if done {
                    info!("Arm restored");
                    TaskPhase::Idle
                } else {
                    phase
                }
            }),
            TaskPhase::Stop => {
                self.run_stop();
                Ok(TaskPhase::Idle)
            },
        };

        match result {
            Ok(next) if next == phase => {},
            Ok(next) => self.enter(next, now),
            Err(err) => {
                self.abort(phase, err);
                self.enter(TaskPhase::Idle, now);
            },
        }
    }

    // ==================== 阶段处理 ====================

    fn start_arm_approach(&mut self) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        let object = self.objects.latest().ok_or(TaskError::NoObjectEstimate)?;
        let target = Pose::new(object.position + self.config.approach_offset(), palm_attitude());

        let arm = &mut self.limb_mut()?.arm;
        let start = arm.current_pose()?;
        arm.go_to_pose(&target)?;
        self.approach_start = Some((hand, start));

        info!(%hand, target = ?target.position, "Arm approaching object");
        Ok(TaskPhase::WaitArmApproachDone)
    }

    fn start_fingers_approach(&mut self) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        let request =
            HandRequest::approach(hand, self.params.fingers.clone(), self.params.forward_speed);
        self.limb_mut()?.hand.send(&request)?;
        self.approached = None;
        Ok(TaskPhase::WaitFingersApproachDone)
    }

    fn wait_fingers_approach(&mut self, now: Duration) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        let response = self
            .limb_mut()?
            .hand
            .send(&HandRequest::new(hand, HandCommand::ApproachStatus))?;
        if response.approach_done {
            self.approached = Some(hand);
            info!(%hand, "Fingers in contact");
            return Ok(TaskPhase::Idle);
        }
        self.check_deadline(now)?;
        Ok(TaskPhase::WaitFingersApproachDone)
    }

    fn start_push(&mut self) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        if self.approached != Some(hand) {
            debug!(%hand, approached = ?self.approached, "Push requested before this hand reached contact, ignoring");
            return Ok(TaskPhase::Idle);
        }
        let traj_time = self.config.push_traj_time_s;
        let displacement = self.config.push_displacement();

        let handle = self.limb_mut()?.arm.store_context()?;
        self.saved_context = Some((hand, handle));

        let limb = self.limb_mut()?;
        limb.arm.set_traj_time(traj_time)?;
        let target = limb.arm.current_pose()?.translated(&displacement);
        limb.arm.go_to_pose(&target)?;
        let client = Arc::clone(&limb.hand);

        self.filter.enable(FilterMode::Tactile);
        client.send(&HandRequest::follow(
            hand,
            self.params.fingers.clone(),
            self.params.forward_speed,
        ))?;

        info!(%hand, %handle, target = ?target.position, "Pushing object");
        Ok(TaskPhase::WaitPushDone)
    }

    fn wait_push(&mut self, now: Duration) -> Result<TaskPhase, TaskError> {
        if self.limb_mut()?.arm.check_motion_done()? {
            info!("Push trajectory finished");
            self.end_push();
            return Ok(TaskPhase::Idle);
        }
        self.check_deadline(now)?;
        Ok(TaskPhase::WaitPushDone)
    }

    fn start_fingers_restore(&mut self) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        if self.approached == Some(hand) {
            self.approached = None;
        }
        let request =
            HandRequest::restore(hand, self.params.fingers.clone(), self.params.restore_speed);
        self.limb_mut()?.hand.send(&request)?;
        Ok(TaskPhase::WaitFingersRestoreDone)
    }

    fn wait_fingers_restore(&mut self, now: Duration) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        let response = self
            .limb_mut()?
            .hand
            .send(&HandRequest::new(hand, HandCommand::RestoreStatus))?;
        if response.restore_done {
            info!(%hand, "Fingers restored");
            return Ok(TaskPhase::ArmRestore);
        }
        self.check_deadline(now)?;
        Ok(TaskPhase::WaitFingersRestoreDone)
    }

    fn start_arm_restore(&mut self) -> Result<TaskPhase, TaskError> {
        let hand = self.current_hand()?;
        let target = match self.approach_start {
            Some((side, pose)) if side == hand => pose,
            _ => self.config.home_pose(),
        };
        self.limb_mut()?.arm.go_to_pose(&target)?;
        info!(%hand, target = ?target.position, "Arm restoring");
        Ok(TaskPhase::WaitArmRestoreDone)
    }

    fn wait_arm(&mut self, now: Duration) -> Result<bool, TaskError> {
        if self.limb_mut()?.arm.check_motion_done()? {
            return Ok(true);
        }
        self.check_deadline(now)?;
        Ok(false)
    }

    fn run_stop(&mut self) {
        let sides: Vec<HandSide> = match self.hand {
            Some(hand) => vec![hand],
            None => self.limbs.keys().copied().collect(),
        };
        for side in sides {
            let Some(limb) = self.limbs.get_mut(&side) else {
                continue;
            };
            if let Err(e) = limb.arm.stop_control() {
                warn!(hand = %side, error = %e, "Failed to stop arm");
            }
            if let Err(e) = limb.hand.send(&HandRequest::stop(side, Vec::new())) {
                warn!(hand = %side, error = %e, "Failed to stop fingers");
            }
        }
        self.filter.disable();
        self.restore_saved_context();
        self.approached = None;
        info!("Task stopped");
    }

    // ==================== 失败处理 ====================

    fn abort(&mut self, phase: TaskPhase, err: TaskError) {
        warn!(%phase, error = %err, "Task phase failed, returning to idle");
        match phase {
            TaskPhase::ArmApproach
            | TaskPhase::WaitArmApproachDone
            | TaskPhase::ArmRestore
            | TaskPhase::WaitArmRestoreDone => self.stop_arm(),
            TaskPhase::FingersApproach
            | TaskPhase::WaitFingersApproachDone
            | TaskPhase::FingersRestore
            | TaskPhase::WaitFingersRestoreDone => self.stop_fingers(),
            TaskPhase::Push | TaskPhase::WaitPushDone => self.end_push(),
            TaskPhase::Idle | TaskPhase::Localize | TaskPhase::Stop => {},
        }
        self.last_error = Some(err);
    }

    /// 推动结束（完成、失败或超时）：停止机械臂与手指，关闭滤波，恢复上下文
    fn end_push(&mut self) {
        self.stop_arm();
        self.stop_fingers();
        self.filter.disable();
        self.restore_saved_context();
    }

    fn stop_arm(&mut self) {
        let Some(hand) = self.hand else { return };
        if let Some(limb) = self.limbs.get_mut(&hand)
            && let Err(e) = limb.arm.stop_control()
        {
            warn!(%hand, error = %e, "Failed to stop arm");
        }
    }

    fn stop_fingers(&mut self) {
        let Some(hand) = self.hand else { return };
        if let Some(limb) = self.limbs.get(&hand)
            && let Err(e) = limb
                .hand
                .send(&HandRequest::stop(hand, self.params.fingers.clone()))
        {
            warn!(%hand, error = %e, "Failed to stop fingers");
        }
    }

    fn restore_saved_context(&mut self) {
        let Some((hand, handle)) = self.saved_context.take() else {
            return;
        };
        if let Some(limb) = self.limbs.get_mut(&hand) {
            match limb.arm.restore_context(handle) {
                Ok(()) => debug!(%hand, %handle, "Arm context restored"),
                Err(e) => warn!(%hand, %handle, error = %e, "Failed to restore arm context"),
            }
        }
    }

    // ==================== 辅助函数 ====================

    fn current_hand(&self) -> Result<HandSide, TaskError> {
        self.hand.ok_or(TaskError::NoTargetHand)
    }

    fn limb_mut(&mut self) -> Result<&mut Limb, TaskError> {
        let hand = self.current_hand()?;
        self.limbs.get_mut(&hand).ok_or(TaskError::UnknownHand(hand))
    }

    fn check_deadline(&self, now: Duration) -> Result<(), TaskError> {
        match (self.deadline, self.config.timeouts.for_phase(self.phase)) {
            (Some(deadline), Some(timeout)) if now >= deadline => Err(TaskError::Timeout {
                phase: self.phase,
                timeout_ms: timeout.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}
