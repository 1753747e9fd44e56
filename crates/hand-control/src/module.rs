//! 手部控制模块
//!
//! 把手部协调器包装成"命令暂存 + 周期执行"的服务：
//!
//! ```text
//! handle(HandRequest) ──锁内暂存──▶ Staged ◀──锁内拷贝── tick()
//!                                                       │
//!                                                       ▼ 锁外执行
//!                                    TactileSource → ContactClassifier → HandController
//! ```
//!
//! `handle` 只修改暂存字段，从不访问设备；`tick` 在锁内拷贝命令，在锁外执行。
//! 执行结果只在命令没有被更新的请求覆盖时才写回（代数计数）。

use crate::contacts::{ContactClassifier, TactileSource};
use crate::{ControlError, HandConfig, HandController};
use hand_driver::JointDevice;
use hand_kinematics::FingerChainProvider;
use hand_protocol::{FingerName, HandCommand, HandRequest, HandResponse, HandSide};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 模块当前执行的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleCommand {
    #[default]
    Idle,
    Approach,
    Follow,
    Restore,
    WaitRestoreDone,
    Stop,
}

/// 模块状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleStatus {
    pub command: ModuleCommand,
    pub approach_done: bool,
    pub restore_done: bool,
}

#[derive(Debug, Default)]
struct Staged {
    command: ModuleCommand,
    /// 每个动作命令递增
    generation: u64,
    fingers: Vec<FingerName>,
    forward_speed: f64,
    restore_speed: f64,
    approach_done: bool,
    restore_done: bool,
    reset_contacts: bool,
    flush_contacts: bool,
}

/// 一个周期要执行的命令（锁内拷贝）
struct TickInput {
    command: ModuleCommand,
    generation: u64,
    fingers: Vec<FingerName>,
    forward_speed: f64,
    restore_speed: f64,
    reset_contacts: bool,
    flush_contacts: bool,
}

/// 手部控制模块
pub struct HandControlModule {
    side: HandSide,
    classifier: ContactClassifier,
    shared: Mutex<Staged>,
    hand: Mutex<HandController>,
    tactile: Mutex<Box<dyn TactileSource>>,
}

impl HandControlModule {
    pub fn new(hand: HandController, tactile: Box<dyn TactileSource>) -> Self {
        let side = hand.side();
        Self {
            side,
            classifier: ContactClassifier::new(side),
            shared: Mutex::new(Staged::default()),
            hand: Mutex::new(hand),
            tactile: Mutex::new(tactile),
        }
    }

    /// 按配置构造（读取编码器记录初始位置）
    pub fn from_config(
        config: &HandConfig,
        device: Arc<dyn JointDevice>,
        provider: &dyn FingerChainProvider,
        tactile: Box<dyn TactileSource>,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        let hand = HandController::configure(
            config.hand,
            &config.fingers,
            device,
            provider,
            config.gains,
        )?;
        info!(hand = %config.hand, period_ms = config.period_ms, "Hand control module configured");
        Ok(Self::new(hand, tactile))
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    pub fn status(&self) -> ModuleStatus {
        let s = self.shared.lock();
        ModuleStatus {
            command: s.command,
            approach_done: s.approach_done,
            restore_done: s.restore_done,
        }
    }

    /// 处理一个请求（只暂存，不访问设备）
    pub fn handle(&self, request: &HandRequest) -> HandResponse {
        let mut response = HandResponse::default();
        if request.hand != self.side {
            debug!(
                hand = %self.side,
                requested = %request.hand,
                "Ignoring request for the other hand"
            );
            return response;
        }

        let mut s = self.shared.lock();
        let next = match request.command {
            HandCommand::Empty | HandCommand::Idle => None,
            HandCommand::ApproachStatus => {
                response.approach_done = s.approach_done;
                None
            },
            HandCommand::RestoreStatus => {
                response.restore_done = s.restore_done;
                None
            },
            HandCommand::Approach => {
                s.forward_speed = request.forward_speed;
                s.flush_contacts = true;
                s.reset_contacts = true;
                s.approach_done = false;
                Some(ModuleCommand::Approach)
            },
            HandCommand::Follow => {
                s.forward_speed = request.forward_speed;
                s.flush_contacts = true;
                Some(ModuleCommand::Follow)
            },
            HandCommand::Restore => {
                s.restore_speed = request.restore_speed;
                s.restore_done = false;
                Some(ModuleCommand::Restore)
            },
            HandCommand::Stop => Some(ModuleCommand::Stop),
        };

        if let Some(command) = next {
            s.command = command;
            s.fingers = request.fingers.clone();
            s.generation = s.generation.wrapping_add(1);
            debug!(hand = %self.side, ?command, fingers = ?s.fingers, "Hand command staged");
        }
        response
    }

    fn take_input(&self) -> TickInput {
        let mut s = self.shared.lock();
        let input = TickInput {
            command: s.command,
            generation: s.generation,
            fingers: s.fingers.clone(),
            forward_speed: s.forward_speed,
            restore_speed: s.restore_speed,
            reset_contacts: s.reset_contacts,
            flush_contacts: s.flush_contacts,
        };
        s.reset_contacts = false;
        s.flush_contacts = false;
        input
    }

    /// 写回执行结果（命令已被覆盖时丢弃）
    fn finish(&self, generation: u64, update: impl FnOnce(&mut Staged)) {
        let mut s = self.shared.lock();
        if s.generation == generation {
            update(&mut s);
        } else {
            debug!(hand = %self.side, "Tick result discarded, command superseded");
        }
    }

    fn go_idle(&self, generation: u64) {
        self.finish(generation, |s| s.command = ModuleCommand::Idle);
    }

    /// 失败处理：停止手指并回到 Idle
    fn abort(&self, hand: &HandController, input: &TickInput, err: &ControlError) {
        error!(
            hand = %self.side,
            command = ?input.command,
            error = %err,
            "Hand command failed, stopping fingers"
        );
        if let Err(e) = hand.stop_fingers(&Self::targets(hand, &input.fingers)) {
            warn!(hand = %self.side, error = %e, "Stop after failure incomplete");
        }
        self.go_idle(input.generation);
    }

    /// 未指定手指时作用于所有已配置手指
    fn targets(hand: &HandController, fingers: &[FingerName]) -> Vec<FingerName> {
        if fingers.is_empty() {
            hand.finger_names()
        } else {
            fingers.to_vec()
        }
    }

    /// 执行一个控制周期
    pub fn tick(&self) {
        let input = self.take_input();

        match input.command {
            ModuleCommand::Idle => {},
            ModuleCommand::Approach | ModuleCommand::Follow => {
                let contacts = {
                    let mut tactile = self.tactile.lock();
                    if input.flush_contacts {
                        let dropped = tactile.drain();
                        debug!(hand = %self.side, dropped, "Pending contacts flushed");
                    }
                    tactile.read_contacts().unwrap_or_default()
                };
                let report = self.classifier.classify(&contacts);

                let mut hand = self.hand.lock();
                if input.reset_contacts {
                    hand.reset_contacts();
                }

                let fingers = Self::targets(&hand, &input.fingers);
                let result = if input.command == ModuleCommand::Approach {
                    hand.move_until_contact(&fingers, input.forward_speed, &report)
                } else {
                    hand.maintain_contact(&fingers, input.forward_speed, &report)
                        .map(|_| false)
                };

                match result {
                    Err(e) => self.abort(&hand, &input, &e),
                    Ok(true) if input.command == ModuleCommand::Approach => {
                        info!(hand = %self.side, fingers = ?fingers, "Approach completed");
                        self.finish(input.generation, |s| {
                            s.command = ModuleCommand::Idle;
                            s.approach_done = true;
                        });
                    },
                    Ok(_) => {},
                }
            },
            ModuleCommand::Restore => {
                let mut hand = self.hand.lock();
                let fingers = Self::targets(&hand, &input.fingers);
                match hand.restore_positions(&fingers, input.restore_speed) {
                    Ok(()) => self.finish(input.generation, |s| {
                        s.command = ModuleCommand::WaitRestoreDone;
                    }),
                    Err(e) => self.abort(&hand, &input, &e),
                }
            },
            ModuleCommand::WaitRestoreDone => {
                let hand = self.hand.lock();
                match hand.is_restore_done(&Self::targets(&hand, &input.fingers)) {
                    Ok(done) => self.finish(input.generation, |s| {
                        s.restore_done = done;
                        if done {
                            s.command = ModuleCommand::Idle;
                        }
                    }),
                    Err(e) => self.abort(&hand, &input, &e),
                }
            },
            ModuleCommand::Stop => {
                let hand = self.hand.lock();
                if let Err(e) = hand.stop_fingers(&Self::targets(&hand, &input.fingers)) {
                    warn!(hand = %self.side, error = %e, "Stop command incomplete");
                }
                self.go_idle(input.generation);
            },
        }
    }

    /// 关闭模块：停止所有手指
    pub fn close(&self) -> Result<(), ControlError> {
        self.hand.lock().close()
    }
}
