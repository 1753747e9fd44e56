//! 任务命令邮箱
//!
//! 深度为 1 的覆盖式邮箱（共享插槽）：
//! - 提交方只在锁内写插槽，不做任何 I/O
//! - 状态机每个周期开始时 `take()` 取走命令，插槽变为 None
//! - 非空闲阶段提交的命令被拒绝（`Busy`），`Stop` 总是被接受并覆盖插槽
//!
//! 状态快照通过 `ArcSwap` 发布，读取无锁。

use crate::{TaskCommand, TaskError, TaskPhase, TaskStatus};
use arc_swap::ArcSwap;
use hand_protocol::HandSide;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    /// 状态机最近发布的阶段（取走命令时提前设为命令的入口阶段）
    phase: TaskPhase,
    pending: Option<TaskCommand>,
}

/// 任务命令邮箱 + 状态快照
#[derive(Debug)]
pub struct TaskInbox {
    hands: Vec<HandSide>,
    slot: Mutex<Slot>,
    status: ArcSwap<TaskStatus>,
}

impl TaskInbox {
    /// 创建邮箱，`hands` 为已配置机械臂/手部的手
    pub fn new(hands: Vec<HandSide>) -> Self {
        Self {
            hands,
            slot: Mutex::new(Slot::default()),
            status: ArcSwap::from_pointee(TaskStatus::default()),
        }
    }

    /// 提交命令
    ///
    /// - `Stop`：总是接受，覆盖插槽中的任何命令
    /// - 其他命令：仅在 `Idle` 且插槽中没有待执行的 `Stop` 时接受，
    ///   否则返回 `Busy`，插槽不变
    pub fn submit(&self, command: TaskCommand) -> Result<(), TaskError> {
        if let Some(hand) = command.hand()
            && !self.hands.contains(&hand)
        {
            return Err(TaskError::UnknownHand(hand));
        }

        let mut slot = self.slot.lock();
        if !command.is_stop() {
            if slot.phase != TaskPhase::Idle {
                return Err(TaskError::Busy { phase: slot.phase });
            }
            if slot.pending.as_ref().is_some_and(TaskCommand::is_stop) {
                return Err(TaskError::Busy {
                    phase: TaskPhase::Stop,
                });
            }
        }

        if let Some(replaced) = slot.pending.replace(command) {
            debug!(?replaced, "Task inbox: pending command overwritten");
        }
        Ok(())
    }

    /// 最近发布的状态快照（无锁）
    pub fn status(&self) -> Arc<TaskStatus> {
        self.status.load_full()
    }

    /// 是否有待执行的命令
    pub fn has_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }

    /// 取出待执行命令
    ///
    /// 取走的同时把镜像阶段设为命令入口阶段，保证本周期内的新提交被拒绝。
    pub(crate) fn take(&self) -> Option<TaskCommand> {
        let mut slot = self.slot.lock();
        let command = slot.pending.take()?;
        slot.phase = command.entry_phase();
        Some(command)
    }

    /// 发布周期结束时的状态
    pub(crate) fn publish(&self, status: TaskStatus) {
        {
            let mut slot = self.slot.lock();
            slot.phase = status.phase;
        }
        self.status.store(Arc::new(status));
    }
}
