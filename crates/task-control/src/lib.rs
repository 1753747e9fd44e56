//! # Task Control
//!
//! 接触搜索任务的顶层状态机：机械臂接近物体、手指前进直到接触、
//! 保持接触推动物体、手指与机械臂复位。
//!
//! ```text
//! 用户 ──TaskCommand──▶ TaskInbox ──take()──▶ TaskStateMachine::tick()
//!                          ▲                      │
//!                          └──── TaskStatus ──────┤
//!                                                 ├─▶ ArmController
//!                                                 ├─▶ HandClient (hand-control RPC)
//!                                                 ├─▶ FilterClient
//!                                                 └─◀ ObjectPoseSource
//! ```

mod clock;
mod collaborators;
mod config;
mod error;
mod inbox;
mod machine;
mod phase;
mod pose;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    ArmController, ContextHandle, FilterClient, FilterMode, Limb, ObjectPoseSource,
};
pub use config::{PhaseTimeouts, TaskConfig};
pub use error::{ArmError, TaskError};
pub use inbox::TaskInbox;
pub use machine::TaskStateMachine;
pub use phase::{PhaseParams, TaskCommand, TaskPhase, TaskStatus};
pub use pose::{Pose, palm_attitude};
