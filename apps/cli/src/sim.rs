//! 仿真环境
//!
//! - [`SimArm`]: 按轨迹时间线性插值的笛卡尔机械臂
//! - [`SimWorld`]: 推进 mock 关节设备，手指近端关节行程超过阈值时产生触觉接触
//! - [`FixedObject`] / [`LogFilter`]: 固定的物体位姿与只记日志的滤波器

use crossbeam_channel::{Receiver, Sender};
use hand_control::SkinContact;
use hand_driver::MockJointDevice;
use hand_kinematics::FingerSpec;
use hand_protocol::{FingerName, HandSide};
use nalgebra::Vector3;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use task_control::{ArmController, ArmError, ContextHandle, FilterClient, FilterMode, ObjectPoseSource, Pose};
use tracing::{debug, info, trace};

// ==================== 机械臂 ====================

#[derive(Debug, Clone, Copy)]
struct Trajectory {
    from: Pose,
    to: Pose,
    started: Instant,
    duration: Duration,
}

impl Trajectory {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (now.duration_since(self.started).as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn pose_at(&self, now: Instant) -> Pose {
        let s = self.progress(now);
        Pose::new(
            self.from.position.lerp(&self.to.position, s),
            self.from.orientation.slerp(&self.to.orientation, s),
        )
    }
}

/// 仿真笛卡尔机械臂
#[derive(Debug)]
pub struct SimArm {
    pose: Pose,
    trajectory: Option<Trajectory>,
    traj_time: f64,
    contexts: HashMap<u64, f64>,
    next_context: u64,
}

impl SimArm {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            trajectory: None,
            traj_time: 1.0,
            contexts: HashMap::new(),
            next_context: 1,
        }
    }

    fn settle(&mut self, now: Instant) -> bool {
        let Some(trajectory) = self.trajectory else {
            return true;
        };
        self.pose = trajectory.pose_at(now);
        if trajectory.progress(now) >= 1.0 {
            self.trajectory = None;
            return true;
        }
        false
    }
}

impl ArmController for SimArm {
    fn go_to_pose(&mut self, target: &Pose) -> Result<(), ArmError> {
        let now = Instant::now();
        self.settle(now);
        self.trajectory = Some(Trajectory {
            from: self.pose,
            to: *target,
            started: now,
            duration: Duration::from_secs_f64(self.traj_time),
        });
        debug!(target = ?target.position, traj_time = self.traj_time, "Sim arm moving");
        Ok(())
    }

    fn check_motion_done(&mut self) -> Result<bool, ArmError> {
        Ok(self.settle(Instant::now()))
    }

    fn store_context(&mut self) -> Result<ContextHandle, ArmError> {
        let id = self.next_context;
        self.next_context += 1;
        self.contexts.insert(id, self.traj_time);
        Ok(ContextHandle(id))
    }

    fn restore_context(&mut self, handle: ContextHandle) -> Result<(), ArmError> {
        let traj_time = self
            .contexts
            .remove(&handle.0)
            .ok_or(ArmError::UnknownContext(handle))?;
        self.traj_time = traj_time;
        Ok(())
    }

    fn set_traj_time(&mut self, seconds: f64) -> Result<(), ArmError> {
        if seconds.is_nan() || seconds <= 0.0 {
            return Err(ArmError::command_failed(
                "set_traj_time",
                format!("invalid trajectory time {seconds}"),
            ));
        }
        self.traj_time = seconds;
        Ok(())
    }

    fn current_pose(&mut self) -> Result<Pose, ArmError> {
        self.settle(Instant::now());
        Ok(self.pose)
    }

    fn stop_control(&mut self) -> Result<(), ArmError> {
        self.settle(Instant::now());
        self.trajectory = None;
        Ok(())
    }
}

// ==================== 物体与滤波器 ====================

/// 固定位置的物体
#[derive(Debug, Clone)]
pub struct FixedObject {
    pose: Pose,
}

impl FixedObject {
    pub fn new(position: [f64; 3]) -> Self {
        Self {
            pose: Pose::new(Vector3::from(position), nalgebra::Rotation3::identity()),
        }
    }
}

impl ObjectPoseSource for FixedObject {
    fn latest(&self) -> Option<Pose> {
        Some(self.pose)
    }
}

/// 只记录日志的滤波器客户端
#[derive(Debug, Default)]
pub struct LogFilter {
    mode: Mutex<Option<FilterMode>>,
}

impl FilterClient for LogFilter {
    fn enable(&self, mode: FilterMode) {
        *self.mode.lock() = Some(mode);
        info!(?mode, "Filter enabled");
    }

    fn disable(&self) {
        if self.mode.lock().take().is_some() {
            info!("Filter disabled");
        }
    }
}

// ==================== 手与物体的接触 ====================

/// 手指在仿真中触发接触时使用的 taxel
fn sim_taxel(finger: FingerName) -> u32 {
    match finger {
        FingerName::Index => 5,
        FingerName::Middle => 17,
        FingerName::Ring => 29,
        FingerName::Little => 41,
        FingerName::Thumb => 53,
    }
}

/// 触觉数据通道：只保留一批未读数据，满时丢弃新数据
pub fn contact_channel() -> (Sender<Vec<SkinContact>>, Receiver<Vec<SkinContact>>) {
    crossbeam_channel::bounded(1)
}

/// 推进 mock 设备并产生触觉数据
pub struct SimWorld {
    device: MockJointDevice,
    side: HandSide,
    /// (手指, 近端关节, 初始位置)
    probes: Vec<(FingerName, usize, f64)>,
    travel_deg: f64,
    contacts: Sender<Vec<SkinContact>>,
}

impl SimWorld {
    pub fn new(
        device: MockJointDevice,
        side: HandSide,
        fingers: &[FingerName],
        travel_deg: f64,
        contacts: Sender<Vec<SkinContact>>,
    ) -> anyhow::Result<Self> {
        let positions = device.positions();
        let mut probes = Vec::with_capacity(fingers.len());
        for &finger in fingers {
            let spec = FingerSpec::for_finger(finger)?;
            let joint = spec.controlled_joints[0];
            probes.push((finger, joint, positions[joint]));
        }
        Ok(Self {
            device,
            side,
            probes,
            travel_deg,
            contacts,
        })
    }

    /// 推进一个周期
    pub fn step(&self, dt: Duration) {
        self.device.advance(dt);
        let calls = self.device.take_calls();
        trace!(calls = calls.len(), "Sim device step");

        let positions = self.device.positions();
        let touching: Vec<SkinContact> = self
            .probes
            .iter()
            .filter(|(_, joint, start)| (positions[*joint] - start).abs() >= self.travel_deg)
            .map(|(finger, _, _)| SkinContact::new(self.side, vec![sim_taxel(*finger)]))
            .collect();

        if !touching.is_empty() {
            // 手部线程已退出时丢弃
            let _ = self.contacts.try_send(touching);
        }
    }
}
