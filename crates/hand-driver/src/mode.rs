//! 关节控制模式定义

use std::fmt;

/// 关节控制模式
///
/// # 模式说明
///
/// - **Idle**: 未控制（上电默认）
/// - **Position**: 位置模式，配合参考速度执行点到点运动（用于恢复初始位置）
/// - **Velocity**: 速度模式，持续跟随速度指令（用于接近/保持接触）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlMode {
    #[default]
    Idle,
    Position,
    Velocity,
}

impl ControlMode {
    /// 是否为位置模式
    pub fn is_position(self) -> bool {
        self == Self::Position
    }

    /// 是否为速度模式
    pub fn is_velocity(self) -> bool {
        self == Self::Velocity
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlMode::Idle => "idle",
            ControlMode::Position => "position",
            ControlMode::Velocity => "velocity",
        };
        f.write_str(s)
    }
}
