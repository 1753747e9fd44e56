//! 手侧与手指名称
//!
//! 字符串（"thumb"、"index" ...）只在配置文件和命令行的边界处解析一次。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 手侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// 所有手侧
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    /// 小写名称（与配置文件一致）
    pub fn as_str(self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandSide {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(HandSide::Left),
            "right" => Ok(HandSide::Right),
            _ => Err(ProtocolError::UnknownHand(s.to_string())),
        }
    }
}

/// 手指名称
///
/// `Little`（小指）只作为触觉分类的桶存在，控制层不支持它。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FingerName {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl FingerName {
    /// 所有手指（按数组下标顺序）
    pub const ALL: [FingerName; 5] = [
        FingerName::Thumb,
        FingerName::Index,
        FingerName::Middle,
        FingerName::Ring,
        FingerName::Little,
    ];

    /// 数组下标（0..5），用于定长计数表
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 小写名称
    pub fn as_str(self) -> &'static str {
        match self {
            FingerName::Thumb => "thumb",
            FingerName::Index => "index",
            FingerName::Middle => "middle",
            FingerName::Ring => "ring",
            FingerName::Little => "little",
        }
    }

    /// 解析逗号分隔的手指列表（如 `"thumb,index"`）
    ///
    /// 空白项会被跳过，任何未知名称都会导致整体失败。
    pub fn parse_list(s: &str) -> Result<Vec<FingerName>, ProtocolError> {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(FingerName::from_str)
            .collect()
    }
}

impl fmt::Display for FingerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thumb" => Ok(FingerName::Thumb),
            "index" => Ok(FingerName::Index),
            "middle" => Ok(FingerName::Middle),
            "ring" => Ok(FingerName::Ring),
            // 触觉驱动里小指也叫 pinky
            "little" | "pinky" => Ok(FingerName::Little),
            _ => Err(ProtocolError::UnknownFinger(s.to_string())),
        }
    }
}
