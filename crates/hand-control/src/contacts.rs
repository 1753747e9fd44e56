//! 触觉接触分类
//!
//! 原始接触由皮肤部件所在的手和 taxel 编号列表组成。每个控制周期把接触映射为
//! 每根手指的接触计数，计数只对当前周期有效。
//!
//! | taxel | 手指 |
//! |---|---|
//! | 0–11 | index |
//! | 12–23 | middle |
//! | 24–35 | ring |
//! | 36–47 | little |
//! | 48–59 | thumb |

use crossbeam_channel::Receiver;
use hand_protocol::{FingerName, HandSide};

/// 一个原始皮肤接触
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinContact {
    /// 皮肤部件所在的手
    pub hand: HandSide,
    /// 被激活的 taxel 编号
    pub taxel_ids: Vec<u32>,
}

impl SkinContact {
    pub fn new(hand: HandSide, taxel_ids: Vec<u32>) -> Self {
        Self { hand, taxel_ids }
    }
}

/// taxel 编号 → 手指
pub fn classify_taxel(id: u32) -> Option<FingerName> {
    match id {
        0..=11 => Some(FingerName::Index),
        12..=23 => Some(FingerName::Middle),
        24..=35 => Some(FingerName::Ring),
        36..=47 => Some(FingerName::Little),
        48..=59 => Some(FingerName::Thumb),
        _ => None,
    }
}

/// 每根手指的接触计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactReport {
    counts: [u32; 5],
}

impl ContactReport {
    pub fn get(&self, finger: FingerName) -> u32 {
        self.counts[finger.index()]
    }

    pub fn in_contact(&self, finger: FingerName) -> bool {
        self.get(finger) > 0
    }

    pub fn add(&mut self, finger: FingerName) {
        self.counts[finger.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// 接触分类器（只统计一只手）
#[derive(Debug, Clone, Copy)]
pub struct ContactClassifier {
    side: HandSide,
}

impl ContactClassifier {
    pub fn new(side: HandSide) -> Self {
        Self { side }
    }

    /// 统计接触
    ///
    /// 另一只手的接触、空 taxel 列表和未知 taxel 都被忽略；
    /// 每个接触只按第一个 taxel 分类。
    pub fn classify(&self, contacts: &[SkinContact]) -> ContactReport {
        let mut report = ContactReport::default();
        for contact in contacts.iter().filter(|c| c.hand == self.side) {
            if let Some(finger) = contact.taxel_ids.first().copied().and_then(classify_taxel) {
                report.add(finger);
            }
        }
        report
    }
}

/// 触觉数据源（非阻塞）
pub trait TactileSource: Send {
    /// 最新一次接触列表；没有新数据时返回 `None`
    fn read_contacts(&mut self) -> Option<Vec<SkinContact>>;

    /// 丢弃所有待读数据，返回丢弃的数量
    fn drain(&mut self) -> usize;
}

/// 基于 crossbeam channel 的触觉数据源
#[derive(Debug)]
pub struct ChannelTactileSource {
    rx: Receiver<Vec<SkinContact>>,
}

impl ChannelTactileSource {
    pub fn new(rx: Receiver<Vec<SkinContact>>) -> Self {
        Self { rx }
    }
}

impl TactileSource for ChannelTactileSource {
    fn read_contacts(&mut self) -> Option<Vec<SkinContact>> {
        // 只保留最新的一批
        self.rx.try_iter().last()
    }

    fn drain(&mut self) -> usize {
        self.rx.try_iter().count()
    }
}
