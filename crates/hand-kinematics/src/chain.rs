//! DH 串联链
//!
//! 每根手指是一条从手掌（基座）出发的旋转关节串联链，用标准 DH 参数描述：
//!
//! ```text
//! A_i(θ) = Rz(θ + offset) · Tz(d) · Tx(a) · Rx(α)
//! ```
//!
//! 链的第 `i` 个坐标系是 `base · A_0 · … · A_i`，最后一个坐标系的原点即指尖。

use crate::KinematicsError;
use hand_protocol::HandSide;
use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Vector3};

use crate::FingerSpec;

/// 单个 DH 连杆
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhLink {
    pub a: f64,
    pub d: f64,
    pub alpha: f64,
    pub offset: f64,
    /// 关节下限（rad）
    pub min: f64,
    /// 关节上限（rad）
    pub max: f64,
}

impl DhLink {
    pub fn new(a: f64, d: f64, alpha: f64, offset: f64, min: f64, max: f64) -> Self {
        Self {
            a,
            d,
            alpha,
            offset,
            min,
            max,
        }
    }

    /// 关节角限位
    #[inline]
    pub fn clamp(&self, theta: f64) -> f64 {
        theta.clamp(self.min, self.max)
    }

    /// 连杆齐次变换
    pub fn transform(&self, theta: f64) -> Matrix4<f64> {
        let (st, ct) = (theta + self.offset).sin_cos();
        let (sa, ca) = self.alpha.sin_cos();
        Matrix4::new(
            ct,
            -st * ca,
            st * sa,
            self.a * ct,
            st,
            ct * ca,
            -ct * sa,
            self.a * st,
            0.0,
            sa,
            ca,
            self.d,
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }
}

/// 链关节值的来源：`encoders[encoder] * scale`（deg）
///
/// 欠驱动手指中一个电机驱动多个关节，例如 `enc12 / 2` 同时给远端两个关节。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSource {
    pub encoder: usize,
    pub scale: f64,
}

impl JointSource {
    pub const fn new(encoder: usize, scale: f64) -> Self {
        Self { encoder, scale }
    }

    pub const fn direct(encoder: usize) -> Self {
        Self::new(encoder, 1.0)
    }
}

/// 手指运动学链接口
pub trait FingerChain: Send {
    /// 链关节数（M）
    fn dof(&self) -> usize;

    /// 从完整编码器向量（deg）提取链关节角（deg）
    fn chain_joints(&self, encoders: &[f64]) -> Result<DVector<f64>, KinematicsError>;

    /// 设置链关节角（rad）
    fn set_angles(&mut self, q: &DVector<f64>) -> Result<(), KinematicsError>;

    /// 当前链关节角（rad，已限位）
    fn angles(&self) -> DVector<f64>;

    /// 第 `i` 个连杆之后的坐标系（相对链基座的参考系）
    fn link_pose(&self, i: usize) -> Option<Matrix4<f64>>;

    /// 指尖位置
    fn tip_position(&self) -> Vector3<f64>;

    /// 6×M geometric Jacobian（线速度在上，角速度在下）
    fn geo_jacobian(&self) -> DMatrix<f64>;
}

/// 为某只手的某根手指构造运动学链
pub trait FingerChainProvider: Send + Sync {
    fn chain(
        &self,
        side: HandSide,
        spec: &FingerSpec,
    ) -> Result<Box<dyn FingerChain>, KinematicsError>;
}

/// 标准 DH 链实现
#[derive(Debug, Clone)]
pub struct DhChain {
    base: Matrix4<f64>,
    links: Vec<DhLink>,
    sources: Vec<JointSource>,
    q: DVector<f64>,
}

impl DhChain {
    /// 创建链，初始关节角为 0（经限位）
    pub fn new(
        base: Matrix4<f64>,
        links: Vec<DhLink>,
        sources: Vec<JointSource>,
    ) -> Result<Self, KinematicsError> {
        if links.len() != sources.len() {
            return Err(KinematicsError::JointCount {
                expected: links.len(),
                actual: sources.len(),
            });
        }
        let q = DVector::from_iterator(links.len(), links.iter().map(|l| l.clamp(0.0)));
        Ok(Self {
            base,
            links,
            sources,
            q,
        })
    }

    /// 所有坐标系：`frames[0]` 为基座，`frames[i + 1]` 为第 `i` 个连杆之后
    fn frames(&self) -> Vec<Matrix4<f64>> {
        let mut frames = Vec::with_capacity(self.links.len() + 1);
        let mut t = self.base;
        frames.push(t);
        for (link, &theta) in self.links.iter().zip(self.q.iter()) {
            t *= link.transform(theta);
            frames.push(t);
        }
        frames
    }
}

/// 齐次变换的平移部分
#[inline]
pub(crate) fn translation(t: &Matrix4<f64>) -> Vector3<f64> {
    t.fixed_view::<3, 1>(0, 3).into_owned()
}

/// 齐次变换的旋转部分
#[inline]
pub(crate) fn rotation(t: &Matrix4<f64>) -> Matrix3<f64> {
    t.fixed_view::<3, 3>(0, 0).into_owned()
}

impl FingerChain for DhChain {
    fn dof(&self) -> usize {
        self.links.len()
    }

    fn chain_joints(&self, encoders: &[f64]) -> Result<DVector<f64>, KinematicsError> {
        let mut q = DVector::zeros(self.sources.len());
        for (i, src) in self.sources.iter().enumerate() {
            let value = encoders
                .get(src.encoder)
                .ok_or(KinematicsError::EncoderIndex {
                    index: src.encoder,
                    len: encoders.len(),
                })?;
            q[i] = value * src.scale;
        }
        Ok(q)
    }

    fn set_angles(&mut self, q: &DVector<f64>) -> Result<(), KinematicsError> {
        if q.len() != self.links.len() {
            return Err(KinematicsError::JointCount {
                expected: self.links.len(),
                actual: q.len(),
            });
        }
        for (i, link) in self.links.iter().enumerate() {
            self.q[i] = link.clamp(q[i]);
        }
        Ok(())
    }

    fn angles(&self) -> DVector<f64> {
        self.q.clone()
    }

    fn link_pose(&self, i: usize) -> Option<Matrix4<f64>> {
        if i >= self.links.len() {
            return None;
        }
        self.frames().get(i + 1).copied()
    }

    fn tip_position(&self) -> Vector3<f64> {
        self.frames()
            .last()
            .map(translation)
            .unwrap_or_else(Vector3::zeros)
    }

    fn geo_jacobian(&self) -> DMatrix<f64> {
        let frames = self.frames();
        let n = self.links.len();
        let mut j = DMatrix::zeros(6, n);
        let Some(tip) = frames.last().map(translation) else {
            return j;
        };

        // 第 i 个关节绕第 i 个坐标系（连杆 i 之前）的 z 轴旋转
        for i in 0..n {
            let z = rotation(&frames[i]).column(2).into_owned();
            let lin = z.cross(&(tip - translation(&frames[i])));
            j.fixed_view_mut::<3, 1>(0, i).copy_from(&lin);
            j.fixed_view_mut::<3, 1>(3, i).copy_from(&z);
        }
        j
    }
}
