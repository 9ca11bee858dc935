//! 动画关键帧

use glam::{Quat, Vec3};

/// 每帧浮点数个数：位置 xyz、欧拉角 xyz（弧度）、缩放 xyz
pub const FLOATS_PER_FRAME: usize = 9;

/// 骨骼关键帧
#[derive(Clone, Debug)]
pub struct BoneKeyframe {
    pub position: Vec3,
    /// 欧拉角（弧度）
    pub euler: Vec3,
    pub scale: Vec3,
    /// 由欧拉角预计算，见 `AnimationClip::prepare`
    pub rotation: Quat,
}

impl BoneKeyframe {
    pub fn new(position: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            euler,
            scale,
            rotation: Quat::IDENTITY,
        }
    }

    /// 从 9 个连续浮点数构造
    pub fn from_floats(v: &[f32; FLOATS_PER_FRAME]) -> Self {
        Self::new(
            Vec3::new(v[0], v[1], v[2]),
            Vec3::new(v[3], v[4], v[5]),
            Vec3::new(v[6], v[7], v[8]),
        )
    }
}

impl Default for BoneKeyframe {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }
}
