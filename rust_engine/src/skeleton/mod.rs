//! 骨骼系统
//!
//! 两条求值路径：
//! - 按索引顺序的快速路径（父骨骼必须先于子骨骼声明），用于 MDL 二进制模型
//! - 记忆化递归路径（任意父子顺序），用于 Puppet 骨架

mod bone;
mod hierarchy;
mod manager;

pub use bone::{Bone, BoneTag};
pub use hierarchy::resolve_globals;
pub use manager::{BoneManager, EvaluationPath};

use glam::{Mat4, Quat, Vec3};

/// 骨骼变换数据
#[derive(Clone, Debug)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl BoneTransform {
    /// `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// 求逆；近奇异矩阵直接返回单位矩阵
pub fn invert_or_identity(matrix: Mat4, epsilon: f32) -> Mat4 {
    if matrix.determinant().abs() < epsilon {
        Mat4::IDENTITY
    } else {
        matrix.inverse()
    }
}
