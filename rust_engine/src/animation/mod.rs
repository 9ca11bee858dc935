//! 动画系统
//!
//! 提供动画片段、骨骼关键帧、欧拉角转换以及逐节点的播放状态。

mod clip;
mod keyframe;
mod state;

pub use clip::{sample_track, sample_track_euler, AnimationClip};
pub use keyframe::{BoneKeyframe, FLOATS_PER_FRAME};
pub use state::AnimationState;

use glam::{Mat4, Quat, Vec3};

/// 欧拉角转四元数（ZYX 顺序：先绕 X，再绕 Y，最后绕 Z）
pub fn euler_to_quat(euler: Vec3) -> Quat {
    let qx = Quat::from_rotation_x(euler.x);
    let qy = Quat::from_rotation_y(euler.y);
    let qz = Quat::from_rotation_z(euler.z);
    qz * qy * qx
}

/// 欧拉角转旋转矩阵，与 [`euler_to_quat`] 顺序一致
pub fn euler_to_matrix(euler: Vec3) -> Mat4 {
    Mat4::from_rotation_z(euler.z) * Mat4::from_rotation_y(euler.y) * Mat4::from_rotation_x(euler.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_quat_matches_matrix() {
        let euler = Vec3::new(0.3, -1.1, 2.0);
        let from_quat = Mat4::from_quat(euler_to_quat(euler));
        let from_mat = euler_to_matrix(euler);
        assert!(from_quat.abs_diff_eq(from_mat, 1e-5));
    }

    #[test]
    fn test_euler_order_x_first() {
        // 先绕 X 转 90°，再绕 Z 转 90°：Y 轴 -> Z 轴 -> Z 轴
        let q = euler_to_quat(Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, std::f32::consts::FRAC_PI_2));
        let v = q * Vec3::Y;
        assert!(v.abs_diff_eq(Vec3::Z, 1e-5));
    }
}
