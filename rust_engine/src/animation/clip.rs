//! 动画片段
//!
//! 一个片段包含若干骨骼轨道（骨骼 ID -> 逐帧关键帧），轨道是稀疏的：
//! 没有轨道的骨骼保持绑定姿态。

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::config::get_config;
use crate::skeleton::BoneTransform;

use super::{euler_to_matrix, euler_to_quat, BoneKeyframe};

/// 动画片段
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub id: i32,
    pub name: String,
    pub fps: f32,
    /// 片段长度（帧）
    pub length: i32,
    /// 骨骼 ID -> 关键帧序列
    pub tracks: HashMap<i32, Vec<BoneKeyframe>>,
    frame_time: f64,
    max_time: f64,
}

impl AnimationClip {
    /// 创建片段并立即完成预计算
    pub fn new(
        id: i32,
        name: String,
        fps: f32,
        length: i32,
        tracks: HashMap<i32, Vec<BoneKeyframe>>,
    ) -> Self {
        let mut clip = Self {
            id,
            name,
            fps,
            length,
            tracks,
            frame_time: 0.0,
            max_time: 0.0,
        };
        clip.prepare();
        clip
    }

    /// 预计算帧时长、总时长以及每个关键帧的四元数
    pub fn prepare(&mut self) {
        if self.fps.is_nan() || self.fps <= 0.0 {
            self.fps = get_config().default_fps;
        }
        let fps = self.fps as f64;
        self.frame_time = 1.0 / fps;
        self.max_time = self.length.max(0) as f64 / fps;

        for frames in self.tracks.values_mut() {
            for kf in frames.iter_mut() {
                kf.rotation = euler_to_quat(kf.euler);
            }
        }
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// 获取骨骼轨道
    pub fn track(&self, bone_id: i32) -> Option<&[BoneKeyframe]> {
        self.tracks
            .get(&bone_id)
            .map(|frames| frames.as_slice())
            .filter(|frames| !frames.is_empty())
    }

    /// 把时间折回 `[0, max_time)`
    pub fn wrap_time(&self, time: f64) -> f64 {
        if self.max_time > 0.0 {
            time.rem_euclid(self.max_time)
        } else {
            0.0
        }
    }

    /// 当前处于第几轮循环
    pub fn cycle(&self, time: f64) -> i64 {
        if self.max_time > 0.0 {
            (time / self.max_time).floor() as i64
        } else {
            0
        }
    }

    /// 计算插值所用的前后帧和插值系数
    ///
    /// 返回 `(frame_a, frame_b, t)`，其中 `frame_b = (frame_a + 1) % length`
    pub fn frame_position(&self, time: f64) -> (usize, usize, f32) {
        let length = self.length.max(1) as usize;
        let rate = self.wrap_time(time) / self.frame_time;
        let whole = rate.floor();
        let frame_a = (whole as usize) % length;
        let frame_b = (frame_a + 1) % length;
        (frame_a, frame_b, (rate - whole) as f32)
    }

    /// 连续帧序号（用于按轨道自身帧数取模的求值方式）
    pub fn frame_index(&self, time: f64) -> f32 {
        (self.wrap_time(time) * self.fps as f64) as f32
    }

    /// 轨道上所有关键帧 Y 缩放的最小值
    pub fn min_scale_y(&self, bone_id: i32) -> Option<f32> {
        self.track(bone_id)?
            .iter()
            .map(|kf| kf.scale.y)
            .reduce(f32::min)
    }
}

/// 在两帧之间插值：位置和缩放线性插值，旋转球面插值
pub fn sample_track(frames: &[BoneKeyframe], frame_a: usize, frame_b: usize, t: f32) -> BoneTransform {
    let count = frames.len();
    let a = &frames[frame_a % count];
    let b = &frames[frame_b % count];
    BoneTransform {
        translation: a.position.lerp(b.position, t),
        rotation: a.rotation.slerp(b.rotation, t),
        scale: a.scale.lerp(b.scale, t),
    }
}

/// 按轨道自身帧数取模，在欧拉角空间线性插值后合成 `T * R * S`
pub fn sample_track_euler(frames: &[BoneKeyframe], frame_index: f32) -> Mat4 {
    let count = frames.len();
    let whole = frame_index.max(0.0).floor();
    let idx0 = (whole as usize) % count;
    let idx1 = (idx0 + 1) % count;
    let fraction = frame_index - whole;
    let k1 = &frames[idx0];
    let k2 = &frames[idx1];

    let position = k1.position.lerp(k2.position, fraction);
    let euler: Vec3 = k1.euler.lerp(k2.euler, fraction);
    let scale = k1.scale.lerp(k2.scale, fraction);

    Mat4::from_translation(position) * euler_to_matrix(euler) * Mat4::from_scale(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_frame_clip(fps: f32) -> AnimationClip {
        let mut tracks = HashMap::new();
        tracks.insert(
            0,
            vec![
                BoneKeyframe::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE),
                BoneKeyframe::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.1, 1.0)),
            ],
        );
        AnimationClip::new(7, "idle".to_string(), fps, 2, tracks)
    }

    #[test]
    fn test_fps_defaults_to_30() {
        let clip = two_frame_clip(0.0);
        assert_eq!(clip.fps, 30.0);
        assert!((clip.max_time() - 2.0 / 30.0).abs() < 1e-9);
        assert!((clip.frame_time() - 1.0 / 30.0).abs() < 1e-9);

        let clip = two_frame_clip(-5.0);
        assert_eq!(clip.fps, 30.0);
    }

    #[test]
    fn test_prepare_computes_rotation() {
        let clip = two_frame_clip(30.0);
        let frames = clip.track(0).unwrap();
        assert!(frames[1].rotation.abs_diff_eq(euler_to_quat(Vec3::new(0.0, 0.0, 1.0)), 1e-6));
    }

    #[test]
    fn test_frame_position_wraps() {
        let clip = two_frame_clip(30.0);
        let (a, b, t) = clip.frame_position(0.0);
        assert_eq!((a, b), (0, 1));
        assert!(t.abs() < 1e-6);

        let (a, b, t) = clip.frame_position(1.5 / 30.0);
        assert_eq!((a, b), (1, 0));
        assert!((t - 0.5).abs() < 1e-4);

        let (a, _, _) = clip.frame_position(-0.25 / 30.0);
        assert_eq!(a, 1);
    }

    #[test]
    fn test_min_scale_y() {
        let clip = two_frame_clip(30.0);
        assert!((clip.min_scale_y(0).unwrap() - 0.1).abs() < 1e-6);
        assert!(clip.min_scale_y(3).is_none());
    }

    #[test]
    fn test_sample_track_midpoint() {
        let clip = two_frame_clip(30.0);
        let frames = clip.track(0).unwrap();
        let pose = sample_track(frames, 0, 1, 0.5);
        assert!(pose.translation.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!((pose.scale.y - 0.55).abs() < 1e-5);
    }
}
