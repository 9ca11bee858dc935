//! 骨骼管理器

use glam::Mat4;

use crate::animation::{sample_track, sample_track_euler, AnimationClip};
use crate::config::get_config;

use super::{invert_or_identity, resolve_globals, Bone};

/// 骨骼层级的求值方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationPath {
    /// 按数组顺序单遍求值，只接受索引更小的父骨骼
    Ordered,
    /// 记忆化递归，父子顺序任意
    Hierarchical,
}

/// 骨骼管理器
pub struct BoneManager {
    bones: Vec<Bone>,
    clips: Vec<AnimationClip>,
    path: EvaluationPath,
    global_bind: Vec<Mat4>,
    final_transforms: Vec<Mat4>,
    skinning_matrices: Vec<Mat4>,
}

impl BoneManager {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            clips: Vec::new(),
            path: EvaluationPath::Ordered,
            global_bind: Vec::new(),
            final_transforms: Vec::new(),
            skinning_matrices: Vec::new(),
        }
    }

    /// 添加骨骼
    pub fn add_bone(&mut self, bone: Bone) {
        self.bones.push(bone);
    }

    /// 添加动画片段
    pub fn add_clip(&mut self, clip: AnimationClip) {
        self.clips.push(clip);
    }

    /// 获取骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// 按 ID 查找片段
    pub fn clip(&self, clip_id: i32) -> Option<&AnimationClip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    pub fn evaluation_path(&self) -> EvaluationPath {
        self.path
    }

    /// 绑定姿态下的全局矩阵
    pub fn global_bind_transforms(&self) -> &[Mat4] {
        &self.global_bind
    }

    /// 最近一次求值得到的全局矩阵
    pub fn final_transforms(&self) -> &[Mat4] {
        &self.final_transforms
    }

    /// 蒙皮矩阵（最多 `max_bones` 个）
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning_matrices
    }

    /// 按索引顺序计算绑定姿态全局矩阵和逆绑定矩阵
    ///
    /// 父索引不小于自身索引的骨骼按根处理。
    pub fn prepare(&mut self) {
        self.path = EvaluationPath::Ordered;
        let count = self.bones.len();
        let mut globals = vec![Mat4::IDENTITY; count];
        for i in 0..count {
            let parent_global = self.bones[i]
                .ordered_parent(i)
                .map_or(Mat4::IDENTITY, |p| globals[p]);
            globals[i] = parent_global * self.bones[i].bind_transform;
        }
        self.finish_prepare(globals);
    }

    /// 任意父子顺序下计算绑定姿态全局矩阵和逆绑定矩阵
    pub fn prepare_hierarchical(&mut self) {
        self.path = EvaluationPath::Hierarchical;
        let (parents, locals) = self.bind_layout();
        let globals = resolve_globals(&parents, &locals);
        self.finish_prepare(globals);
    }

    fn bind_layout(&self) -> (Vec<i32>, Vec<Mat4>) {
        self.bones
            .iter()
            .map(|b| (b.parent_index, b.bind_transform))
            .unzip()
    }

    fn finish_prepare(&mut self, globals: Vec<Mat4>) {
        let config = get_config();
        for (bone, global) in self.bones.iter_mut().zip(&globals) {
            bone.inverse_bind_matrix = invert_or_identity(*global, config.singular_epsilon);
        }
        for clip in &mut self.clips {
            clip.prepare();
        }

        let capacity = self.bones.len().min(config.max_bones);
        self.final_transforms = globals.clone();
        self.global_bind = globals;
        self.skinning_matrices = vec![Mat4::IDENTITY; capacity];
        self.refresh_skinning();

        log::debug!(
            "骨骼准备完成: {} 根骨骼, {} 个片段, 路径 {:?}",
            self.bones.len(),
            self.clips.len(),
            self.path
        );
    }

    fn refresh_skinning(&mut self) {
        let count = self.skinning_matrices.len();
        for i in 0..count {
            self.skinning_matrices[i] =
                self.final_transforms[i] * self.bones[i].inverse_bind_matrix;
        }
    }

    /// 按 prepare 选择的路径求值
    pub fn evaluate(&mut self, clip_id: i32, time: f64) -> &[Mat4] {
        match self.path {
            EvaluationPath::Ordered => self.update(clip_id, time),
            EvaluationPath::Hierarchical => self.update_hierarchical(clip_id, time),
        }
    }

    /// 按索引顺序求值指定片段在 `time` 秒的姿态
    ///
    /// 片段不存在时原样返回上一次的蒙皮矩阵。没有轨道的骨骼使用绑定局部变换。
    pub fn update(&mut self, clip_id: i32, time: f64) -> &[Mat4] {
        let Some(clip) = self.clips.iter().find(|c| c.id == clip_id) else {
            return &self.skinning_matrices;
        };
        if self.final_transforms.len() != self.bones.len() {
            return &self.skinning_matrices;
        }

        let (frame_a, frame_b, t) = clip.frame_position(time);
        for i in 0..self.bones.len() {
            let bone = &self.bones[i];
            let local = match clip.track(bone.id) {
                Some(frames) => sample_track(frames, frame_a, frame_b, t).to_matrix(),
                None => bone.bind_transform,
            };
            self.final_transforms[i] = match bone.ordered_parent(i) {
                Some(p) => self.final_transforms[p] * local,
                None => local,
            };
        }

        self.refresh_skinning();
        &self.skinning_matrices
    }

    /// 递归层级求值，轨道在欧拉角空间插值
    pub fn update_hierarchical(&mut self, clip_id: i32, time: f64) -> &[Mat4] {
        let Some(clip) = self.clips.iter().find(|c| c.id == clip_id) else {
            return &self.skinning_matrices;
        };
        if self.final_transforms.len() != self.bones.len() {
            return &self.skinning_matrices;
        }

        let frame_index = clip.frame_index(time);
        let (parents, locals): (Vec<i32>, Vec<Mat4>) = self
            .bones
            .iter()
            .map(|bone| {
                let local = match clip.track(bone.id) {
                    Some(frames) => sample_track_euler(frames, frame_index),
                    None => bone.bind_transform,
                };
                (bone.parent_index, local)
            })
            .unzip();

        self.final_transforms = resolve_globals(&parents, &locals);
        self.refresh_skinning();
        &self.skinning_matrices
    }
}

impl Default for BoneManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::BoneKeyframe;
    use std::collections::HashMap;
    use glam::Vec3;

    fn chain() -> BoneManager {
        let mut manager = BoneManager::new();
        manager.add_bone(Bone::new(
            0,
            "root".into(),
            -1,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        ));
        manager.add_bone(Bone::new(
            1,
            "child".into(),
            0,
            Mat4::from_rotation_z(0.5) * Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        ));
        manager
    }

    fn moving_clip() -> AnimationClip {
        let mut tracks = HashMap::new();
        tracks.insert(
            1,
            vec![
                BoneKeyframe::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE),
                BoneKeyframe::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 0.0, 0.4), Vec3::ONE),
                BoneKeyframe::new(Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, Vec3::ONE),
            ],
        );
        AnimationClip::new(1, "wave".into(), 30.0, 3, tracks)
    }

    #[test]
    fn test_inverse_bind_cancels_global() {
        let mut manager = chain();
        manager.prepare();
        for (bone, global) in manager.bones().iter().zip(manager.global_bind_transforms()) {
            assert!((bone.inverse_bind_matrix * *global).abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
        for skin in manager.skinning_matrices() {
            assert!(skin.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_unknown_clip_keeps_pose() {
        let mut manager = chain();
        manager.add_clip(moving_clip());
        manager.prepare();
        let before = manager.update(1, 0.05).to_vec();
        let after = manager.update(99, 0.0).to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_wraps_in_time() {
        let mut manager = chain();
        manager.add_clip(moving_clip());
        manager.prepare();
        let max_time = manager.clip(1).map(|c| c.max_time()).unwrap();

        let first = manager.update(1, 0.04).to_vec();
        let wrapped = manager.update(1, 0.04 + max_time).to_vec();
        for (a, b) in first.iter().zip(&wrapped) {
            assert!(a.abs_diff_eq(*b, 1e-4));
        }
    }

    #[test]
    fn test_untracked_bone_uses_bind() {
        let mut manager = chain();
        manager.add_clip(moving_clip());
        manager.prepare();
        let skins = manager.update(1, 0.07).to_vec();
        // 根骨骼没有轨道
        assert!(skins[0].abs_diff_eq(Mat4::IDENTITY, 1e-5));
        assert!(!skins[1].abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }

    #[test]
    fn test_hierarchical_matches_ordered_in_bind_pose() {
        let mut ordered = chain();
        ordered.prepare();
        let mut hierarchical = chain();
        hierarchical.prepare_hierarchical();
        for (a, b) in ordered
            .global_bind_transforms()
            .iter()
            .zip(hierarchical.global_bind_transforms())
        {
            assert!(a.abs_diff_eq(*b, 1e-5));
        }
        assert_eq!(hierarchical.evaluation_path(), EvaluationPath::Hierarchical);
    }

    #[test]
    fn test_ordered_ignores_forward_parent() {
        let mut manager = BoneManager::new();
        manager.add_bone(Bone::new(0, "a".into(), 1, Mat4::from_translation(Vec3::X)));
        manager.add_bone(Bone::new(1, "b".into(), -1, Mat4::from_translation(Vec3::Y)));
        manager.prepare();
        assert!(manager.global_bind_transforms()[0].abs_diff_eq(Mat4::from_translation(Vec3::X), 1e-6));
    }
}
