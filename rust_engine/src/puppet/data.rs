//! Puppet 元数据（`*_puppet_data.json`）

use std::collections::HashMap;
use std::path::Path;

use glam::{Mat4, Vec3};
use serde::Deserialize;

use crate::animation::{AnimationClip, BoneKeyframe};
use crate::config::get_config;
use crate::model::clamp_joint;
use crate::scene::null_as_default;
use crate::skeleton::{Bone, BoneManager, BoneTag};
use crate::{Result, WpError};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PuppetInfo {
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub material_file: Option<String>,
}

/// 单个顶点的蒙皮数据，按位置索引对应
#[derive(Clone, Debug, Deserialize)]
pub struct SkinningEntry {
    pub vertex_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bone_indices: Vec<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weights: Vec<f32>,
}

impl SkinningEntry {
    /// 补零到 4 个分量，骨骼索引截断到上限
    pub fn padded(&self, max_bones: usize) -> ([u16; 4], [f32; 4]) {
        let mut joints = [0u16; 4];
        let mut weights = [0.0f32; 4];
        for (slot, &index) in joints.iter_mut().zip(&self.bone_indices) {
            *slot = clamp_joint(index, max_bones);
        }
        for (slot, &weight) in weights.iter_mut().zip(&self.weights) {
            *slot = weight;
        }
        (joints, weights)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PuppetBone {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// 可能写成无符号的 0xFFFFFFFF
    #[serde(default = "root_parent")]
    pub parent: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matrix: Vec<f32>,
    #[serde(default)]
    pub render_tag: Option<String>,
}

fn root_parent() -> i64 {
    -1
}

impl PuppetBone {
    /// 列主序绑定矩阵；不是 16 个分量时为单位矩阵
    pub fn bind_matrix(&self) -> Mat4 {
        match <&[f32; 16]>::try_from(self.matrix.as_slice()) {
            Ok(cols) => Mat4::from_cols_array(cols),
            Err(_) => Mat4::IDENTITY,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PuppetKeyframe {
    #[serde(default, deserialize_with = "null_as_default")]
    pub p: Vec<f32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r: Vec<f32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub s: Vec<f32>,
}

fn vec3_or(values: &[f32], fallback: Vec3) -> Vec3 {
    let mut out = fallback;
    for (i, &v) in values.iter().take(3).enumerate() {
        out[i] = v;
    }
    out
}

impl PuppetKeyframe {
    pub fn to_keyframe(&self) -> BoneKeyframe {
        BoneKeyframe::new(
            vec3_or(&self.p, Vec3::ZERO),
            vec3_or(&self.r, Vec3::ZERO),
            vec3_or(&self.s, Vec3::ONE),
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PuppetTrack {
    pub track_id: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frames: Vec<PuppetKeyframe>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PuppetAnimation {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fps: f32,
    #[serde(default)]
    pub length: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracks: Vec<PuppetTrack>,
}

impl PuppetAnimation {
    pub fn to_clip(&self) -> AnimationClip {
        let tracks: HashMap<i32, Vec<BoneKeyframe>> = self
            .tracks
            .iter()
            .map(|t| (t.track_id, t.frames.iter().map(PuppetKeyframe::to_keyframe).collect()))
            .collect();
        AnimationClip::new(self.id, self.name.clone(), self.fps, self.length, tracks)
    }
}

/// Puppet 元数据：骨架、动画、蒙皮表
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PuppetData {
    #[serde(default)]
    pub info: PuppetInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skinning: Vec<SkinningEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skeleton: Vec<PuppetBone>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub animations: Vec<PuppetAnimation>,
}

impl PuppetData {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(WpError::AssetMissing(path.display().to_string()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// 位置索引 -> (骨骼索引, 权重)
    pub fn skin_table(&self) -> HashMap<i64, ([u16; 4], [f32; 4])> {
        let max_bones = get_config().max_bones;
        self.skinning
            .iter()
            .map(|entry| (entry.vertex_id, entry.padded(max_bones)))
            .collect()
    }

    /// 构建骨骼管理器（递归求值路径）
    pub fn build_skeleton(&self) -> BoneManager {
        let count = self.skeleton.len();
        let mut manager = BoneManager::new();
        for pb in &self.skeleton {
            let parent = if (0..count as i64).contains(&pb.parent) {
                pb.parent as i32
            } else {
                -1
            };
            let mut bone = Bone::new(pb.id, pb.name.clone(), parent, pb.bind_matrix());
            bone.tag = pb.render_tag.as_deref().and_then(BoneTag::parse);
            manager.add_bone(bone);
        }
        for animation in &self.animations {
            manager.add_clip(animation.to_clip());
        }
        manager.prepare_hierarchical();
        manager
    }
}
