//! 场景节点

use glam::{Mat4, Vec3};

use crate::animation::AnimationState;
use crate::effects::ResolvedEffects;
use crate::model::SkinnedVertex;
use crate::puppet::LayeredIndices;
use crate::skeleton::BoneManager;
use crate::texture::TextureHandle;

use super::LocalTransform;

/// 骨骼动画网格（Puppet 或 MDL 模型）
pub struct AnimatedMesh {
    pub vertices: Vec<SkinnedVertex>,
    pub layers: LayeredIndices,
    pub skeleton: BoneManager,
    pub state: AnimationState,
    /// 网格使用像素坐标
    pub pixel_coords: bool,
}

impl AnimatedMesh {
    pub fn new(
        vertices: Vec<SkinnedVertex>,
        layers: LayeredIndices,
        skeleton: BoneManager,
        pixel_coords: bool,
    ) -> Self {
        let clip_id = skeleton.clips().first().map(|c| c.id);
        Self {
            vertices,
            layers,
            skeleton,
            state: AnimationState::new(clip_id),
            pixel_coords,
        }
    }

    /// 求值当前片段在 `time` 秒的姿态，只写本节点的蒙皮缓冲区
    pub fn advance(&mut self, time: f64, label: &str) {
        let Some(clip_id) = self.state.clip_id else {
            return;
        };
        if let Some(clip) = self.skeleton.clip(clip_id) {
            let cycle = clip.cycle(time);
            if let Some(cycle) = self.state.observe_cycle(cycle) {
                log::info!("对象 {} 动画循环完成, 第 {} 轮", label, cycle);
            }
        }
        self.skeleton.evaluate(clip_id, time);
    }

    pub fn skinning_matrices(&self) -> &[Mat4] {
        self.skeleton.skinning_matrices()
    }
}

/// 节点类型
pub enum NodeKind {
    /// 单纹理四边形
    Sprite,
    /// OBJ + JSON 骨架
    Puppet(AnimatedMesh),
    /// MDL 二进制模型
    Model(AnimatedMesh),
}

impl NodeKind {
    pub fn animated(&self) -> Option<&AnimatedMesh> {
        match self {
            NodeKind::Sprite => None,
            NodeKind::Puppet(mesh) | NodeKind::Model(mesh) => Some(mesh),
        }
    }

    pub fn animated_mut(&mut self) -> Option<&mut AnimatedMesh> {
        match self {
            NodeKind::Sprite => None,
            NodeKind::Puppet(mesh) | NodeKind::Model(mesh) => Some(mesh),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Sprite => "sprite",
            NodeKind::Puppet(_) => "puppet",
            NodeKind::Model(_) => "model",
        }
    }
}

/// 场景节点
///
/// 父节点以场景图中的下标引用，节点本身不持有父节点。
pub struct SceneNode {
    pub id: Option<i64>,
    pub name: String,
    pub parent_id: Option<i64>,
    pub parent: Option<usize>,
    pub transform: LocalTransform,
    pub texture: TextureHandle,
    pub effects: ResolvedEffects,
    pub kind: NodeKind,
    pub alpha: f32,
}

impl SceneNode {
    pub fn new(name: String, transform: LocalTransform, texture: TextureHandle, kind: NodeKind) -> Self {
        Self {
            id: None,
            name,
            parent_id: None,
            parent: None,
            transform,
            texture,
            effects: ResolvedEffects::default(),
            kind,
            alpha: 1.0,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// 应用世界变换之前的几何缩放
    pub fn geometry_scale(&self) -> Vec3 {
        match self.kind.animated() {
            Some(mesh) => self.transform.mesh_scale(mesh.pixel_coords),
            None => self.transform.sprite_scale(),
        }
    }

    pub fn is_animated(&self) -> bool {
        self.kind.animated().is_some()
    }
}
