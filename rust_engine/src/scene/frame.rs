//! 每帧绘制列表和 uniform 数据
//!
//! 只做 CPU 侧整理，交给外部渲染器直接上传。

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::config::get_config;
use crate::effects::EffectParams;
use crate::model::{SkinnedVertex, SubMesh};
use crate::puppet::{MeshLayer, StencilMode};
use crate::texture::TextureHandle;

use super::{NodeKind, SceneGraph};

/// 单位四边形顶点：位置 (x, y, z) + UV
pub const QUAD_VERTICES: [[f32; 5]; 4] = [
    [-0.5, -0.5, 0.0, 0.0, 0.0],
    [0.5, -0.5, 0.0, 1.0, 0.0],
    [-0.5, 0.5, 0.0, 0.0, 1.0],
    [0.5, 0.5, 0.0, 1.0, 1.0],
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

const NEAR_PLANE: f32 = -5000.0;
const FAR_PLANE: f32 = 5000.0;

/// 逐对象 uniform
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub alpha: f32,
    pub _pad: [f32; 3],
    pub color: [f32; 4],
    pub _pad2: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(model: Mat4, alpha: f32, color: Vec4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            alpha,
            _pad: [0.0; 3],
            color: color.to_array(),
            _pad2: [0.0; 4],
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// 全局 uniform
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub time: f32,
    pub _pad: [f32; 3],
}

impl GlobalUniforms {
    /// 左下角为原点的正交投影
    pub fn orthographic(width: f32, height: f32, time: f32) -> Self {
        let projection = Mat4::orthographic_rh_gl(0.0, width, 0.0, height, NEAR_PLANE, FAR_PLANE);
        Self {
            projection: projection.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            time,
            _pad: [0.0; 3],
        }
    }
}

/// 骨骼网格的一个绘制 pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerPass {
    pub layer: MeshLayer,
    pub range: SubMesh,
    pub stencil: StencilMode,
}

/// 节点几何
pub enum DrawGeometry<'a> {
    /// 单位四边形（见 [`QUAD_VERTICES`]）
    Quad,
    Skinned {
        vertices: &'a [SkinnedVertex],
        indices: &'a [u32],
        skinning: &'a [Mat4],
        passes: Vec<LayerPass>,
    },
}

/// 一个节点的绘制数据
pub struct DrawItem<'a> {
    pub node: usize,
    pub uniforms: ObjectUniforms,
    pub texture: TextureHandle,
    pub effects: &'a [EffectParams],
    pub effect_count: u32,
    /// 辅助纹理槽位，缺失的槽位由渲染器绑定占位纹理
    pub aux_textures: &'a [Option<TextureHandle>],
    pub geometry: DrawGeometry<'a>,
}

impl SceneGraph {
    /// 按注册顺序生成绘制列表
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let max_aux = get_config().max_aux_textures;
        self.nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let aux = &node.effects.textures;
                let geometry = match &node.kind {
                    NodeKind::Sprite => DrawGeometry::Quad,
                    NodeKind::Puppet(mesh) | NodeKind::Model(mesh) => DrawGeometry::Skinned {
                        vertices: &mesh.vertices,
                        indices: &mesh.layers.indices,
                        skinning: mesh.skinning_matrices(),
                        passes: mesh
                            .layers
                            .draw_ranges()
                            .map(|(layer, range)| LayerPass {
                                layer,
                                range,
                                stencil: layer.stencil(),
                            })
                            .collect(),
                    },
                };
                DrawItem {
                    node: index,
                    uniforms: ObjectUniforms::new(self.model_matrix(index), node.alpha, Vec4::ONE),
                    texture: node.texture,
                    effects: &node.effects.params,
                    effect_count: node.effects.count() as u32,
                    aux_textures: &aux[..aux.len().min(max_aux)],
                    geometry,
                }
            })
            .collect()
    }

    pub fn global_uniforms(&self, time: f32) -> GlobalUniforms {
        let (width, height) = self.projection();
        GlobalUniforms::orthographic(width, height, time)
    }
}
