//! MDL 二进制蒙皮模型

mod loader;
mod material;
mod reader;
mod submesh;

pub use loader::{decode_mdl, load_mdl, MdlModel};
pub use material::{MaterialDef, MaterialPass};
pub use reader::BinaryReader;
pub use submesh::SubMesh;

#[cfg(test)]
pub(crate) use loader::tests::sample_mdl;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// 蒙皮顶点（GPU 布局，48 字节）
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub _pad: f32,
    pub uv: [f32; 2],
    /// 骨骼索引，已截断到 `max_bones - 1`
    pub joints: [u16; 4],
    /// 原样保留的混合权重（不做归一化）
    pub weights: [f32; 4],
}

impl SkinnedVertex {
    pub fn new(position: Vec3, uv: Vec2, joints: [u16; 4], weights: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            _pad: 0.0,
            uv: uv.to_array(),
            joints,
            weights,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }
}

/// 把任意骨骼索引截断到蒙皮缓冲区范围内
pub fn clamp_joint(index: u32, max_bones: usize) -> u16 {
    let limit = max_bones.saturating_sub(1).min(u16::MAX as usize) as u32;
    index.min(limit) as u16
}

/// 顶点记录布局
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MdlFormat {
    /// 52 字节顶点
    Standard,
    /// 80 字节顶点（位置后带 7 个未知 u32）
    Alternate,
}

impl MdlFormat {
    pub fn vertex_stride(self) -> u32 {
        match self {
            MdlFormat::Standard => 52,
            MdlFormat::Alternate => 80,
        }
    }
}

/// 解码后的网格
#[derive(Clone, Debug, Default)]
pub struct MdlMesh {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u16>,
}

impl MdlMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
