//! Puppet：OBJ 网格 + JSON 骨架的骨骼动画剪纸

mod data;
mod layers;
mod obj_import;

pub use data::{
    PuppetAnimation, PuppetBone, PuppetData, PuppetInfo, PuppetKeyframe, PuppetTrack, SkinningEntry,
};
pub use layers::{
    blink_bones, classify_layers, dominant_bone, dominant_bones, LayeredIndices, MeshLayer, StencilMode,
    STENCIL_REFERENCE,
};
pub use obj_import::{parse_obj, ObjMesh};

use std::path::Path;

use crate::config::get_config;
use crate::skeleton::BoneManager;
use crate::{Result, WpError};

/// 加载完成的 Puppet
pub struct Puppet {
    pub material_file: Option<String>,
    pub mesh: ObjMesh,
    pub layers: LayeredIndices,
    pub skeleton: BoneManager,
    /// 网格使用像素坐标（包围盒宽度超过阈值）
    pub pixel_coords: bool,
}

impl Puppet {
    /// 由元数据和 OBJ 文本构建
    pub fn build(data: &PuppetData, obj_text: &str) -> Self {
        let mesh = parse_obj(obj_text, &data.skin_table());
        let skeleton = data.build_skeleton();
        let layers = classify_layers(&mesh.indices, &mesh.triangle_bones, skeleton.bones(), skeleton.clips());
        let pixel_coords = mesh.bounding_width > get_config().pixel_scale_width;

        log::debug!(
            "Puppet 构建完成: {} 顶点, {} 骨骼, {} 动画, 像素坐标 {}",
            mesh.vertices.len(),
            skeleton.bone_count(),
            skeleton.clips().len(),
            pixel_coords
        );

        Self {
            material_file: data.info.material_file.clone(),
            mesh,
            layers,
            skeleton,
            pixel_coords,
        }
    }

    /// 从 `*_puppet_data.json` 和 `*_puppet.obj` 加载
    pub fn load(data_path: &Path, obj_path: &Path) -> Result<Self> {
        let data = PuppetData::load(data_path)?;
        if !obj_path.is_file() {
            return Err(WpError::AssetMissing(obj_path.display().to_string()));
        }
        let obj_text = std::fs::read_to_string(obj_path)?;
        Ok(Self::build(&data, &obj_text))
    }
}
