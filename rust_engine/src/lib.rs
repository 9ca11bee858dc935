//! WP Engine - Rust 实现的动态壁纸场景运行时
//!
//! 提供场景在 CPU 侧的全部准备工作：
//! - MDL 二进制蒙皮模型解析
//! - 骨骼动画（逆绑定矩阵、逐帧插值、层级合成）
//! - Puppet OBJ 网格导入和遮罩分层
//! - 场景图构建和父子关系解析
//! - 特效参数解析
//!
//! GPU 管线、着色器和窗口由外部渲染器负责。

pub mod animation;
pub mod config;
pub mod effects;
pub mod model;
pub mod puppet;
pub mod scene;
pub mod skeleton;
pub mod skinning;
pub mod texture;

pub use animation::{AnimationClip, AnimationState, BoneKeyframe};
pub use config::{get_config, EngineConfig};
pub use effects::{resolve_effects, EffectParams, EffectType, ResolvedEffects};
pub use model::{decode_mdl, load_mdl, MaterialDef, MdlFormat, MdlMesh, MdlModel, SkinnedVertex, SubMesh};
pub use puppet::{classify_layers, parse_obj, LayeredIndices, MeshLayer, ObjMesh, Puppet, PuppetData, StencilMode};
pub use scene::{DrawItem, GlobalUniforms, NodeKind, ObjectUniforms, SceneGraph, SceneLoader, SceneNode, SceneStage};
pub use skeleton::{Bone, BoneManager, BoneTag};
pub use skinning::compute_skinning;
pub use texture::{resolve_texture_path, ImageTextureLoader, Texture, TextureHandle, TextureLoader, TextureOptions};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Asset missing: {0}")]
    AssetMissing(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Texture error: {0}")]
    Texture(String),
}

impl From<serde_json::Error> for WpError {
    fn from(e: serde_json::Error) -> Self {
        WpError::Schema(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WpError>;
