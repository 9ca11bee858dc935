//! 场景：JSON 描述 → 节点 → 场景图 → 绘制列表

mod frame;
mod graph;
mod json;
mod loader;
mod node;
mod stage;
mod transform;

pub use frame::{DrawGeometry, DrawItem, GlobalUniforms, LayerPass, ObjectUniforms, QUAD_INDICES, QUAD_VERTICES};
pub use graph::SceneGraph;
pub use json::{
    read_json, GeneralSettings, ModelDecl, ProjectDecl, ProjectionSize, SceneDoc, SceneObjectDecl,
    ScriptableValue, VisibleFlag,
};
pub(crate) use json::null_as_default;
pub use loader::SceneLoader;
pub use node::{AnimatedMesh, NodeKind, SceneNode};
pub use stage::SceneStage;
pub use transform::{parse_components, LocalTransform};
