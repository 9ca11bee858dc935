//! 场景舞台：加载、发布、逐帧推进

use std::path::{Path, PathBuf};

use crate::texture::{ImageTextureLoader, TextureLoader};
use crate::Result;

use super::frame::{DrawItem, GlobalUniforms};
use super::{SceneGraph, SceneLoader};

/// 持有已发布的场景图及其纹理
///
/// 每次加载使用新的纹理加载器，场景图和纹理在成功后一起替换，
/// 失败时两者都保持原样。
pub struct SceneStage<L: TextureLoader + Default = ImageTextureLoader> {
    textures: L,
    graph: SceneGraph,
    folder: Option<PathBuf>,
}

impl<L: TextureLoader + Default> Default for SceneStage<L> {
    fn default() -> Self {
        Self {
            textures: L::default(),
            graph: SceneGraph::default(),
            folder: None,
        }
    }
}

impl SceneStage<ImageTextureLoader> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: TextureLoader + Default> SceneStage<L> {
    /// 加载场景目录；失败时保留原场景图和纹理并返回错误
    pub fn load(&mut self, folder: impl AsRef<Path>) -> Result<()> {
        let folder = folder.as_ref();
        let mut textures = L::default();
        let built = SceneLoader::new(folder, &mut textures).load();
        match built {
            Ok(graph) => {
                self.graph = graph;
                self.textures = textures;
                self.folder = Some(folder.to_path_buf());
                Ok(())
            }
            Err(e) => {
                log::error!("场景 {} 加载失败: {}", folder.display(), e);
                Err(e)
            }
        }
    }

    pub fn advance(&mut self, time: f64) {
        self.graph.advance(time);
    }

    /// 推进到 `time` 并返回本帧绘制数据
    pub fn frame(&mut self, time: f64) -> (GlobalUniforms, Vec<DrawItem<'_>>) {
        self.graph.advance(time);
        let globals = self.graph.global_uniforms(time as f32);
        (globals, self.graph.draw_list())
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn textures(&self) -> &L {
        &self.textures
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }
}
