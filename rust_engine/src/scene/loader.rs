//! 场景加载：项目描述 → 场景文件 → 节点

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::get_config;
use crate::effects::{resolve_effects, EffectDecl, ResolvedEffects};
use crate::model::{load_mdl, MaterialDef};
use crate::puppet::{classify_layers, dominant_bones, Puppet};
use crate::texture::{resolve_texture_path, TextureHandle, TextureLoader, TextureOptions};
use crate::{Result, WpError};

use super::json::{read_json, ModelDecl, ProjectDecl, SceneDoc, SceneObjectDecl};
use super::{AnimatedMesh, LocalTransform, NodeKind, SceneGraph, SceneNode};

const PUPPET_DATA_SUFFIX: &str = "_puppet_data.json";
const PUPPET_MESH_SUFFIX: &str = "_puppet.obj";

/// 场景加载器
///
/// 每个对象独立构建：单个对象失败只会让它从场景中缺席。
pub struct SceneLoader<'a> {
    base: PathBuf,
    textures: &'a mut dyn TextureLoader,
}

impl<'a> SceneLoader<'a> {
    pub fn new(base: impl Into<PathBuf>, textures: &'a mut dyn TextureLoader) -> Self {
        Self {
            base: base.into(),
            textures,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 读取项目描述和场景文件并构建场景图
    pub fn load(&mut self) -> Result<SceneGraph> {
        let config = get_config();
        let project: ProjectDecl = read_json(&self.base.join(&config.project_file))?;
        let doc: SceneDoc = read_json(&self.base.join(&project.file))?;
        log::info!("加载场景: {} ({})", project.file, project.title.as_deref().unwrap_or("untitled"));
        Ok(self.build_graph(&doc))
    }

    /// 两遍构建：先实例化所有可见对象，再连接父节点
    pub fn build_graph(&mut self, doc: &SceneDoc) -> SceneGraph {
        let projection = doc.projection().unwrap_or(get_config().default_projection);
        let mut graph = SceneGraph::new(projection);

        for (index, value) in doc.objects.iter().enumerate() {
            let decl = match SceneObjectDecl::deserialize(value) {
                Ok(decl) => decl,
                Err(e) => {
                    log::warn!("第 {} 个对象格式错误, 已跳过: {}", index, e);
                    continue;
                }
            };
            if !decl.is_visible() {
                log::debug!("对象 {} 不可见, 跳过", decl.display_name());
                continue;
            }
            match self.build_node(&decl) {
                Ok(Some(node)) => {
                    graph.push(node);
                }
                Ok(None) => log::debug!("对象 {} 没有图像, 跳过", decl.display_name()),
                Err(e) => log::warn!("对象 {} 创建失败: {}", decl.display_name(), e),
            }
        }

        graph.link_parents();
        log::info!("场景加载完成, 对象数: {}", graph.len());
        graph
    }

    /// 构建单个节点；没有图像引用时返回 None
    pub fn build_node(&mut self, decl: &SceneObjectDecl) -> Result<Option<SceneNode>> {
        let Some(image) = decl.image.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let asset = self.base.join(image);
        let (data_path, mesh_path) = puppet_companions(&asset);

        let (texture, kind) = if data_path.is_file() {
            self.build_puppet(&data_path, &mesh_path)?
        } else if has_extension(&asset, "mdl") {
            self.build_model(&asset)?
        } else {
            self.build_sprite(&asset)?
        };

        let transform = LocalTransform::from_decl(decl);
        if get_config().debug_log {
            log::debug!("对象 {} ({}) 变换: {:?}", decl.display_name(), kind.label(), transform);
        }

        let mut node = SceneNode::new(decl.display_name(), transform, texture, kind);
        node.id = decl.id;
        node.parent_id = decl.parent;
        node.effects = self.resolve_effects(&decl.effects);
        Ok(Some(node))
    }

    fn load_texture(&mut self, raw: &str, options: TextureOptions) -> Result<TextureHandle> {
        let path = resolve_texture_path(&self.base, raw)?;
        self.textures.load_texture(&path, options)
    }

    /// 材质第一个 pass 的第一个纹理
    fn load_material_texture(&mut self, material: &str) -> Result<TextureHandle> {
        let def = MaterialDef::load(self.base.join(material))?;
        let texture = def
            .first_texture()
            .ok_or_else(|| WpError::Schema(format!("材质 {} 没有纹理", material)))?
            .to_string();
        self.load_texture(&texture, TextureOptions::color())
    }

    fn build_sprite(&mut self, asset: &Path) -> Result<(TextureHandle, NodeKind)> {
        let model: ModelDecl = read_json(asset)?;
        let material = model
            .material
            .ok_or_else(|| WpError::Schema(format!("模型 {} 没有材质", asset.display())))?;
        Ok((self.load_material_texture(&material)?, NodeKind::Sprite))
    }

    fn build_puppet(&mut self, data_path: &Path, mesh_path: &Path) -> Result<(TextureHandle, NodeKind)> {
        let puppet = Puppet::load(data_path, mesh_path)?;
        let material = puppet
            .material_file
            .clone()
            .ok_or_else(|| WpError::Schema(format!("{} 没有 material_file", data_path.display())))?;
        let texture = self.load_material_texture(&material)?;
        let mesh = AnimatedMesh::new(puppet.mesh.vertices, puppet.layers, puppet.skeleton, puppet.pixel_coords);
        Ok((texture, NodeKind::Puppet(mesh)))
    }

    fn build_model(&mut self, asset: &Path) -> Result<(TextureHandle, NodeKind)> {
        let model = load_mdl(asset)?;
        let texture = self.load_material_texture(&model.material_path)?;

        let indices: Vec<u32> = model.mesh.indices.iter().map(|&i| i as u32).collect();
        let triangle_bones = dominant_bones(&model.mesh.vertices, &indices);
        let layers = classify_layers(&indices, &triangle_bones, model.skeleton.bones(), model.skeleton.clips());
        let pixel_coords = bounding_width(&model.mesh.vertices) > get_config().pixel_scale_width;

        let mesh = AnimatedMesh::new(model.mesh.vertices, layers, model.skeleton, pixel_coords);
        Ok((texture, NodeKind::Model(mesh)))
    }

    fn resolve_effects(&mut self, effects: &[EffectDecl]) -> ResolvedEffects {
        let base = &self.base;
        let textures = &mut *self.textures;
        resolve_effects(effects, |name| {
            let loaded = resolve_texture_path(base, name)
                .and_then(|path| textures.load_texture(&path, TextureOptions::data()));
            match loaded {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::warn!("特效纹理 {} 加载失败: {}", name, e);
                    None
                }
            }
        })
    }
}

/// `<dir>/<stem>_puppet_data.json` 和 `<dir>/<stem>_puppet.obj`
fn puppet_companions(asset: &Path) -> (PathBuf, PathBuf) {
    let dir = asset.parent().unwrap_or_else(|| Path::new(""));
    let stem = asset.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    (
        dir.join(format!("{}{}", stem, PUPPET_DATA_SUFFIX)),
        dir.join(format!("{}{}", stem, PUPPET_MESH_SUFFIX)),
    )
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn bounding_width(vertices: &[crate::model::SkinnedVertex]) -> f32 {
    let (min, max) = vertices
        .iter()
        .map(|v| v.position[0])
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    if vertices.is_empty() {
        0.0
    } else {
        max - min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct CountingLoader(u32);

    impl TextureLoader for CountingLoader {
        fn load_texture(&mut self, _path: &Path, _options: TextureOptions) -> Result<TextureHandle> {
            self.0 += 1;
            Ok(TextureHandle(self.0))
        }
    }

    #[test]
    fn test_puppet_companions() {
        let (data, mesh) = puppet_companions(Path::new("/scene/models/girl.json"));
        assert_eq!(data, Path::new("/scene/models/girl_puppet_data.json"));
        assert_eq!(mesh, Path::new("/scene/models/girl_puppet.obj"));
    }

    #[test]
    fn test_extension_check() {
        assert!(has_extension(Path::new("a/b.MDL"), "mdl"));
        assert!(!has_extension(Path::new("a/b.json"), "mdl"));
        assert!(!has_extension(Path::new("a/b"), "mdl"));
    }

    #[test]
    fn test_mdl_object_becomes_model_node() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("models")).unwrap();
        fs::create_dir_all(base.join("materials")).unwrap();
        fs::write(base.join("models/body.mdl"), crate::model::sample_mdl(3.0)).unwrap();
        fs::write(base.join("materials/body.json"), r#"{"passes":[{"textures":["body"]}]}"#).unwrap();
        fs::write(base.join("materials/body.png"), b"png").unwrap();

        let doc: SceneDoc =
            serde_json::from_str(r#"{"objects":[{"id":1,"name":"body","image":"models/body.mdl"}]}"#).unwrap();
        let mut textures = CountingLoader(0);
        let mut graph = SceneLoader::new(base, &mut textures).build_graph(&doc);

        assert_eq!(graph.len(), 1);
        let node = graph.node(0).unwrap();
        assert!(matches!(node.kind, NodeKind::Model(_)));
        assert_eq!(node.texture, TextureHandle(1));
        let mesh = node.kind.animated().unwrap();
        assert!(!mesh.pixel_coords);
        assert!(!mesh.layers.has_masking());
        assert_eq!(mesh.layers.standard.index_count, 3);
        assert_eq!(mesh.state.clip_id, Some(5));

        graph.advance(0.0);
        let first = graph.node(0).unwrap().kind.animated().unwrap().skinning_matrices().to_vec();
        graph.advance(1.0 / 30.0);
        let second = graph.node(0).unwrap().kind.animated().unwrap().skinning_matrices().to_vec();
        assert!(!first[1].abs_diff_eq(second[1], 1e-4));
    }

    #[test]
    fn test_missing_material_omits_object() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::write(base.join("rock.json"), r#"{"material":"materials/rock.json"}"#).unwrap();

        let doc: SceneDoc = serde_json::from_str(
            r#"{"objects":[{"id":1,"image":"rock.json"},{"id":2,"name":"light"},{"id":3,"image":"rock.json","visible":false}]}"#,
        )
        .unwrap();
        let mut textures = CountingLoader(0);
        let graph = SceneLoader::new(base, &mut textures).build_graph(&doc);
        assert!(graph.is_empty());
        assert_eq!(textures.0, 0);
    }
}
