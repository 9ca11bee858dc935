//! 材质描述
//!
//! 材质文件是一个 pass 列表，每个 pass 按槽位顺序列出纹理。

use std::path::Path;

use serde::Deserialize;

use crate::{Result, WpError};

/// 渲染 pass
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MaterialPass {
    /// 纹理槽位，空槽为 null
    #[serde(default, deserialize_with = "crate::scene::null_as_default")]
    pub textures: Vec<Option<String>>,
    #[serde(default)]
    pub shader: Option<String>,
}

/// 材质定义
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MaterialDef {
    #[serde(default, deserialize_with = "crate::scene::null_as_default")]
    pub passes: Vec<MaterialPass>,
}

impl MaterialDef {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 读取材质文件；文件不存在时报告 `AssetMissing`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(WpError::AssetMissing(path.display().to_string()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// 第一个 pass 的第一个纹理
    pub fn first_texture(&self) -> Option<&str> {
        self.passes
            .first()?
            .textures
            .first()?
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}
