//! 纹理路径解析

use std::path::{Path, PathBuf};

use crate::config::get_config;
use crate::{Result, WpError};

/// 在 `<base>/materials/` 下查找纹理文件
///
/// 对每个扩展名依次尝试声明路径和仅文件名两种形式。
pub fn resolve_texture_path(base: &Path, raw: &str) -> Result<PathBuf> {
    let config = get_config();
    let materials = base.join(&config.materials_dir);
    let basename = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    for ext in &config.texture_extensions {
        let literal = materials.join(format!("{}.{}", raw, ext));
        if literal.is_file() {
            return Ok(literal);
        }
        let short = materials.join(format!("{}.{}", basename, ext));
        if short.is_file() {
            return Ok(short);
        }
    }
    Err(WpError::AssetMissing(format!("纹理 {} (位于 {})", raw, materials.display())))
}
