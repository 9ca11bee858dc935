//! 纹理加载和管理

mod loader;
mod path;

pub use loader::{decode_texture, ImageTextureLoader};
pub use path::resolve_texture_path;

use std::path::Path;

use crate::Result;

/// 纹理原点
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureOrigin {
    /// 第一行像素对应纹理底部（解码后垂直翻转）
    #[default]
    BottomLeft,
    TopLeft,
}

/// 采样时的颜色空间
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    Srgb,
    /// 遮罩、法线等数据纹理
    Linear,
}

/// 加载选项
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureOptions {
    pub origin: TextureOrigin,
    pub color_space: ColorSpace,
}

impl TextureOptions {
    /// 主纹理：左下原点，sRGB
    pub fn color() -> Self {
        Self::default()
    }

    /// 辅助数据纹理：左下原点，线性
    pub fn data() -> Self {
        Self {
            origin: TextureOrigin::BottomLeft,
            color_space: ColorSpace::Linear,
        }
    }
}

/// 纹理句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// 纹理数据（RGBA8）
#[derive(Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub has_alpha: bool,
    pub color_space: ColorSpace,
}

impl Texture {
    pub fn new(width: u32, height: u32, data: Vec<u8>, has_alpha: bool, color_space: ColorSpace) -> Self {
        Self { width, height, data, has_alpha, color_space }
    }
}

/// 图像加载协作者
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path, options: TextureOptions) -> Result<TextureHandle>;
}
