//! 基于 image crate 的纹理加载

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};

use crate::{Result, WpError};

use super::{Texture, TextureHandle, TextureLoader, TextureOptions, TextureOrigin};

/// 从内存解码纹理，统一输出 RGBA8
pub fn decode_texture(data: &[u8], options: TextureOptions) -> Result<Texture> {
    let img = image::load_from_memory(data)
        .map_err(|e| WpError::Texture(format!("Failed to decode texture: {}", e)))?;
    Ok(to_texture(img, options))
}

fn to_texture(img: DynamicImage, options: TextureOptions) -> Texture {
    let (width, height) = img.dimensions();
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba8();
    let data = match options.origin {
        TextureOrigin::BottomLeft => image::imageops::flip_vertical(&rgba).into_raw(),
        TextureOrigin::TopLeft => rgba.into_raw(),
    };
    Texture::new(width, height, data, has_alpha, options.color_space)
}

/// 默认纹理加载器：解码结果按 (路径, 选项) 缓存
#[derive(Default)]
pub struct ImageTextureLoader {
    textures: Vec<Texture>,
    cache: HashMap<(PathBuf, TextureOptions), TextureHandle>,
}

impl ImageTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn register(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        handle
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load_texture(&mut self, path: &Path, options: TextureOptions) -> Result<TextureHandle> {
        let key = (path.to_path_buf(), options);
        if let Some(&handle) = self.cache.get(&key) {
            return Ok(handle);
        }
        if !path.is_file() {
            return Err(WpError::AssetMissing(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let texture = decode_texture(&bytes, options)?;
        log::debug!(
            "纹理加载: {} ({}x{}, {:?})",
            path.display(),
            texture.width,
            texture.height,
            options.color_space
        );

        let handle = self.register(texture);
        self.cache.insert(key, handle);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::ColorSpace;
    use image::{Rgba, RgbaImage};

    fn two_row_image() -> RgbaImage {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img
    }

    #[test]
    fn test_bottom_left_flips_rows() {
        let flipped = to_texture(DynamicImage::ImageRgba8(two_row_image()), TextureOptions::color());
        assert_eq!(&flipped.data[0..4], &[0, 0, 255, 255]);

        let kept = to_texture(
            DynamicImage::ImageRgba8(two_row_image()),
            TextureOptions {
                origin: TextureOrigin::TopLeft,
                color_space: ColorSpace::Linear,
            },
        );
        assert_eq!(&kept.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(kept.color_space, ColorSpace::Linear);
        assert!(kept.has_alpha);
    }

    #[test]
    fn test_cache_by_path_and_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        two_row_image().save(&path).unwrap();

        let mut loader = ImageTextureLoader::new();
        let a = loader.load_texture(&path, TextureOptions::color()).unwrap();
        let b = loader.load_texture(&path, TextureOptions::color()).unwrap();
        let c = loader.load_texture(&path, TextureOptions::data()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(loader.len(), 2);
        assert_eq!(loader.get(a).map(|t| t.width), Some(1));
    }

    #[test]
    fn test_corrupt_file_is_texture_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut loader = ImageTextureLoader::new();
        let result = loader.load_texture(&path, TextureOptions::color());
        assert!(matches!(result, Err(WpError::Texture(_))));
        assert!(loader.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let mut loader = ImageTextureLoader::new();
        let result = loader.load_texture(Path::new("/no/such/texture.png"), TextureOptions::color());
        assert!(matches!(result, Err(WpError::AssetMissing(_))));
    }
}
