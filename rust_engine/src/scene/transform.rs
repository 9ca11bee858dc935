//! 对象局部变换

use glam::{Mat4, Vec2, Vec3};

use super::json::{ScriptableValue, SceneObjectDecl};

/// 把空白分隔的数字串解析到 `N` 个分量，缺失或无法解析的分量取默认值
pub fn parse_components<const N: usize>(text: Option<&str>, defaults: [f32; N]) -> [f32; N] {
    let mut out = defaults;
    if let Some(text) = text {
        for (slot, token) in out.iter_mut().zip(text.split_whitespace()) {
            if let Ok(v) = token.parse::<f32>() {
                *slot = v;
            }
        }
    }
    out
}

fn field_text(value: &Option<ScriptableValue>) -> Option<String> {
    value.as_ref().and_then(ScriptableValue::as_text)
}

/// 局部变换；旋转为弧度
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub size: Vec2,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            size: Vec2::new(100.0, 100.0),
            scale: Vec3::ONE,
        }
    }
}

impl LocalTransform {
    pub fn from_decl(decl: &SceneObjectDecl) -> Self {
        let origin = parse_components(field_text(&decl.origin).as_deref(), [0.0; 3]);
        let size = parse_components(field_text(&decl.size).as_deref(), [100.0; 2]);
        let scale = parse_components(field_text(&decl.scale).as_deref(), [1.0; 3]);
        let angles = parse_components(field_text(&decl.angles).as_deref(), [0.0; 3]);

        Self {
            position: Vec3::from_array(origin),
            rotation: Vec3::from_array(angles.map(f32::to_radians)),
            size: Vec2::from_array(size),
            scale: Vec3::from_array(scale),
        }
    }

    /// `T * Rx * Ry * Rz`
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    /// 精灵的几何缩放：`size * scale`，Z 为 1
    pub fn sprite_scale(&self) -> Vec3 {
        Vec3::new(self.size.x * self.scale.x, self.size.y * self.scale.y, 1.0)
    }

    /// 网格自带尺寸的几何缩放：像素坐标网格只用 `scale`
    pub fn mesh_scale(&self, pixel_coords: bool) -> Vec3 {
        if pixel_coords {
            self.scale
        } else {
            Vec3::new(self.size.x * self.scale.x, self.size.y * self.scale.y, self.scale.z)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_fields() {
        let decl: SceneObjectDecl = serde_json::from_str(r#"{"origin": "10 20", "size": "50 80"}"#).unwrap();
        let t = LocalTransform::from_decl(&decl);
        assert_eq!(t.position, Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(t.size, Vec2::new(50.0, 80.0));
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation, Vec3::ZERO);
    }

    #[test]
    fn test_bad_components_fall_back() {
        assert_eq!(parse_components(Some("3 abc 7 9"), [1.0, 2.0, 3.0]), [3.0, 2.0, 7.0]);
        assert_eq!(parse_components(None, [100.0, 100.0]), [100.0, 100.0]);
        assert_eq!(parse_components(Some(""), [0.0]), [0.0]);
    }

    #[test]
    fn test_angles_to_radians() {
        let decl: SceneObjectDecl = serde_json::from_str(r#"{"angles": "0 0 90"}"#).unwrap();
        let t = LocalTransform::from_decl(&decl);
        assert!((t.rotation.z - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_geometry_scales() {
        let t = LocalTransform {
            scale: Vec3::new(2.0, 3.0, 4.0),
            size: Vec2::new(10.0, 20.0),
            ..Default::default()
        };
        assert_eq!(t.sprite_scale(), Vec3::new(20.0, 60.0, 1.0));
        assert_eq!(t.mesh_scale(true), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(t.mesh_scale(false), Vec3::new(20.0, 60.0, 4.0));
    }
}
