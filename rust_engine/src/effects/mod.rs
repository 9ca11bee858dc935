//! 特效参数解析
//!
//! 把对象声明的特效列表转换成着色器使用的定长参数记录和辅助纹理列表。

mod decl;
mod resolver;

pub use decl::{ConstantTable, EffectDecl, EffectPassDecl, ShaderValue, EDITOR_PREFIX};
pub use resolver::{resolve_effects, ResolvedEffects};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

/// 无遮罩纹理
pub const NO_MASK: i32 = -1;

/// 特效类型（数值与着色器一致）
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectType {
    None = 0,
    Scroll = 1,
    WaterWave = 2,
    Shake = 3,
    FoliageSway = 4,
    WaterRipple = 5,
    Pulse = 6,
    Tint = 7,
}

impl EffectType {
    /// 按文件路径子串识别（不区分大小写），无法识别返回 None
    pub fn detect(file: &str) -> Option<Self> {
        let file = file.to_lowercase();
        // waterwaves 先于 scroll 等短词匹配
        const PATTERNS: [(&str, EffectType); 7] = [
            ("waterwaves", EffectType::WaterWave),
            ("shake", EffectType::Shake),
            ("scroll", EffectType::Scroll),
            ("foliagesway", EffectType::FoliageSway),
            ("waterripple", EffectType::WaterRipple),
            ("pulse", EffectType::Pulse),
            ("tint", EffectType::Tint),
        ];
        PATTERNS
            .iter()
            .find(|(pattern, _)| file.contains(pattern))
            .map(|&(_, kind)| kind)
    }
}

/// 特效参数（GPU 布局，64 字节）
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct EffectParams {
    pub effect_type: i32,
    /// 指向对象辅助纹理列表，-1 表示没有
    pub mask_index: i32,
    pub speed: f32,
    pub scale: f32,
    pub strength: f32,
    pub exponent: f32,
    pub direction: [f32; 2],
    pub bounds: [f32; 2],
    pub friction: [f32; 2],
    pub color: [f32; 4],
}

impl EffectParams {
    /// 各类型共用的初始值
    pub fn new(kind: EffectType) -> Self {
        Self {
            effect_type: kind as i32,
            mask_index: NO_MASK,
            speed: 1.0,
            scale: 1.0,
            strength: 0.1,
            exponent: 1.0,
            direction: [0.0; 2],
            bounds: [0.0; 2],
            friction: [0.0; 2],
            color: [1.0; 4],
        }
    }

    pub fn kind(&self) -> EffectType {
        match self.effect_type {
            1 => EffectType::Scroll,
            2 => EffectType::WaterWave,
            3 => EffectType::Shake,
            4 => EffectType::FoliageSway,
            5 => EffectType::WaterRipple,
            6 => EffectType::Pulse,
            7 => EffectType::Tint,
            _ => EffectType::None,
        }
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_array(self.direction)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::new(EffectType::None)
    }
}
