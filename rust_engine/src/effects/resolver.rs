//! 特效解析

use glam::Vec2;

use crate::texture::TextureHandle;

use super::{ConstantTable, EffectDecl, EffectParams, EffectPassDecl, EffectType, NO_MASK};

/// 解析结果：参数按声明顺序排列，辅助纹理在对象的所有特效间共享槽位
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedEffects {
    pub params: Vec<EffectParams>,
    pub textures: Vec<Option<TextureHandle>>,
}

impl ResolvedEffects {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn count(&self) -> usize {
        self.params.len()
    }

    /// 追加单张纹理，返回其槽位
    fn push_single(&mut self, texture: Option<TextureHandle>) -> i32 {
        match texture {
            Some(handle) => {
                self.textures.push(Some(handle));
                (self.textures.len() - 1) as i32
            }
            None => NO_MASK,
        }
    }

    /// 追加一对纹理，返回第一张的槽位；两张都缺失时不占槽位
    fn push_pair(&mut self, first: Option<TextureHandle>, second: Option<TextureHandle>) -> i32 {
        if first.is_none() && second.is_none() {
            return NO_MASK;
        }
        let start = self.textures.len() as i32;
        self.textures.push(first);
        self.textures.push(second);
        start
    }
}

fn looks_like_normal(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("norm") && !lower.contains("mask")
}

fn looks_like_mask(name: &str) -> bool {
    name.to_lowercase().contains("mask")
}

/// WaterRipple 的 (遮罩, 法线) 纹理名，修正倒置的声明顺序
fn ripple_textures(pass: &EffectPassDecl) -> (Option<&str>, Option<&str>) {
    match (pass.texture(1), pass.texture(2)) {
        (Some(first), Some(second)) if looks_like_normal(first) && looks_like_mask(second) => {
            (Some(second), Some(first))
        }
        (Some(first), None) if looks_like_normal(first) => (None, Some(first)),
        other => other,
    }
}

fn angle_direction(angle: f32) -> [f32; 2] {
    [angle.sin(), angle.cos()]
}

fn apply_constants(params: &mut EffectParams, kind: EffectType, c: &ConstantTable) {
    match kind {
        EffectType::WaterWave => {
            params.speed = c.first_value(&["speed", "animationspeed"]);
            params.scale = c.value("scale");
            params.strength = c.value("strength");
            params.exponent = c.value("exponent");
            if params.exponent == 0.0 {
                params.exponent = 1.0;
            }
            if params.scale == 0.0 {
                params.speed = 0.0;
                params.strength = 0.0;
            }
            params.direction = angle_direction(c.value("direction"));
        }
        EffectType::Scroll => {
            params.direction = c.vec2("speed").to_array();
        }
        EffectType::Shake => {
            params.speed = c.value("speed");
            params.strength = c.value("strength");
            params.bounds = c.vec2("bounds").to_array();
            params.friction = c.vec2("friction").to_array();
            params.direction = Vec2::Y.to_array();
        }
        EffectType::FoliageSway => {
            params.speed = c.value("speeduv");
            params.strength = c.value("strength");
            params.scale = c.value("scale");
            params.exponent = c.value("phase");
            params.bounds[0] = c.value("power");
            params.direction = angle_direction(c.value("scrolldirection"));
        }
        EffectType::WaterRipple => {
            params.speed = c.first_value(&["animationspeed", "speed", "animation_speed"]);
            params.strength = c.first_value(&["ripplestrength", "strength", "amount", "ripple_strength"]);
            params.scale = c.first_value(&["scale", "ripplescale", "ripple_scale"]);
            params.direction = angle_direction(c.first_value(&["scrolldirection", "direction", "angle"]));
            params.friction[0] = c.first_value(&["scrollspeed"]);
        }
        EffectType::Pulse => {
            params.speed = c.value("noisespeed");
            params.strength = c.first_value(&["pulsestrength", "strength", "brightness"]);
            params.bounds[0] = c.value("amount");
            params.exponent = c.value("phase");
            if let Some(color) = c.color("tinthigh") {
                params.color = color.to_array();
            }
        }
        EffectType::Tint => {
            params.strength = c.first_value(&["alpha", "strength", "opacity"]);
            if let Some(color) = c.color("color") {
                params.color = color.to_array();
            }
        }
        EffectType::None => {}
    }
}

/// 解析一个对象的特效列表
///
/// `load_texture` 把纹理名解析为句柄，失败时返回 None（该槽位视为缺失）。
pub fn resolve_effects<F>(effects: &[EffectDecl], mut load_texture: F) -> ResolvedEffects
where
    F: FnMut(&str) -> Option<TextureHandle>,
{
    let mut resolved = ResolvedEffects::default();

    for effect in effects {
        let Some(kind) = EffectType::detect(&effect.file) else {
            log::debug!("跳过未支持的特效: {}", effect.file);
            continue;
        };
        let Some((pass, constants)) = effect
            .passes
            .iter()
            .find_map(|p| p.constantshadervalues.as_ref().map(|c| (p, c)))
        else {
            log::debug!("特效 {} 没有着色器常量，跳过", effect.file);
            continue;
        };

        let mut params = EffectParams::new(kind);
        params.mask_index = match kind {
            EffectType::WaterRipple => {
                let (mask, normal) = ripple_textures(pass);
                let mask = mask.and_then(&mut load_texture);
                let normal = normal.and_then(&mut load_texture);
                resolved.push_pair(mask, normal)
            }
            EffectType::Pulse => {
                // 噪声缺失时保持为空，不用遮罩代替
                let noise = pass.texture(1).and_then(&mut load_texture);
                let mask = pass.texture(2).and_then(&mut load_texture);
                resolved.push_pair(mask, noise)
            }
            _ => {
                let mask = pass.texture(1).and_then(&mut load_texture);
                resolved.push_single(mask)
            }
        };

        apply_constants(&mut params, kind, &ConstantTable::new(constants));
        log::debug!("特效 {:?}: mask_index {}", kind, params.mask_index);
        resolved.params.push(params);
    }

    resolved
}
