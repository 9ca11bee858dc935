//! 特效声明和着色器常量查找

use std::collections::HashMap;

use glam::{Vec2, Vec4};
use serde::Deserialize;

/// 编辑器属性前缀：常量可能以 `ui_editor_properties_<key>` 形式出现
pub const EDITOR_PREFIX: &str = "ui_editor_properties_";

/// 着色器常量：数字、字符串或 `{"value": ...}` 包装
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ShaderValue {
    Number(f64),
    Text(String),
    Wrapped { value: Box<ShaderValue> },
    Other(serde_json::Value),
}

impl ShaderValue {
    /// 数值；字符串无法解析时为 0
    pub fn as_f32(&self) -> f32 {
        match self {
            ShaderValue::Number(v) => *v as f32,
            ShaderValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            ShaderValue::Wrapped { value } => value.as_f32(),
            ShaderValue::Other(_) => 0.0,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ShaderValue::Text(s) => Some(s),
            ShaderValue::Wrapped { value } => value.as_text(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EffectPassDecl {
    #[serde(default)]
    pub constantshadervalues: Option<HashMap<String, ShaderValue>>,
    #[serde(default, deserialize_with = "crate::scene::null_as_default")]
    pub textures: Vec<Option<String>>,
}

impl EffectPassDecl {
    /// 槽位上的纹理名（空串视为没有）
    pub fn texture(&self, slot: usize) -> Option<&str> {
        self.textures
            .get(slot)?
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

/// 对象上的一条特效声明
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EffectDecl {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::scene::null_as_default")]
    pub passes: Vec<EffectPassDecl>,
}

/// 常量表查找
pub struct ConstantTable<'a> {
    values: &'a HashMap<String, ShaderValue>,
}

impl<'a> ConstantTable<'a> {
    pub fn new(values: &'a HashMap<String, ShaderValue>) -> Self {
        Self { values }
    }

    /// 先查原键，再查编辑器前缀键
    pub fn get(&self, key: &str) -> Option<&'a ShaderValue> {
        self.values
            .get(key)
            .or_else(|| self.values.get(&format!("{}{}", EDITOR_PREFIX, key)))
    }

    pub fn value(&self, key: &str) -> f32 {
        self.get(key).map_or(0.0, ShaderValue::as_f32)
    }

    /// 依次尝试同义键：返回第一个非零值；原键存在时即使为零也返回
    pub fn first_value(&self, keys: &[&str]) -> f32 {
        for key in keys {
            let v = self.value(key);
            if v != 0.0 || self.values.contains_key(*key) {
                return v;
            }
        }
        0.0
    }

    fn components(&self, key: &str) -> Option<Vec<f32>> {
        let text = self.get(key)?.as_text()?;
        Some(text.split_whitespace().filter_map(|s| s.parse().ok()).collect())
    }

    /// 二维向量，只接受字符串形式，不足两个分量时为零
    pub fn vec2(&self, key: &str) -> Vec2 {
        match self.components(key).as_deref() {
            Some([x, y, ..]) => Vec2::new(*x, *y),
            _ => Vec2::ZERO,
        }
    }

    /// RGB 字符串扩展为 alpha = 1 的颜色
    pub fn color(&self, key: &str) -> Option<Vec4> {
        match self.components(key).as_deref() {
            Some([r, g, b, ..]) => Some(Vec4::new(*r, *g, *b, 1.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> HashMap<String, ShaderValue> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_value_shapes() {
        let values = table(r#"{"a": 2.5, "b": "1.5", "c": {"value": "3"}, "d": true, "e": "abc"}"#);
        let t = ConstantTable::new(&values);
        assert_eq!(t.value("a"), 2.5);
        assert_eq!(t.value("b"), 1.5);
        assert_eq!(t.value("c"), 3.0);
        assert_eq!(t.value("d"), 0.0);
        assert_eq!(t.value("e"), 0.0);
        assert_eq!(t.value("missing"), 0.0);
    }

    #[test]
    fn test_editor_prefix_fallback() {
        let values = table(r#"{"ui_editor_properties_speed": 4}"#);
        assert_eq!(ConstantTable::new(&values).value("speed"), 4.0);
    }

    #[test]
    fn test_first_present_beats_synonyms() {
        let values = table(r#"{"speed": 0, "animationspeed": 5}"#);
        let t = ConstantTable::new(&values);
        assert_eq!(t.first_value(&["speed", "animationspeed"]), 0.0);
        assert_eq!(t.first_value(&["ripplespeed", "animationspeed"]), 5.0);
        assert_eq!(t.first_value(&["x", "y"]), 0.0);
    }

    #[test]
    fn test_vectors() {
        let values = table(r#"{"speed": "0.1 -0.2", "tint": "1 0.5 0", "n": 3, "short": "1"}"#);
        let t = ConstantTable::new(&values);
        assert_eq!(t.vec2("speed"), Vec2::new(0.1, -0.2));
        assert_eq!(t.vec2("n"), Vec2::ZERO);
        assert_eq!(t.vec2("short"), Vec2::ZERO);
        assert_eq!(t.color("tint"), Some(Vec4::new(1.0, 0.5, 0.0, 1.0)));
        assert_eq!(t.color("speed"), None);
    }
}
