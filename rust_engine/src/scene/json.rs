//! 场景描述文件的 JSON 结构
//!
//! 字段形态不固定的地方用 untagged 枚举兜底，解析这些字段永远不会失败。

use std::path::Path;

use serde::Deserialize;

use crate::effects::EffectDecl;
use crate::{Result, WpError};

/// 项目描述（`project.json`）
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectDecl {
    pub file: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectionSize {
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GeneralSettings {
    #[serde(default)]
    pub orthogonalprojection: Option<ProjectionSize>,
}

/// 场景文件；对象保持为原始 JSON，逐个解析以隔离错误
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneDoc {
    #[serde(default)]
    pub general: Option<GeneralSettings>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub objects: Vec<serde_json::Value>,
}

impl SceneDoc {
    /// 声明的正交投影尺寸，缺失或非正数时为 None
    pub fn projection(&self) -> Option<(f32, f32)> {
        let size = self.general.as_ref()?.orthogonalprojection.as_ref()?;
        (size.width > 0.0 && size.height > 0.0).then_some((size.width, size.height))
    }
}

/// 可脚本化的值：字符串、数字或 `{"value": ...}`
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ScriptableValue {
    Text(String),
    Number(f64),
    Script { value: Box<ScriptableValue> },
    Other(serde_json::Value),
}

impl ScriptableValue {
    pub fn as_text(&self) -> Option<String> {
        match self {
            ScriptableValue::Text(s) => Some(s.clone()),
            ScriptableValue::Number(n) => Some(n.to_string()),
            ScriptableValue::Script { value } => value.as_text(),
            ScriptableValue::Other(_) => None,
        }
    }
}

/// 可见性：布尔值或 `{"value": bool}`，其他形态视为可见
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum VisibleFlag {
    Bool(bool),
    Wrapped { value: bool },
    Other(serde_json::Value),
}

impl VisibleFlag {
    pub fn is_visible(&self) -> bool {
        match self {
            VisibleFlag::Bool(b) | VisibleFlag::Wrapped { value: b } => *b,
            VisibleFlag::Other(_) => true,
        }
    }
}

/// 场景对象声明
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneObjectDecl {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub origin: Option<ScriptableValue>,
    #[serde(default)]
    pub size: Option<ScriptableValue>,
    #[serde(default)]
    pub scale: Option<ScriptableValue>,
    #[serde(default)]
    pub angles: Option<ScriptableValue>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub visible: Option<VisibleFlag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effects: Vec<EffectDecl>,
}

impl SceneObjectDecl {
    pub fn is_visible(&self) -> bool {
        self.visible.as_ref().map_or(true, VisibleFlag::is_visible)
    }

    pub fn display_name(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

/// 模型描述（精灵通过它找到材质）
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModelDecl {
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub puppet: Option<String>,
}

/// 缺失字段和显式 `null` 都取默认值
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 读取并解析 JSON 文件；文件不存在时报告 `AssetMissing`
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(WpError::AssetMissing(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: &str) -> SceneObjectDecl {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scriptable_shapes() {
        let o = object(r#"{"origin": "1 2 3", "size": {"value": "4 5"}, "scale": 2, "angles": [1, 2]}"#);
        assert_eq!(o.origin.and_then(|v| v.as_text()).as_deref(), Some("1 2 3"));
        assert_eq!(o.size.and_then(|v| v.as_text()).as_deref(), Some("4 5"));
        assert_eq!(o.scale.and_then(|v| v.as_text()).as_deref(), Some("2"));
        assert_eq!(o.angles.and_then(|v| v.as_text()), None);
    }

    #[test]
    fn test_numeric_script_value() {
        let o = object(r#"{"origin": {"value": 5}, "scale": {"value": {"script": "x"}}}"#);
        assert_eq!(o.origin.and_then(|v| v.as_text()).as_deref(), Some("5"));
        assert_eq!(o.scale.and_then(|v| v.as_text()), None);
    }

    #[test]
    fn test_null_lists_keep_object() {
        let o = object(r#"{"id": 1, "image": "models/a.json", "effects": null}"#);
        assert_eq!(o.id, Some(1));
        assert!(o.effects.is_empty());

        let o = object(
            r#"{"id": 2, "effects": [{"file": "effects/shake/effect.json", "passes": [{"textures": null}]}, {"file": "effects/tint/effect.json", "passes": null}]}"#,
        );
        assert_eq!(o.effects.len(), 2);
        assert!(o.effects[0].passes[0].textures.is_empty());
        assert!(o.effects[1].passes.is_empty());

        let doc: SceneDoc = serde_json::from_str(r#"{"objects": null}"#).unwrap();
        assert!(doc.objects.is_empty());
    }

    #[test]
    fn test_visibility_shapes() {
        assert!(object("{}").is_visible());
        assert!(!object(r#"{"visible": false}"#).is_visible());
        assert!(!object(r#"{"visible": {"value": false}}"#).is_visible());
        assert!(object(r#"{"visible": {"user": "show"}}"#).is_visible());
        assert!(object(r#"{"visible": "yes"}"#).is_visible());
    }

    #[test]
    fn test_projection() {
        let doc: SceneDoc =
            serde_json::from_str(r#"{"general": {"orthogonalprojection": {"width": 1280, "height": 720}}, "objects": []}"#)
                .unwrap();
        assert_eq!(doc.projection(), Some((1280.0, 720.0)));

        let doc: SceneDoc = serde_json::from_str(r#"{"general": {"orthogonalprojection": null}}"#).unwrap();
        assert_eq!(doc.projection(), None);
    }
}
