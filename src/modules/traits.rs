use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::audio::AudioFeatures;
use crate::error::{ModuleError, Result};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Core trait that all visual modules implement
pub trait Module: Send {
    /// Type tag this module was created from
    fn kind(&self) -> &str;

    fn category(&self) -> ModuleCategory {
        ModuleKind::from_tag(self.kind())
            .map(|kind| kind.category())
            .unwrap_or(ModuleCategory::Other)
    }

    /// Advance private animation state by one tick
    ///
    /// The Studio calls this at most once per tick, before `draw`.
    fn update(&mut self, tick: u64) {
        let _ = tick;
    }

    /// Render the module onto `surface`
    ///
    /// The caller wraps this in save/restore, so appearance and transform
    /// changes made here do not leak into later layers.
    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        audio: Option<&AudioFeatures>,
    );

    /// Type tag plus a snapshot of the current configuration
    fn serialize(&self) -> ModuleSpec;

    /// Change one configuration option
    ///
    /// Only declared options plus `opacity` and `blendMode` are accepted.
    /// On error the configuration is left unchanged. Pre-generated state is
    /// not rebuilt; call [`Module::regenerate`] for that.
    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()>;

    /// Rebuild pre-generated state from the current configuration
    fn regenerate(&mut self, rng: &mut dyn RngCore) {
        let _ = rng;
    }

    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata::for_kind(self.kind())
    }
}

/// Broad grouping of module types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCategory {
    Generator,
    Shape,
    Audio,
    Effect,
    /// Unknown tags handled by the fallback module
    Other,
}

/// Option map as it appears on the wire
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Flexible configuration value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl ConfigValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON form; non-finite floats become `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Integer(i) => serde_json::Value::from(*i),
            ConfigValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Scalar JSON values only; `null`, arrays and objects give `None`
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ConfigValue::Bool(*b)),
            serde_json::Value::String(s) => Some(ConfigValue::String(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(ConfigValue::Integer)
                .or_else(|| n.as_f64().map(ConfigValue::Float)),
            _ => None,
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        ConfigValue::Float(value as f64)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value as i64)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Integer(value as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

/// Portable `{type, config}` description of a module
///
/// Deserializes from the nested form, from a flat `{type, ...options}`
/// mapping, or from a bare type string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpec")]
pub struct ModuleSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub config: ConfigMap,
}

impl ModuleSpec {
    pub fn new<S: Into<String>>(kind: S, config: ConfigMap) -> Self {
        Self { kind: kind.into(), config }
    }

    /// Set one option
    pub fn with<K: Into<String>, V: Into<ConfigValue>>(mut self, key: K, value: V) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for ModuleSpec {
    fn from(kind: &str) -> Self {
        Self::new(kind, ConfigMap::new())
    }
}

impl From<ModuleKind> for ModuleSpec {
    fn from(kind: ModuleKind) -> Self {
        Self::new(kind.tag(), ConfigMap::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Bare(String),
    Nested {
        #[serde(rename = "type")]
        kind: String,
        config: ConfigMap,
    },
    Flat(serde_json::Map<String, serde_json::Value>),
}

impl TryFrom<RawSpec> for ModuleSpec {
    type Error = ModuleError;

    fn try_from(raw: RawSpec) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawSpec::Bare(kind) => Ok(ModuleSpec::new(kind, ConfigMap::new())),
            RawSpec::Nested { kind, mut config } => {
                config.remove("type");
                Ok(ModuleSpec::new(kind, config))
            }
            RawSpec::Flat(mut map) => {
                let kind = match map.remove("type") {
                    Some(serde_json::Value::String(kind)) => kind,
                    _ => {
                        return Err(ModuleError::InvalidSpec {
                            reason: "missing string 'type'".to_string(),
                        })
                    }
                };
                let mut config = ConfigMap::new();
                for (key, value) in map {
                    let value =
                        ConfigValue::from_json(&value).ok_or_else(|| ModuleError::InvalidOption {
                            kind: kind.clone(),
                            key: key.clone(),
                            reason: "expected a number, boolean or string".to_string(),
                        })?;
                    config.insert(key, value);
                }
                Ok(ModuleSpec::new(kind, config))
            }
        }
    }
}

/// Metadata about a module's capabilities
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    /// Human-readable description
    pub description: String,

    /// Whether drawing depends on the audio snapshot
    pub audio_reactive: bool,

    /// Whether the module transforms what earlier layers drew
    pub post_processing: bool,

    /// Whether construction consumes random numbers
    pub randomized: bool,
}

impl ModuleMetadata {
    pub fn for_kind(tag: &str) -> Self {
        let Some(kind) = ModuleKind::from_tag(tag) else {
            return Self {
                description: format!("Unrecognised module type '{}'; draws nothing", tag),
                ..Self::default()
            };
        };
        Self {
            description: kind.description().to_string(),
            audio_reactive: kind.category() == ModuleCategory::Audio,
            post_processing: kind.category() == ModuleCategory::Effect,
            randomized: kind.category() == ModuleCategory::Shape || kind == ModuleKind::Particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_value_json_conversion() {
        assert_eq!(ConfigValue::from_json(&json!(3)), Some(ConfigValue::Integer(3)));
        assert_eq!(ConfigValue::from_json(&json!(0.5)), Some(ConfigValue::Float(0.5)));
        assert_eq!(ConfigValue::from_json(&json!([1])), None);
        assert_eq!(ConfigValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(ConfigValue::Integer(2).as_f64(), Some(2.0));
        assert_eq!(ConfigValue::Float(2.5).as_i64(), None);
    }

    #[test]
    fn test_spec_forms() {
        let nested: ModuleSpec = serde_json::from_value(json!({"type": "circles", "config": {"count": 3}})).unwrap();
        let flat: ModuleSpec = serde_json::from_value(json!({"type": "circles", "count": 3})).unwrap();
        let bare: ModuleSpec = serde_json::from_value(json!("circles")).unwrap();

        assert_eq!(nested, flat);
        assert_eq!(nested.config.get("count"), Some(&ConfigValue::Integer(3)));
        assert_eq!(bare, ModuleSpec::from("circles"));
    }

    #[test]
    fn test_spec_rejects_missing_type() {
        assert!(serde_json::from_value::<ModuleSpec>(json!({"count": 3})).is_err());
        assert!(serde_json::from_value::<ModuleSpec>(json!({"type": "waves", "count": [1]})).is_err());
    }

    #[test]
    fn test_spec_serializes_nested() {
        let spec = ModuleSpec::from("blur").with("amount", 2.5);
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"type": "blur", "config": {"amount": 2.5}})
        );
    }
}
