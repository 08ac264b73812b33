use tracing::debug;

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::Appearance;
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::surface::{BlendMode, Surface};

/// Options every fallback layer starts with
fn base_defaults() -> ConfigMap {
    let mut config = ConfigMap::new();
    config.insert("color".into(), ConfigValue::from("#ffffff"));
    config.insert("opacity".into(), ConfigValue::Float(1.0));
    config.insert("blendMode".into(), ConfigValue::from("source-over"));
    config
}

/// Fallback for unrecognised type tags
///
/// Keeps the tag and every supplied option verbatim so the layer survives an
/// export/load round trip, and draws nothing. Options are never validated;
/// opacity and blend mode are read leniently when the layer is drawn.
pub struct BaseModule {
    kind: String,
    config: ConfigMap,
}

impl BaseModule {
    pub fn new(kind: &str, overrides: &ConfigMap) -> Self {
        debug!("No constructor for '{}', using the no-op module", kind);
        let mut config = base_defaults();
        for (key, value) in overrides {
            if key != "type" {
                config.insert(key.clone(), value.clone());
            }
        }
        Self {
            kind: kind.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Opacity and blend mode, falling back to 1 and source-over
    pub fn appearance(&self) -> Appearance {
        let blend_mode = self
            .config
            .get("blendMode")
            .and_then(ConfigValue::as_str)
            .and_then(|name| serde_json::from_value::<BlendMode>(name.into()).ok());
        Appearance {
            opacity: self.config.get("opacity").and_then(ConfigValue::as_f64),
            blend_mode,
        }
    }
}

impl Module for BaseModule {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        _width: f64,
        _height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        self.appearance().apply(surface);
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind.clone(), self.config.clone())
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        if key != "type" {
            self.config.insert(key.to_string(), value);
        }
        Ok(())
    }
}
