use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::{ColorMatrix, Filter, Surface};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorFilterConfig {
    /// Hue rotation in degrees
    pub hue: f64,
    /// Saturation in percent; 100 leaves colors unchanged
    pub saturation: f64,
    /// Brightness in percent; 100 leaves colors unchanged
    pub brightness: f64,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for ColorFilterConfig {
    fn default() -> Self {
        Self {
            hue: 0.0,
            saturation: 100.0,
            brightness: 100.0,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for ColorFilterConfig {
    const FIELDS: &'static [&'static str] = &["hue", "saturation", "brightness"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Hue, saturation and brightness adjustment of the layers below
pub struct ColorFilterModule {
    config: ColorFilterConfig,
}

impl ColorFilterModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::ColorFilter.tag(), overrides)?,
        })
    }

    /// Combined `hue-rotate`, `saturate`, `brightness` matrix
    pub fn matrix(&self) -> ColorMatrix {
        let c = &self.config;
        ColorMatrix::hue_rotate(c.hue as f32)
            .then(ColorMatrix::saturate((c.saturation / 100.0) as f32))
            .then(ColorMatrix::brightness((c.brightness / 100.0) as f32))
    }
}

impl Module for ColorFilterModule {
    fn kind(&self) -> &str {
        ModuleKind::ColorFilter.tag()
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        _width: f64,
        _height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        self.config.appearance.apply(surface);
        surface.apply_filter(Filter::Color(self.matrix()));
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::ColorFilter.tag(), key, value)
    }
}
