use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KaleidoscopeConfig {
    pub segments: u32,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for KaleidoscopeConfig {
    fn default() -> Self {
        Self {
            segments: 6,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for KaleidoscopeConfig {
    const FIELDS: &'static [&'static str] = &["segments"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Redraws the canvas rotated about its center once per segment
pub struct KaleidoscopeModule {
    config: KaleidoscopeConfig,
}

impl KaleidoscopeModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Kaleidoscope.tag(), overrides)?,
        })
    }
}

impl Module for KaleidoscopeModule {
    fn kind(&self) -> &str {
        ModuleKind::Kaleidoscope.tag()
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        let segments = options::count(self.config.segments);
        if segments == 0 {
            return;
        }

        self.config.appearance.apply(surface);
        let snapshot = surface.snapshot();
        let (cx, cy) = (width / 2.0, height / 2.0);
        let step = TAU / segments as f64;

        for i in 0..segments {
            surface.save();
            surface.translate(cx, cy);
            surface.rotate(step * i as f64);
            surface.draw_snapshot(&snapshot, -cx, -cy);
            surface.restore();
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Kaleidoscope.tag(), key, value)
    }
}
