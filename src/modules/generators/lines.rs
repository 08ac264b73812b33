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
pub struct LineConfig {
    pub count: u32,
    /// Starting angle in radians
    pub angle: f64,
    pub rotation_speed: f64,
    pub length: f64,
    pub color: String,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            count: 20,
            angle: 0.0,
            rotation_speed: 0.005,
            length: 200.0,
            color: "#00ff00".to_string(),
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for LineConfig {
    const FIELDS: &'static [&'static str] = &["count", "angle", "rotationSpeed", "length", "color"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Radial burst of segments from the canvas center
pub struct LineModule {
    config: LineConfig,
    spin: f64,
}

impl LineModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Lines.tag(), overrides)?,
            spin: 0.0,
        })
    }
}

impl Module for LineModule {
    fn kind(&self) -> &str {
        ModuleKind::Lines.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.spin += self.config.rotation_speed;
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        let c = &self.config;
        c.appearance.apply(surface);
        surface.set_stroke_color(options::color(&c.color));
        surface.set_line_width(2.0);

        let (cx, cy) = (width / 2.0, height / 2.0);
        let count = options::count(c.count);
        for i in 0..count {
            let angle = c.angle + self.spin + i as f64 * TAU / count as f64;
            surface.begin_path();
            surface.move_to(cx, cy);
            surface.line_to(cx + angle.cos() * c.length, cy + angle.sin() * c.length);
            surface.stroke();
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Lines.tag(), key, value)
    }
}
