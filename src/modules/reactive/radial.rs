use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Ray length at full spectrum level
const MAX_RAY: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadialSpectrumConfig {
    pub radius: f64,
    pub bars: u32,
    pub color: String,
    /// Starting angle in radians
    pub rotation: f64,
    pub rotation_speed: f64,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for RadialSpectrumConfig {
    fn default() -> Self {
        Self {
            radius: 100.0,
            bars: 64,
            color: "#ff00ff".to_string(),
            rotation: 0.0,
            rotation_speed: 0.01,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for RadialSpectrumConfig {
    const FIELDS: &'static [&'static str] = &[
        "radius",
        "bars",
        "color",
        "rotation",
        "rotationSpeed",
    ];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Spectrum rays around a circle, slowly turning
pub struct RadialSpectrumModule {
    config: RadialSpectrumConfig,
    spin: f64,
}

impl RadialSpectrumModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::RadialSpectrum.tag(), overrides)?,
            spin: 0.0,
        })
    }
}

impl Module for RadialSpectrumModule {
    fn kind(&self) -> &str {
        ModuleKind::RadialSpectrum.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.spin += self.config.rotation_speed;
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        audio: Option<&AudioFeatures>,
    ) {
        let Some(audio) = audio else {
            return;
        };
        let c = &self.config;
        let bars = options::count(c.bars);
        if bars == 0 {
            return;
        }

        c.appearance.apply(surface);
        surface.set_stroke_color(options::color(&c.color));
        surface.set_line_width(3.0);

        let (cx, cy) = (width / 2.0, height / 2.0);
        for i in 0..bars {
            let angle = i as f64 / bars as f64 * TAU + c.rotation + self.spin;
            let outer = c.radius + audio.bin(i) as f64 / 255.0 * MAX_RAY;
            let (cos, sin) = (angle.cos(), angle.sin());

            surface.begin_path();
            surface.move_to(cx + cos * c.radius, cy + sin * c.radius);
            surface.line_to(cx + cos * outer, cy + sin * outer);
            surface.stroke();
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::RadialSpectrum.tag(), key, value)
    }
}
