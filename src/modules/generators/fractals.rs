use std::f64::consts::{FRAC_PI_2, FRAC_PI_6};

use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Deepest tree drawn; 2^12 - 1 segments
pub const MAX_ITERATIONS: u32 = 12;

const BRANCH_SCALE: f64 = 0.67;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FractalConfig {
    pub iterations: u32,
    /// Starting tilt in radians
    pub rotation: f64,
    pub rotation_speed: f64,
    pub color: String,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            rotation: 0.0,
            rotation_speed: 0.002,
            color: "#ff6600".to_string(),
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for FractalConfig {
    const FIELDS: &'static [&'static str] = &["iterations", "rotation", "rotationSpeed", "color"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Binary branching tree rooted at the bottom center
pub struct FractalModule {
    config: FractalConfig,
    tilt: f64,
}

impl FractalModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Fractals.tag(), overrides)?,
            tilt: 0.0,
        })
    }

    fn branch(surface: &mut dyn Surface, x: f64, y: f64, length: f64, angle: f64, depth: u32) {
        if depth == 0 {
            return;
        }

        let x2 = x + length * angle.cos();
        let y2 = y + length * angle.sin();

        surface.begin_path();
        surface.move_to(x, y);
        surface.line_to(x2, y2);
        surface.stroke();

        Self::branch(surface, x2, y2, length * BRANCH_SCALE, angle - FRAC_PI_6, depth - 1);
        Self::branch(surface, x2, y2, length * BRANCH_SCALE, angle + FRAC_PI_6, depth - 1);
    }
}

impl Module for FractalModule {
    fn kind(&self) -> &str {
        ModuleKind::Fractals.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.tilt += self.config.rotation_speed;
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
        surface.set_line_width(1.0);

        let trunk = width.min(height) * 0.4;
        let angle = -FRAC_PI_2 + c.rotation + self.tilt;
        Self::branch(surface, width / 2.0, height, trunk, angle, c.iterations.min(MAX_ITERATIONS));
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Fractals.tag(), key, value)
    }
}
