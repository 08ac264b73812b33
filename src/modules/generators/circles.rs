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
pub struct CircleConfig {
    pub count: u32,
    pub min_radius: f64,
    pub max_radius: f64,
    pub rotation_speed: f64,
    pub color: String,
    pub fill: bool,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            count: 5,
            min_radius: 20.0,
            max_radius: 100.0,
            rotation_speed: 0.01,
            color: "#ffff00".to_string(),
            fill: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for CircleConfig {
    const FIELDS: &'static [&'static str] = &[
        "count",
        "minRadius",
        "maxRadius",
        "rotationSpeed",
        "color",
        "fill",
    ];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Concentric rings about the canvas center
pub struct CircleModule {
    config: CircleConfig,
    rotation: f64,
}

impl CircleModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Circles.tag(), overrides)?,
            rotation: 0.0,
        })
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

impl Module for CircleModule {
    fn kind(&self) -> &str {
        ModuleKind::Circles.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.rotation += self.config.rotation_speed;
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

        let color = options::color(&c.color);
        if c.fill {
            surface.set_fill_color(color);
        } else {
            surface.set_stroke_color(color);
            surface.set_line_width(2.0);
        }

        let (cx, cy) = (width / 2.0, height / 2.0);
        let count = options::count(c.count);
        for i in 0..count {
            let fraction = i as f64 / count as f64;
            let radius = c.min_radius + (c.max_radius - c.min_radius) * fraction;
            let start = self.rotation + fraction * TAU;

            surface.begin_path();
            surface.arc(cx, cy, radius, start, start + TAU);
            if c.fill {
                surface.fill();
            } else {
                surface.stroke();
            }
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Circles.tag(), key, value)
    }
}
