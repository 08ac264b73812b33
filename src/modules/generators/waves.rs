use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Horizontal distance between wave samples
const SAMPLE_STEP: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveConfig {
    pub amplitude: f64,
    pub frequency: f64,
    pub speed: f64,
    pub line_width: f64,
    pub color: String,
    pub count: u32,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            amplitude: 50.0,
            frequency: 0.02,
            speed: 0.05,
            line_width: 2.0,
            color: "#00ffff".to_string(),
            count: 3,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for WaveConfig {
    const FIELDS: &'static [&'static str] = &[
        "amplitude",
        "frequency",
        "speed",
        "lineWidth",
        "color",
        "count",
    ];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Stacked sine polylines scrolling with a shared offset
pub struct WaveModule {
    config: WaveConfig,
    offset: f64,
}

impl WaveModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Waves.tag(), overrides)?,
            offset: 0.0,
        })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl Module for WaveModule {
    fn kind(&self) -> &str {
        ModuleKind::Waves.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.offset += self.config.speed;
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
        surface.set_line_width(c.line_width);

        for w in 0..options::count(c.count) {
            surface.begin_path();
            let mut x = 0.0;
            while x < width {
                let phase = x * c.frequency + self.offset + w as f64;
                let y = height / 2.0 + phase.sin() * c.amplitude;
                if x == 0.0 {
                    surface.move_to(x, y);
                } else {
                    surface.line_to(x, y);
                }
                x += SAMPLE_STEP;
            }
            surface.stroke();
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Waves.tag(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    #[test]
    fn test_offset_advances_without_touching_config() {
        let mut m = WaveModule::new(&ConfigMap::new()).unwrap();
        let before = m.serialize();
        m.update(1);
        m.update(2);
        assert!((m.offset() - 0.1).abs() < 1e-12);
        assert_eq!(m.serialize(), before);
    }

    #[test]
    fn test_samples_every_five_pixels() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(1));
        let m = WaveModule::new(&overrides).unwrap();
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);

        let points = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::MoveTo(..) | DrawOp::LineTo(..)))
            .count();
        assert_eq!(points, 20);
        assert_eq!(surface.ops()[4], DrawOp::BeginPath);
        assert_eq!(surface.ops()[5], DrawOp::MoveTo(0.0, 50.0));
    }
}
