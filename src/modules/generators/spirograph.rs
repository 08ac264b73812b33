use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

const SAMPLES: usize = 1000;
const STEP: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpirographConfig {
    /// Fixed circle radius
    #[serde(rename = "R")]
    pub fixed_radius: f64,
    /// Rolling circle radius
    #[serde(rename = "r")]
    pub rolling_radius: f64,
    /// Pen distance from the rolling circle's center
    #[serde(rename = "d")]
    pub pen_distance: f64,
    pub speed: f64,
    pub line_width: f64,
    pub color: String,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for SpirographConfig {
    fn default() -> Self {
        Self {
            fixed_radius: 100.0,
            rolling_radius: 30.0,
            pen_distance: 50.0,
            speed: 0.02,
            line_width: 1.0,
            color: "#ff00ff".to_string(),
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for SpirographConfig {
    const FIELDS: &'static [&'static str] = &["R", "r", "d", "speed", "lineWidth", "color"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Hypotrochoid traced about the canvas center
pub struct SpirographModule {
    config: SpirographConfig,
    phase: f64,
}

impl SpirographModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Spirograph.tag(), overrides)?,
            phase: 0.0,
        })
    }

    /// Point of the curve at parameter `t`, relative to the center
    fn point(&self, t: f64) -> (f64, f64) {
        let c = &self.config;
        let diff = c.fixed_radius - c.rolling_radius;
        let ratio = diff / c.rolling_radius;
        (
            diff * t.cos() + c.pen_distance * (ratio * t).cos(),
            diff * t.sin() - c.pen_distance * (ratio * t).sin(),
        )
    }
}

impl Module for SpirographModule {
    fn kind(&self) -> &str {
        ModuleKind::Spirograph.tag()
    }

    fn update(&mut self, _tick: u64) {
        self.phase += self.config.speed;
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
        // r = 0 has no defined curve
        if c.rolling_radius == 0.0 || !c.rolling_radius.is_finite() {
            return;
        }

        surface.set_stroke_color(options::color(&c.color));
        surface.set_line_width(c.line_width);

        let (cx, cy) = (width / 2.0, height / 2.0);
        surface.begin_path();
        for i in 0..SAMPLES {
            let (x, y) = self.point(i as f64 * STEP + self.phase);
            if i == 0 {
                surface.move_to(cx + x, cy + y);
            } else {
                surface.line_to(cx + x, cy + y);
            }
        }
        surface.stroke();
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Spirograph.tag(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    #[test]
    fn test_single_letter_keys() {
        let mut overrides = ConfigMap::new();
        overrides.insert("R".into(), ConfigValue::Integer(120));
        let m = SpirographModule::new(&overrides).unwrap();
        let config = m.serialize().config;

        assert_eq!(config.get("R"), Some(&ConfigValue::Float(120.0)));
        assert_eq!(config.get("r"), Some(&ConfigValue::Float(30.0)));
        assert_eq!(config.get("d"), Some(&ConfigValue::Float(50.0)));
    }

    #[test]
    fn test_starting_point() {
        let m = SpirographModule::new(&ConfigMap::new()).unwrap();
        let mut surface = RecordingSurface::new(200, 200).unwrap();
        m.draw(&mut surface, 200.0, 200.0, None);

        // (R - r) + d = 120 to the right of center
        assert!(surface.ops().contains(&DrawOp::MoveTo(220.0, 100.0)));
        assert_eq!(surface.primitive_count(), 1);
    }

    #[test]
    fn test_zero_rolling_radius_draws_nothing() {
        let mut m = SpirographModule::new(&ConfigMap::new()).unwrap();
        m.update_config("r", ConfigValue::Integer(0)).unwrap();
        let mut surface = RecordingSurface::new(200, 200).unwrap();
        m.draw(&mut surface, 200.0, 200.0, None);
        assert_eq!(surface.primitive_count(), 0);
    }
}
