use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Side of one noise cell in pixels
const CELL: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseConfig {
    pub scale: f64,
    pub intensity: f64,
    pub speed: f64,
    pub color: String,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 0.01,
            intensity: 100.0,
            speed: 0.01,
            color: "#ffffff".to_string(),
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for NoiseConfig {
    const FIELDS: &'static [&'static str] = &["scale", "intensity", "speed", "color"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Sine/cosine interference pattern painted on a coarse grid
pub struct NoiseModule {
    config: NoiseConfig,
    offset: f64,
}

impl NoiseModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Noise.tag(), overrides)?,
            offset: 0.0,
        })
    }

    /// Brightness of the cell at `(x, y)`, in 0..=intensity
    fn brightness(&self, x: f64, y: f64) -> f64 {
        let c = &self.config;
        let n = (x * c.scale + self.offset).sin() * (y * c.scale + self.offset).cos();
        (n + 1.0) / 2.0 * c.intensity
    }
}

impl Module for NoiseModule {
    fn kind(&self) -> &str {
        ModuleKind::Noise.tag()
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
        self.config.appearance.apply(surface);
        let base = options::color(&self.config.color);

        let mut x = 0.0;
        while x < width {
            let mut y = 0.0;
            while y < height {
                let level = self.brightness(x, y) / 255.0;
                surface.set_fill_color(base.scaled(level));
                surface.fill_rect(x, y, CELL, CELL);
                y += CELL;
            }
            x += CELL;
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Noise.tag(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, Rgba, RecordingSurface};

    #[test]
    fn test_cell_grid() {
        let m = NoiseModule::new(&ConfigMap::new()).unwrap();
        let mut surface = RecordingSurface::new(30, 20).unwrap();
        m.draw(&mut surface, 30.0, 20.0, None);
        assert_eq!(surface.primitive_count(), 6);
    }

    #[test]
    fn test_color_scaled_by_brightness() {
        let mut overrides = ConfigMap::new();
        overrides.insert("intensity".into(), ConfigValue::Integer(255));
        overrides.insert("color".into(), ConfigValue::from("#ff8000"));
        let m = NoiseModule::new(&overrides).unwrap();
        let mut surface = RecordingSurface::new(10, 10).unwrap();
        m.draw(&mut surface, 10.0, 10.0, None);

        // sin(0) * cos(0) = 0 gives half brightness at the origin
        assert!(surface.ops().contains(&DrawOp::FillColor(Rgba::rgb(128, 64, 0))));
    }
}
