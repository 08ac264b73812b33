use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

/// Gap between neighbouring bars in pixels
const BAR_GAP: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioBarsConfig {
    pub bar_count: u32,
    /// Kept for compatibility; bars always span the canvas width
    pub bar_width: f64,
    pub color: String,
    /// Kept for compatibility; smoothing is the analyser's job
    pub smoothing: f64,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for AudioBarsConfig {
    fn default() -> Self {
        Self {
            bar_count: 64,
            bar_width: 5.0,
            color: "#00ffff".to_string(),
            smoothing: 0.8,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for AudioBarsConfig {
    const FIELDS: &'static [&'static str] = &["barCount", "barWidth", "color", "smoothing"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Spectrum bars standing on the bottom edge
pub struct AudioBarsModule {
    config: AudioBarsConfig,
}

impl AudioBarsModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::AudioBars.tag(), overrides)?,
        })
    }
}

impl Module for AudioBarsModule {
    fn kind(&self) -> &str {
        ModuleKind::AudioBars.tag()
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
        let count = options::count(self.config.bar_count);
        if count == 0 {
            return;
        }

        self.config.appearance.apply(surface);
        surface.set_fill_color(options::color(&self.config.color));

        let slot = width / count as f64;
        for i in 0..count {
            let bar_height = audio.bin(i) as f64 / 255.0 * height * 0.8;
            surface.fill_rect(i as f64 * slot, height - bar_height, slot - BAR_GAP, bar_height);
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::AudioBars.tag(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    #[test]
    fn test_silent_without_audio() {
        let m = AudioBarsModule::new(&ConfigMap::new()).unwrap();
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_bar_geometry() {
        let mut overrides = ConfigMap::new();
        overrides.insert("barCount".into(), ConfigValue::Integer(4));
        let m = AudioBarsModule::new(&overrides).unwrap();

        let mut audio = AudioFeatures::silent(4);
        audio.frequency_data = vec![255];
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, Some(&audio));

        let rects: Vec<&DrawOp> = surface.ops().iter().filter(|op| op.is_primitive()).collect();
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0], &DrawOp::FillRect { x: 0.0, y: 20.0, width: 23.0, height: 80.0 });
        // Missing bins read as silence
        assert_eq!(rects[3], &DrawOp::FillRect { x: 75.0, y: 100.0, width: 23.0, height: 0.0 });
    }
}
