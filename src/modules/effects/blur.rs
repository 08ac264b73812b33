use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::{Filter, Surface};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlurConfig {
    /// Standard deviation in pixels
    pub amount: f64,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            amount: 5.0,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for BlurConfig {
    const FIELDS: &'static [&'static str] = &["amount"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

/// Gaussian blur of the layers below
pub struct BlurModule {
    config: BlurConfig,
}

impl BlurModule {
    pub fn new(overrides: &ConfigMap) -> Result<Self> {
        Ok(Self {
            config: options::merge(ModuleKind::Blur.tag(), overrides)?,
        })
    }
}

impl Module for BlurModule {
    fn kind(&self) -> &str {
        ModuleKind::Blur.tag()
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        _width: f64,
        _height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        let amount = self.config.amount;
        if !(amount.is_finite() && amount > 0.0) {
            return;
        }
        self.config.appearance.apply(surface);
        surface.apply_filter(Filter::Blur(amount as f32));
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Blur.tag(), key, value)
    }
}
