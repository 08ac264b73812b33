use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the art studio
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output canvas settings
    pub canvas: CanvasConfig,

    /// Frame loop settings
    pub animation: AnimationConfig,

    /// Audio analysis settings
    pub audio: AudioConfig,

    /// Software rendering settings
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.canvas.validate()?;
        self.animation.validate()?;
        self.audio.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Canvas configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Skip clearing between frames, leaving feedback trails
    pub preserve_frames: bool,

    /// CSS color painted after each clear; transparent when unset
    pub background: Option<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            preserve_frames: false,
            background: None,
        }
    }
}

impl CanvasConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "canvas.size".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        Ok(())
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Target frames per second for the real-time loop
    pub fps: f64,

    /// Seed for randomized modules; entropy when unset
    pub seed: Option<u64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            seed: None,
        }
    }
}

impl AnimationConfig {
    fn validate(&self) -> Result<()> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "animation.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Audio analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// FFT window size; half of it is the number of frequency bins
    pub fft_size: usize,

    /// Smoothing between successive spectra (0.0-1.0)
    pub smoothing: f32,

    /// Magnitude mapped to byte 0
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(ConfigError::InvalidValue {
                key: "audio.fft_size".to_string(),
                value: self.fft_size.to_string()
            }.into());
        }

        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::InvalidValue {
                key: "audio.smoothing".to_string(),
                value: self.smoothing.to_string()
            }.into());
        }

        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::InvalidValue {
                key: "audio.decibel_range".to_string(),
                value: format!("{}..{}", self.min_decibels, self.max_decibels)
            }.into());
        }

        Ok(())
    }
}

/// Software rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads used by pixel post-processing
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("studio.toml");

        let mut original_config = Config::default();
        original_config.canvas.background = Some("#101010".to_string());
        original_config.animation.seed = Some(42);

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.canvas.width, loaded_config.canvas.width);
        assert_eq!(loaded_config.canvas.background.as_deref(), Some("#101010"));
        assert_eq!(loaded_config.animation.seed, Some(42));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[canvas]\nwidth = 320\n").unwrap();
        assert_eq!(config.canvas.width, 320);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.audio.fft_size, 256);
    }

    #[test]
    fn test_invalid_canvas_size() {
        let mut config = Config::default();
        config.canvas.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_fft_size() {
        let mut config = Config::default();
        config.audio.fft_size = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_decibel_range() {
        let mut config = Config::default();
        config.audio.min_decibels = -20.0;
        config.audio.max_decibels = -30.0;
        assert!(config.validate().is_err());
    }
}
