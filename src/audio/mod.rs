//! # Audio Features
//!
//! Supplies the per-tick spectrum and waveform bytes read by audio-reactive
//! modules.
//!
//! ## Core Features
//!
//! - **Analysis**: [`Analyser`] reduces sample windows the way a browser
//!   `AnalyserNode` does (Blackman window, FFT, smoothing, dB to bytes)
//! - **Sources**: [`AudioFeatureSource`] implementations for decoded clips
//!   ([`ClipSource`]) and live producers ([`SampleFeed`] + [`FeedSource`])
//! - **Loading**: [`AudioLoader`] decodes WAV, MP3, FLAC, OGG and AAC files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use art_studio::audio::{Analyser, AudioLoader, ClipSource};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let audio = AudioLoader::load("song.wav").await?;
//! let analyser = Analyser::new(256, 0.8, -100.0, -30.0)?;
//! let source = ClipSource::new(&audio, 60.0, analyser);
//! # let _ = source;
//! # Ok(())
//! # }
//! ```

pub mod analyser;
pub mod loader;
pub mod source;
pub mod types;

pub use analyser::Analyser;
pub use loader::AudioLoader;
pub use source::{AudioFeatureSource, ClipSource, FeedSource, SampleFeed};
pub use types::{AudioData, AudioFeatures};

use tracing::warn;

/// Installed audio source plus the snapshot it refreshes
pub struct AudioPipeline {
    source: Box<dyn AudioFeatureSource>,
    features: AudioFeatures,
}

impl AudioPipeline {
    pub fn new(source: Box<dyn AudioFeatureSource>) -> Self {
        let features = AudioFeatures::silent(source.fft_size());
        Self { source, features }
    }

    /// Capture once; a failed capture leaves the previous snapshot in place
    pub fn refresh(&mut self) {
        if let Err(e) = self.source.capture(&mut self.features) {
            warn!("Audio capture failed: {}", e);
        }
    }

    pub fn features(&self) -> &AudioFeatures {
        &self.features
    }
}
