use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Decoded audio with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Latest frequency and time-domain bytes available to audio-reactive modules
///
/// Both arrays keep a fixed length for the lifetime of the pipeline:
/// `frequency_data` has `fft_size / 2` bins and `time_domain_data` holds
/// `fft_size` samples. Silence reads as 0 in the spectrum and 128 in the
/// waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    pub frequency_data: Vec<u8>,
    pub time_domain_data: Vec<u8>,
}

impl AudioFeatures {
    /// Silent snapshot for the given FFT size
    pub fn silent(fft_size: usize) -> Self {
        Self {
            frequency_data: vec![0; fft_size / 2],
            time_domain_data: vec![128; fft_size],
        }
    }

    /// Frequency bin `index`, reading missing bins as 0
    pub fn bin(&self, index: usize) -> u8 {
        self.frequency_data.get(index).copied().unwrap_or(0)
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.frequency_data.len()
    }

    /// Average spectrum level in 0.0-1.0
    pub fn level(&self) -> f32 {
        if self.frequency_data.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.frequency_data.iter().map(|&b| b as u32).sum();
        sum as f32 / (self.frequency_data.len() as f32 * 255.0)
    }
}
