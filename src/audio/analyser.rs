use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::audio::types::AudioFeatures;
use crate::config::AudioConfig;
use crate::error::{AudioError, Result};

/// Reduces a window of samples to byte spectrum and waveform arrays
///
/// Follows the browser `AnalyserNode` pipeline: Blackman window, real FFT,
/// magnitudes scaled by 1/N, exponential smoothing over time, then decibels
/// mapped linearly onto 0-255 between `min_decibels` and `max_decibels`.
pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(
        fft_size: usize,
        smoothing: f32,
        min_decibels: f32,
        max_decibels: f32,
    ) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(32..=32768).contains(&fft_size) {
            return Err(AudioError::InvalidParameters {
                details: format!("fft size {} must be a power of two in 32..=32768", fft_size),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&smoothing) {
            return Err(AudioError::InvalidParameters {
                details: format!("smoothing {} must be within 0..=1", smoothing),
            }
            .into());
        }
        if min_decibels >= max_decibels {
            return Err(AudioError::InvalidParameters {
                details: format!("decibel range {}..{} is empty", min_decibels, max_decibels),
            }
            .into());
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();

        Ok(Self {
            fft_size,
            smoothing,
            min_decibels,
            max_decibels,
            fft,
            window: blackman(fft_size),
            input,
            spectrum,
            smoothed: vec![0.0; fft_size / 2],
        })
    }

    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        Self::new(config.fft_size, config.smoothing, config.min_decibels, config.max_decibels)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Analyse the most recent `fft_size` samples of `samples` into `out`
    ///
    /// Shorter input is treated as preceded by silence.
    pub fn analyse(&mut self, samples: &[f32], out: &mut AudioFeatures) -> Result<()> {
        let n = self.fft_size;
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        out.time_domain_data.resize(n, 128);
        out.frequency_data.resize(n / 2, 0);

        for i in 0..n {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            out.time_domain_data[i] = (128.0 + sample * 128.0).clamp(0.0, 255.0) as u8;
            self.input[i] = sample * self.window[i];
        }

        self.fft
            .process(&mut self.input, &mut self.spectrum)
            .map_err(|e| AudioError::AnalysisFailed { reason: e.to_string() })?;

        let scale = 255.0 / (self.max_decibels - self.min_decibels);
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.spectrum[k].norm() / n as f32;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;

            let db = if *smoothed > 0.0 { 20.0 * smoothed.log10() } else { f32::NEG_INFINITY };
            out.frequency_data[k] = (scale * (db - self.min_decibels)).clamp(0.0, 255.0) as u8;
        }

        Ok(())
    }

    /// Forget smoothing history
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }
}

fn blackman(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / n as f32;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Analyser::new(100, 0.8, -100.0, -30.0).is_err());
        assert!(Analyser::new(256, 1.5, -100.0, -30.0).is_err());
        assert!(Analyser::new(256, 0.8, -30.0, -30.0).is_err());
        assert!(Analyser::new(256, 0.8, -100.0, -30.0).is_ok());
    }

    #[test]
    fn test_silence() {
        let mut analyser = Analyser::new(256, 0.8, -100.0, -30.0).unwrap();
        let mut features = AudioFeatures::silent(256);
        analyser.analyse(&[], &mut features).unwrap();

        assert!(features.frequency_data.iter().all(|&b| b == 0));
        assert!(features.time_domain_data.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        // 1 kHz at 32 kHz with N=256 lands exactly on bin 8
        let mut analyser = Analyser::new(256, 0.0, -100.0, 0.0).unwrap();
        let mut features = AudioFeatures::silent(256);
        analyser.analyse(&sine(1000.0, 32000.0, 256), &mut features).unwrap();

        let peak = features
            .frequency_data
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 8);
        assert!(features.frequency_data[8] > features.frequency_data[9]);
        assert!(features.frequency_data[100] < features.frequency_data[8]);
    }

    #[test]
    fn test_smoothing_carries_history() {
        let mut analyser = Analyser::new(256, 0.8, -100.0, -30.0).unwrap();
        let mut features = AudioFeatures::silent(256);
        let tone = sine(1000.0, 32000.0, 256);

        analyser.analyse(&tone, &mut features).unwrap();
        analyser.analyse(&[], &mut features).unwrap();
        assert!(features.frequency_data[8] > 0);

        analyser.reset();
        analyser.analyse(&[], &mut features).unwrap();
        assert_eq!(features.frequency_data[8], 0);
    }

    #[test]
    fn test_time_domain_bytes() {
        let mut analyser = Analyser::new(32, 0.8, -100.0, -30.0).unwrap();
        let mut features = AudioFeatures::silent(32);
        analyser.analyse(&[1.0, -1.0, 0.5], &mut features).unwrap();

        let tail = &features.time_domain_data[29..];
        assert_eq!(tail, &[255, 0, 192]);
        assert_eq!(features.time_domain_data[0], 128);
    }
}
