use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Audio file loader supporting multiple formats
///
/// Decoding runs on the blocking thread pool so a frame loop sharing the
/// runtime keeps ticking while a file is being read.
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file and return decoded samples
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref().to_path_buf();
        let extension = Self::detect_format(&path).unwrap_or_default();

        if !Self::is_format_supported(&extension) {
            return Err(AudioError::UnsupportedFormat { format: extension }.into());
        }

        let display = path.display().to_string();
        let data = tokio::task::spawn_blocking(move || Self::load_blocking(path, &extension))
            .await
            .map_err(|_| AudioError::LoadFailed { path: display })??;

        info!(
            "Loaded audio: {:.1}s, {} Hz, {} channels",
            data.duration, data.sample_rate, data.channels
        );
        Ok(data)
    }

    /// Decode synchronously; prefer [`AudioLoader::load`] inside async code
    pub fn load_blocking(path: PathBuf, extension: &str) -> Result<AudioData> {
        match extension {
            "wav" => Self::load_wav(path),
            _ => Self::load_with_symphonia(path),
        }
    }

    /// Load WAV files using the hound crate
    fn load_wav(path: PathBuf) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { path: path.display().to_string() };

        let reader = hound::WavReader::open(&path).map_err(|_| load_failed())?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| Self::int_to_float(v, bits)))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| load_failed())?
            }
        };

        Ok(Self::finish(path, samples, spec.sample_rate, spec.channels))
    }

    /// Load compressed formats using Symphonia
    fn load_with_symphonia(path: PathBuf) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { path: path.display().to_string() };

        let file = File::open(&path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;
        let track_id = track.id;

        let sample_rate =
            track.codec_params.sample_rate.ok_or_else(|| AudioError::InvalidParameters {
                details: "No sample rate found".to_string(),
            })?;
        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut buffer: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream surfaces as an IO error
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let buf = buffer.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                    });
                    if buf.capacity() < decoded.capacity() * decoded.spec().channels.count() {
                        *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    }
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(reason)) => {
                    debug!("Skipping undecodable packet: {}", reason);
                }
                Err(_) => break,
            }
        }

        Ok(Self::finish(path, samples, sample_rate, channels))
    }

    fn finish(path: PathBuf, samples: Vec<f32>, sample_rate: u32, channels: u16) -> AudioData {
        let duration = samples.len() as f64 / (sample_rate as f64 * channels.max(1) as f64);
        AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path,
        }
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => (sample as f32 - 128.0) / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0,
        }
    }

    /// Detect audio format from file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}
