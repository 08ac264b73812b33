//! Animated GIF export of rendered frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gif::{Encoder, Frame, Repeat};
use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Result, SurfaceError};
use crate::studio::Studio;
use crate::surface::Surface;

/// NeuQuant sampling speed, 1 (best) to 30 (fastest)
const QUANTIZE_SPEED: i32 = 10;

/// Buffers studio frames and encodes them as a looping GIF
pub struct GifRecorder {
    frames: Vec<Vec<u8>>,
    width: u16,
    height: u16,
    /// Frame delay in hundredths of a second
    delay: u16,
    max_frames: usize,
}

impl GifRecorder {
    /// Create a recorder for frames of one size
    ///
    /// GIF dimensions are 16-bit, so larger canvases are rejected here.
    pub fn new(width: u32, height: u32, fps: f64, max_frames: usize) -> Result<Self> {
        let too_large = || SurfaceError::ExportFailed {
            reason: format!("{}x{} exceeds the GIF size limit", width, height),
        };
        let width = u16::try_from(width).map_err(|_| too_large())?;
        let height = u16::try_from(height).map_err(|_| too_large())?;

        let delay = if fps.is_finite() && fps > 0.0 {
            (100.0 / fps).round().clamp(1.0, u16::MAX as f64) as u16
        } else {
            1
        };

        Ok(Self {
            frames: Vec::with_capacity(max_frames.min(1000)),
            width,
            height,
            delay,
            max_frames,
        })
    }

    /// Buffer one frame; returns `false` when it was not kept
    pub fn add_frame(&mut self, image: &RgbaImage) -> bool {
        if self.frames.len() >= self.max_frames {
            return false;
        }
        if image.dimensions() != (self.width as u32, self.height as u32) {
            warn!(
                "Dropping {}x{} frame from a {}x{} recording",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
            return false;
        }

        self.frames.push(image.as_raw().clone());
        true
    }

    /// Buffer the studio's current surface
    pub fn capture<S: Surface>(&mut self, studio: &Studio<S>) -> Result<bool> {
        let image = studio.surface().to_image().ok_or(SurfaceError::ExportUnsupported)?;
        Ok(self.add_frame(&image))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn delay(&self) -> u16 {
        self.delay
    }

    /// Encode every buffered frame into `writer`
    pub fn encode<W: Write>(&self, writer: W) -> Result<()> {
        let export_error = |e: gif::EncodingError| SurfaceError::ExportFailed {
            reason: e.to_string(),
        };

        // Palette quantization dominates, so it runs per frame in parallel
        let frames: Vec<Frame<'static>> = self
            .frames
            .par_iter()
            .map(|pixels| {
                let mut pixels = pixels.clone();
                let mut frame =
                    Frame::from_rgba_speed(self.width, self.height, &mut pixels, QUANTIZE_SPEED);
                frame.delay = self.delay;
                frame
            })
            .collect();

        let mut encoder = Encoder::new(writer, self.width, self.height, &[]).map_err(export_error)?;
        encoder.set_repeat(Repeat::Infinite).map_err(export_error)?;
        for frame in &frames {
            encoder.write_frame(frame).map_err(export_error)?;
        }

        debug!("Encoded {} GIF frames", frames.len());
        Ok(())
    }

    /// Encode to a file, returning its size in bytes
    pub fn encode_to_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        if self.frames.is_empty() {
            return Err(SurfaceError::ExportFailed {
                reason: "no frames recorded".to_string(),
            }
            .into());
        }

        let mut writer = BufWriter::new(File::create(path)?);
        self.encode(&mut writer)?;
        writer.flush()?;
        drop(writer);

        let size = std::fs::metadata(path)?.len();
        info!("Wrote {} frames to {:?} ({} bytes)", self.frames.len(), path, size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleFactory;
    use crate::surface::{RasterSurface, RecordingSurface};
    use tempfile::tempdir;

    #[test]
    fn test_delay_from_fps() {
        assert_eq!(GifRecorder::new(10, 10, 25.0, 5).unwrap().delay(), 4);
        assert_eq!(GifRecorder::new(10, 10, 1000.0, 5).unwrap().delay(), 1);
        assert!(GifRecorder::new(70_000, 10, 25.0, 5).is_err());
    }

    #[test]
    fn test_frame_limit_and_size_check() {
        let mut recorder = GifRecorder::new(4, 4, 10.0, 2).unwrap();
        assert!(!recorder.add_frame(&RgbaImage::new(5, 4)));
        assert!(recorder.add_frame(&RgbaImage::new(4, 4)));
        assert!(recorder.add_frame(&RgbaImage::new(4, 4)));
        assert!(!recorder.add_frame(&RgbaImage::new(4, 4)));
        assert_eq!(recorder.frame_count(), 2);
    }

    #[test]
    fn test_capture_needs_pixels() {
        let studio = Studio::new(RecordingSurface::new(4, 4).unwrap(), ModuleFactory::with_seed(0)).unwrap();
        let mut recorder = GifRecorder::new(4, 4, 10.0, 2).unwrap();
        assert!(recorder.capture(&studio).is_err());
    }

    #[test]
    fn test_encode_studio_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loop.gif");

        let mut studio = Studio::new(RasterSurface::new(24, 16).unwrap(), ModuleFactory::with_seed(2)).unwrap();
        studio.add_module("squares").unwrap();
        studio.start();

        let mut recorder = GifRecorder::new(24, 16, 20.0, 10).unwrap();
        for _ in 0..3 {
            studio.tick();
            assert!(recorder.capture(&studio).unwrap());
        }

        let size = recorder.encode_to_file(&path).unwrap();
        assert!(size > 0);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
    }

    #[test]
    fn test_empty_recording_is_error() {
        let dir = tempdir().unwrap();
        let recorder = GifRecorder::new(4, 4, 10.0, 2).unwrap();
        assert!(recorder.encode_to_file(dir.path().join("empty.gif")).is_err());
    }
}
