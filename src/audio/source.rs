use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::audio::analyser::Analyser;
use crate::audio::types::{AudioData, AudioFeatures};
use crate::error::Result;

/// Something that can fill an [`AudioFeatures`] snapshot once per tick
pub trait AudioFeatureSource: Send {
    /// FFT size of the produced snapshot
    fn fft_size(&self) -> usize;

    /// Overwrite `features` with the latest analysis
    fn capture(&mut self, features: &mut AudioFeatures) -> Result<()>;
}

/// Plays decoded audio through an [`Analyser`], one video frame per capture
pub struct ClipSource {
    samples: Vec<f32>,
    position: usize,
    step: usize,
    analyser: Analyser,
}

impl ClipSource {
    pub fn new(audio: &AudioData, fps: f64, analyser: Analyser) -> Self {
        let step = if fps > 0.0 { (audio.sample_rate as f64 / fps).round() as usize } else { 0 };
        Self {
            samples: audio.mono_samples(),
            position: 0,
            step: step.max(1),
            analyser,
        }
    }

    /// Playback position in samples
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl AudioFeatureSource for ClipSource {
    fn fft_size(&self) -> usize {
        self.analyser.fft_size()
    }

    fn capture(&mut self, features: &mut AudioFeatures) -> Result<()> {
        self.position = self.position.saturating_add(self.step);
        // Past the end the analyser sees silence and smoothing decays
        let window = self.samples.get(..self.position).unwrap_or(&[]);
        self.analyser.analyse(window, features)
    }
}

/// Cloneable handle that producers push mono samples into
#[derive(Clone)]
pub struct SampleFeed {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Append samples, dropping the oldest beyond capacity
    pub fn push(&self, samples: &[f32]) {
        let Ok(mut buffer) = self.buffer.lock() else {
            warn!("Sample feed lock poisoned; dropping {} samples", samples.len());
            return;
        };
        buffer.extend(samples.iter().copied());
        let excess = buffer.len().saturating_sub(self.capacity);
        buffer.drain(..excess);
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn copy_recent(&self, out: &mut Vec<f32>) {
        out.clear();
        if let Ok(buffer) = self.buffer.lock() {
            out.extend(buffer.iter().copied());
        }
    }
}

/// Analyses the most recent window of a [`SampleFeed`]
pub struct FeedSource {
    feed: SampleFeed,
    analyser: Analyser,
    scratch: Vec<f32>,
}

impl FeedSource {
    pub fn new(feed: SampleFeed, analyser: Analyser) -> Self {
        Self { feed, analyser, scratch: Vec::new() }
    }

    /// Feed sized to exactly one analysis window, paired with its source
    pub fn with_window(analyser: Analyser) -> (SampleFeed, Self) {
        let feed = SampleFeed::new(analyser.fft_size());
        (feed.clone(), Self::new(feed, analyser))
    }
}

impl AudioFeatureSource for FeedSource {
    fn fft_size(&self) -> usize {
        self.analyser.fft_size()
    }

    fn capture(&mut self, features: &mut AudioFeatures) -> Result<()> {
        self.feed.copy_recent(&mut self.scratch);
        self.analyser.analyse(&self.scratch, features)
    }
}
