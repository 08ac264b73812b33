use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audio::{AudioFeatureSource, AudioPipeline};
use crate::config::Config;
use crate::error::{CompositionError, ModuleError, Result, StudioError, SurfaceError};
use crate::modules::{Module, ModuleFactory, ModuleSpec};
use crate::studio::composition::Composition;
use crate::surface::{RasterSurface, Rgba, Surface};

/// Quality used for JPEG export, matching the browser default for canvases
const JPEG_QUALITY: u8 = 92;

/// Identity assigned to a layer when it is added
///
/// Identities increase monotonically and are never handed out twice by the
/// same Studio, even across [`Studio::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module_{}", self.0)
    }
}

/// A module in the Studio's draw order
pub struct Layer {
    id: ModuleId,
    /// Disabled layers are skipped entirely: no update, no draw
    pub enabled: bool,
    module: Box<dyn Module>,
}

impl Layer {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn kind(&self) -> &str {
        self.module.kind()
    }

    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    pub fn module_mut(&mut self) -> &mut dyn Module {
        self.module.as_mut()
    }

    pub fn serialize(&self) -> ModuleSpec {
        self.module.serialize()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

/// Image encodings supported by [`Studio::export_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Pick a format from a file extension, case-insensitively
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Composition entry that could not be added
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Position in the record's `modules` array
    pub index: usize,
    pub reason: String,
}

/// Outcome of [`Studio::load_composition`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: Vec<ModuleId>,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Ordered layer stack drawn onto one surface, one tick at a time
///
/// The Studio never schedules itself. Callers drive it with [`Studio::tick`],
/// either directly or through [`crate::studio::run`].
pub struct Studio<S: Surface = RasterSurface> {
    surface: S,
    factory: ModuleFactory,
    layers: Vec<Layer>,
    state: RunState,
    tick: u64,
    next_id: u64,
    preserve_frames: bool,
    background: Option<Rgba>,
    audio: Option<AudioPipeline>,
}

impl Studio<RasterSurface> {
    /// Build a rasterizing Studio from validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let surface = RasterSurface::new(config.canvas.width, config.canvas.height)?;
        let factory = match config.animation.seed {
            Some(seed) => ModuleFactory::with_seed(seed),
            None => ModuleFactory::new(),
        };

        let mut studio = Self::new(surface, factory)?;
        studio.set_preserve_frames(config.canvas.preserve_frames);
        if let Some(background) = &config.canvas.background {
            match Rgba::parse(background) {
                Some(color) => studio.set_background(Some(color)),
                None => warn!("Ignoring unreadable background color '{}'", background),
            }
        }
        Ok(studio)
    }
}

impl<S: Surface> Studio<S> {
    /// Create a stopped Studio with no layers
    pub fn new(surface: S, factory: ModuleFactory) -> Result<Self> {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return Err(SurfaceError::Unavailable { width, height }.into());
        }

        info!("Studio ready on a {}x{} surface", width, height);
        Ok(Self {
            surface,
            factory,
            layers: Vec::new(),
            state: RunState::Stopped,
            tick: 0,
            next_id: 1,
            preserve_frames: false,
            background: None,
            audio: None,
        })
    }

    pub fn start(&mut self) {
        if self.state == RunState::Running {
            return;
        }
        self.state = RunState::Running;
        info!("Studio started at tick {}", self.tick);
    }

    pub fn stop(&mut self) {
        if self.state == RunState::Stopped {
            return;
        }
        self.state = RunState::Stopped;
        info!("Studio stopped at tick {}", self.tick);
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Render one frame
    ///
    /// Returns `false` without touching anything when the Studio is stopped.
    pub fn tick(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }

        self.tick += 1;
        if let Some(audio) = &mut self.audio {
            audio.refresh();
        }

        if !self.preserve_frames {
            self.surface.clear();
            self.paint_background();
        }

        let width = self.surface.width() as f64;
        let height = self.surface.height() as f64;
        let audio = self.audio.as_ref().map(AudioPipeline::features);

        for layer in self.layers.iter_mut().filter(|layer| layer.enabled) {
            self.surface.save();
            layer.module.update(self.tick);
            layer.module.draw(&mut self.surface, width, height, audio);
            self.surface.restore();
        }

        true
    }

    /// Run up to `frames` ticks, returning how many ran
    pub fn advance(&mut self, frames: u64) -> u64 {
        let mut ran = 0;
        while ran < frames && self.tick() {
            ran += 1;
        }
        ran
    }

    fn paint_background(&mut self) {
        let Some(color) = self.background else { return };
        let width = self.surface.width() as f64;
        let height = self.surface.height() as f64;

        self.surface.save();
        self.surface.set_fill_color(color);
        self.surface.fill_rect(0.0, 0.0, width, height);
        self.surface.restore();
    }

    /// Construct a module and append it as the top layer
    pub fn add_module(&mut self, spec: impl Into<ModuleSpec>) -> Result<&mut Layer> {
        let spec = spec.into();
        let module = self.factory.create(&spec)?;
        let id = ModuleId(self.next_id);
        self.next_id += 1;

        debug!("Added {} ({}) at position {}", id, spec.kind, self.layers.len());
        self.layers.push(Layer {
            id,
            enabled: true,
            module,
        });

        let index = self.layers.len() - 1;
        Ok(&mut self.layers[index])
    }

    /// Remove a layer; returns whether one was removed
    pub fn remove_module(&mut self, id: ModuleId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let layer = self.layers.remove(index);
        debug!("Removed {} ({})", id, layer.kind());
        true
    }

    pub fn get_module(&self, id: ModuleId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn get_module_mut(&mut self, id: ModuleId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    /// Index of a layer in draw order
    pub fn position(&self, id: ModuleId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    /// Move the layer at `from` so that it ends up at `to`
    pub fn reorder_modules(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.layers.len();
        for index in [from, to] {
            if index >= len {
                return Err(CompositionError::IndexOutOfRange { index, len }.into());
            }
        }

        let layer = self.layers.remove(from);
        debug!("Moved {} from position {} to {}", layer.id, from, to);
        self.layers.insert(to, layer);
        Ok(())
    }

    /// Rebuild a layer's pre-generated state from the factory's random stream
    pub fn regenerate_module(&mut self, id: ModuleId) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) else {
            return false;
        };
        layer.module.regenerate(self.factory.rng_mut());
        debug!("Regenerated {} ({})", id, layer.module.kind());
        true
    }

    /// Wipe the surface and drop every layer; identities keep counting
    pub fn clear(&mut self) {
        self.surface.clear();
        self.layers.clear();
        self.tick = 0;
        debug!("Studio cleared");
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Reallocate the surface between ticks
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(width, height)?;
        info!("Surface resized to {}x{}", width, height);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    /// Keep previous frames instead of clearing at the start of each tick
    pub fn set_preserve_frames(&mut self, preserve: bool) {
        self.preserve_frames = preserve;
    }

    pub fn preserve_frames(&self) -> bool {
        self.preserve_frames
    }

    /// Color painted after each clear; `None` leaves the surface transparent
    pub fn set_background(&mut self, color: Option<Rgba>) {
        self.background = color;
    }

    /// Install the audio source; only the first call has any effect
    pub fn enable_audio_reactivity(&mut self, source: Box<dyn AudioFeatureSource>) -> bool {
        if self.audio.is_some() {
            debug!("Audio reactivity already enabled; ignoring new source");
            return false;
        }
        info!("Audio reactivity enabled (fft size {})", source.fft_size());
        self.audio = Some(AudioPipeline::new(source));
        true
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio.is_some()
    }

    /// Encode the current surface contents
    pub fn export_image(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let image = self.surface.to_image().ok_or(SurfaceError::ExportUnsupported)?;
        let image = match format {
            ExportFormat::Png => DynamicImage::ImageRgba8(image),
            // JPEG has no alpha channel
            ExportFormat::Jpeg => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8())
            }
        };
        let output = match format {
            ExportFormat::Png => ImageOutputFormat::Png,
            ExportFormat::Jpeg => ImageOutputFormat::Jpeg(JPEG_QUALITY),
        };

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), output)
            .map_err(|e| SurfaceError::ExportFailed { reason: e.to_string() })?;

        debug!("Exported {} bytes as {:?}", bytes.len(), format);
        Ok(bytes)
    }

    /// Snapshot every layer in draw order, disabled ones included
    pub fn export_composition(&self) -> Composition {
        let modules = self.layers.iter().map(Layer::serialize).collect();
        let (width, height) = self.size();
        info!("Exported composition with {} modules", self.layers.len());
        Composition::new(modules, width, height)
    }

    /// Replace every layer with the entries of a composition record
    ///
    /// A record without a `modules` array is rejected before anything
    /// changes. Entries that fail to build are skipped and listed in the
    /// report; the rest load in order.
    pub fn load_composition(&mut self, data: &Value) -> Result<LoadReport> {
        let entries = Composition::validate(data)?;

        self.clear();
        let mut report = LoadReport::default();
        for (index, entry) in entries.iter().enumerate() {
            let added = serde_json::from_value::<ModuleSpec>(entry.clone())
                .map_err(|e| StudioError::from(ModuleError::InvalidSpec { reason: e.to_string() }))
                .and_then(|spec| self.add_module(spec).map(|layer| layer.id()));

            match added {
                Ok(id) => report.loaded.push(id),
                Err(e) => {
                    warn!("Skipping composition entry {}: {}", index, e);
                    report.skipped.push(SkippedEntry {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Loaded composition: {} modules, {} skipped",
            report.loaded.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Parse and load a composition from JSON text
    pub fn load_composition_str(&mut self, text: &str) -> Result<LoadReport> {
        let data = Composition::parse(text)?;
        self.load_composition(&data)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn factory(&self) -> &ModuleFactory {
        &self.factory
    }

    /// Factory access, for registering custom module types
    pub fn factory_mut(&mut self) -> &mut ModuleFactory {
        &mut self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Analyser, FeedSource};
    use crate::modules::ConfigValue;
    use crate::surface::{DrawOp, RecordingSurface};
    use serde_json::json;

    fn studio() -> Studio<RecordingSurface> {
        Studio::new(RecordingSurface::new(200, 100).unwrap(), ModuleFactory::with_seed(7)).unwrap()
    }

    fn kinds(studio: &Studio<RecordingSurface>) -> Vec<String> {
        studio.layers().iter().map(|l| l.kind().to_string()).collect()
    }

    #[test]
    fn test_tick_requires_running() {
        let mut studio = studio();
        studio.add_module("waves").unwrap();

        assert!(!studio.tick());
        assert_eq!(studio.tick_count(), 0);
        assert!(studio.surface().ops().is_empty());

        studio.start();
        studio.start();
        assert!(studio.tick());
        assert_eq!(studio.tick_count(), 1);

        studio.stop();
        assert!(!studio.tick());
        assert_eq!(studio.advance(5), 0);
    }

    #[test]
    fn test_tick_clears_then_wraps_each_layer() {
        let mut studio = studio();
        studio.add_module("audio-bars").unwrap();
        studio.add_module("radial-spectrum").unwrap();
        studio.start();
        studio.tick();

        assert_eq!(
            studio.surface().ops(),
            &[DrawOp::Clear, DrawOp::Save, DrawOp::Restore, DrawOp::Save, DrawOp::Restore]
        );
    }

    #[test]
    fn test_preserve_frames_skips_clear() {
        let mut studio = studio();
        studio.set_preserve_frames(true);
        studio.start();
        studio.tick();
        assert!(studio.surface().ops().is_empty());
    }

    #[test]
    fn test_background_painted_after_clear() {
        let mut studio = studio();
        studio.set_background(Some(Rgba::BLACK));
        studio.start();
        studio.tick();

        let ops = studio.surface().ops();
        assert_eq!(ops[0], DrawOp::Clear);
        assert!(ops.contains(&DrawOp::FillRect { x: 0.0, y: 0.0, width: 200.0, height: 100.0 }));
    }

    #[test]
    fn test_disabled_layers_skipped() {
        let mut studio = studio();
        let id = studio.add_module("audio-bars").unwrap().id();
        studio.get_module_mut(id).unwrap().enabled = false;
        studio.start();
        studio.tick();
        assert_eq!(studio.surface().ops(), &[DrawOp::Clear]);
    }

    #[test]
    fn test_ids_are_unique_across_clear() {
        let mut studio = studio();
        let a = studio.add_module("waves").unwrap().id();
        let b = studio.add_module("noise").unwrap().id();
        assert_ne!(a, b);

        studio.clear();
        let c = studio.add_module("waves").unwrap().id();
        assert!(c > b);
        assert_eq!(c.to_string(), "module_3");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut studio = studio();
        let id = studio.add_module("waves").unwrap().id();
        assert!(studio.remove_module(id));
        assert!(!studio.remove_module(id));
        assert!(studio.layers().is_empty());
    }

    #[test]
    fn test_reorder_out_of_range_leaves_order() {
        let mut studio = studio();
        for kind in ["waves", "noise", "blur"] {
            studio.add_module(kind).unwrap();
        }

        let err = studio.reorder_modules(0, 3).unwrap_err();
        assert!(matches!(
            err,
            StudioError::Composition(CompositionError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(kinds(&studio), ["waves", "noise", "blur"]);

        studio.reorder_modules(2, 0).unwrap();
        assert_eq!(kinds(&studio), ["blur", "waves", "noise"]);
    }

    #[test]
    fn test_clear_resets_ticks_and_layers() {
        let mut studio = studio();
        studio.add_module("waves").unwrap();
        studio.start();
        studio.advance(3);
        assert_eq!(studio.tick_count(), 3);

        studio.clear();
        assert_eq!(studio.tick_count(), 0);
        assert!(studio.layers().is_empty());
        assert!(studio.is_running());
    }

    #[test]
    fn test_malformed_record_changes_nothing() {
        let mut studio = studio();
        studio.add_module("waves").unwrap();

        assert!(studio.load_composition(&json!({"canvasSize": {"width": 1, "height": 1}})).is_err());
        assert!(studio.load_composition(&json!("waves")).is_err());
        assert!(studio.load_composition_str("not json").is_err());
        assert_eq!(kinds(&studio), ["waves"]);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let mut studio = studio();
        let report = studio
            .load_composition(&json!({
                "modules": [
                    {"type": "circles", "config": {"count": 2}},
                    {"type": "circles", "config": {"count": "many"}},
                    42,
                    "kaleidoscope"
                ]
            }))
            .unwrap();

        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.skipped.iter().map(|s| s.index).collect::<Vec<_>>(), vec![1, 2]);
        assert!(!report.is_complete());
        assert_eq!(kinds(&studio), ["circles", "kaleidoscope"]);
    }

    #[test]
    fn test_audio_enabled_once() {
        let mut studio = studio();
        let (_, first) = FeedSource::with_window(Analyser::new(64, 0.0, -100.0, -30.0).unwrap());
        let (_, second) = FeedSource::with_window(Analyser::new(64, 0.0, -100.0, -30.0).unwrap());

        assert!(studio.enable_audio_reactivity(Box::new(first)));
        assert!(!studio.enable_audio_reactivity(Box::new(second)));
        assert!(studio.audio_enabled());
    }

    #[test]
    fn test_audio_bars_draw_with_audio() {
        let mut studio = studio();
        let (_, source) = FeedSource::with_window(Analyser::new(64, 0.0, -100.0, -30.0).unwrap());
        studio.enable_audio_reactivity(Box::new(source));
        studio.add_module("audio-bars").unwrap();
        studio.start();
        studio.tick();

        let rects = studio
            .surface()
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { .. }))
            .count();
        assert!(rects > 0);
    }

    #[test]
    fn test_update_config_through_layer() {
        let mut studio = studio();
        let id = studio.add_module("blur").unwrap().id();
        studio
            .get_module_mut(id)
            .unwrap()
            .module_mut()
            .update_config("amount", ConfigValue::Float(1.5))
            .unwrap();

        let exported = studio.export_composition();
        assert_eq!(exported.modules[0].config["amount"], ConfigValue::Float(1.5));
    }

    #[test]
    fn test_regenerate_module() {
        let mut studio = studio();
        let id = studio.add_module("triangles").unwrap().id();
        assert!(studio.regenerate_module(id));

        studio.remove_module(id);
        assert!(!studio.regenerate_module(id));
    }

    #[test]
    fn test_export_image_needs_pixels() {
        let studio = studio();
        assert!(matches!(
            studio.export_image(ExportFormat::Png),
            Err(StudioError::Surface(SurfaceError::ExportUnsupported))
        ));
    }

    #[test]
    fn test_export_png_and_jpeg() {
        let mut studio =
            Studio::new(RasterSurface::new(32, 24).unwrap(), ModuleFactory::with_seed(1)).unwrap();
        studio.add_module("circles").unwrap();
        studio.start();
        studio.tick();

        let png = studio.export_image(ExportFormat::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));

        let jpeg = studio.export_image(ExportFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.canvas.width = 64;
        config.canvas.height = 48;
        config.canvas.preserve_frames = true;
        config.canvas.background = Some("not-a-color".to_string());
        config.animation.seed = Some(3);

        let studio = Studio::from_config(&config).unwrap();
        assert_eq!(studio.size(), (64, 48));
        assert!(studio.preserve_frames());

        config.canvas.width = 0;
        assert!(Studio::from_config(&config).is_err());
    }

    #[test]
    fn test_export_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("PNG"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_extension("jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("gif"), None);
    }
}
