//! # Studio
//!
//! The Studio owns the drawing surface and an ordered stack of layers. Each
//! tick clears the surface (unless frames are preserved), refreshes the audio
//! snapshot, then updates and draws every enabled layer in order.
//!
//! ```rust
//! use art_studio::modules::{ModuleFactory, ModuleSpec};
//! use art_studio::studio::Studio;
//! use art_studio::surface::RecordingSurface;
//!
//! let surface = RecordingSurface::new(320, 240).unwrap();
//! let mut studio = Studio::new(surface, ModuleFactory::with_seed(1)).unwrap();
//! studio.add_module(ModuleSpec::from("circles").with("count", 3)).unwrap();
//! studio.start();
//! studio.advance(10);
//!
//! let exported = studio.export_composition();
//! assert_eq!(exported.modules[0].kind, "circles");
//! ```

pub mod composition;
pub mod engine;
pub mod runner;

pub use composition::{CanvasSize, Composition};
pub use engine::{ExportFormat, Layer, LoadReport, ModuleId, RunState, SkippedEntry, Studio};
pub use runner::{run, RunOptions};
