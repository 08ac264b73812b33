//! # Art Studio
//!
//! Compose generative artwork from independent visual modules drawn in layers,
//! optionally driven by live audio analysis.
//!
//! The library provides a layer stack ([`Studio`]), a catalogue of 17 module
//! types created by tag ([`ModuleFactory`]), a software rasterizer, audio
//! feature extraction, and composition save/load.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use art_studio::{
//!     config::Config,
//!     modules::ModuleSpec,
//!     studio::{ExportFormat, Studio},
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut studio = Studio::from_config(&Config::default())?;
//! studio.add_module("noise")?;
//! studio.add_module(ModuleSpec::from("spirograph").with("R", 120.0))?;
//! studio.add_module("kaleidoscope")?;
//!
//! studio.start();
//! studio.advance(60);
//! std::fs::write("frame.png", studio.export_image(ExportFormat::Png)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`modules`] - The module contract, built-in module types and the factory
//! - [`studio`] - Layer stack, frame loop and composition records
//! - [`surface`] - Canvas-style drawing surfaces
//! - [`audio`] - Audio decoding and spectrum analysis
//! - [`config`] - Configuration management
//!
//! ## Custom Modules
//!
//! Implement [`Module`](modules::Module) and register a constructor with the
//! factory:
//!
//! ```rust,no_run
//! use art_studio::audio::AudioFeatures;
//! use art_studio::modules::{ConfigValue, Module, ModuleFactory, ModuleSpec};
//! use art_studio::surface::{Rgba, Surface};
//! use art_studio::Result;
//!
//! struct Backdrop;
//!
//! impl Module for Backdrop {
//!     fn kind(&self) -> &str {
//!         "backdrop"
//!     }
//!
//!     fn draw(
//!         &self,
//!         surface: &mut dyn Surface,
//!         width: f64,
//!         height: f64,
//!         _audio: Option<&AudioFeatures>,
//!     ) {
//!         surface.set_fill_color(Rgba::rgb(20, 20, 40));
//!         surface.fill_rect(0.0, 0.0, width, height);
//!     }
//!
//!     fn serialize(&self) -> ModuleSpec {
//!         ModuleSpec::from("backdrop")
//!     }
//!
//!     fn update_config(&mut self, _key: &str, _value: ConfigValue) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut factory = ModuleFactory::new();
//! factory.register("backdrop", |_, _| Ok(Box::new(Backdrop) as Box<dyn Module>));
//! ```

pub mod audio;
pub mod config;
pub mod error;
#[cfg(feature = "gif")]
pub mod export;
pub mod modules;
pub mod studio;
pub mod surface;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, StudioError},
    modules::{Module, ModuleFactory, ModuleKind, ModuleSpec},
    studio::{Composition, ModuleId, Studio},
};
