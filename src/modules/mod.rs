//! # Visual Modules
//!
//! Every layer of a composition is a [`Module`]: a generator, a shape field,
//! an audio-reactive visual or a post-processing effect. Modules are created
//! by tag through the [`ModuleFactory`].
//!
//! ## Built-in Modules
//!
//! - **Generators**: particles, waves, spirograph, circles, lines, noise, fractals
//! - **Shapes**: triangles, squares, stars, polygons, hexagons
//! - **Audio**: audio-bars, radial-spectrum
//! - **Effects**: color-filter, blur, kaleidoscope
//!
//! ## Usage
//!
//! ```rust
//! use art_studio::modules::{ModuleFactory, ModuleSpec};
//!
//! let mut factory = ModuleFactory::with_seed(7);
//! let module = factory.create(&ModuleSpec::from("circles").with("count", 3)).unwrap();
//! assert_eq!(module.serialize().kind, "circles");
//! ```

pub mod base;
pub mod effects;
pub mod generators;
pub mod options;
pub mod reactive;
pub mod registry;
pub mod shapes;
pub mod traits;

pub use base::BaseModule;
pub use options::{Appearance, FillType, ModuleOptions, ShapePattern};
pub use registry::ModuleFactory;
pub use traits::{ConfigMap, ConfigValue, Module, ModuleCategory, ModuleMetadata, ModuleSpec};

/// Closed set of built-in module types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Particles,
    Waves,
    Spirograph,
    Circles,
    Lines,
    Noise,
    Fractals,
    Triangles,
    Squares,
    Stars,
    Polygons,
    Hexagons,
    AudioBars,
    RadialSpectrum,
    ColorFilter,
    Blur,
    Kaleidoscope,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 17] = [
        ModuleKind::Particles,
        ModuleKind::Waves,
        ModuleKind::Spirograph,
        ModuleKind::Circles,
        ModuleKind::Lines,
        ModuleKind::Noise,
        ModuleKind::Fractals,
        ModuleKind::Triangles,
        ModuleKind::Squares,
        ModuleKind::Stars,
        ModuleKind::Polygons,
        ModuleKind::Hexagons,
        ModuleKind::AudioBars,
        ModuleKind::RadialSpectrum,
        ModuleKind::ColorFilter,
        ModuleKind::Blur,
        ModuleKind::Kaleidoscope,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ModuleKind::Particles => "particles",
            ModuleKind::Waves => "waves",
            ModuleKind::Spirograph => "spirograph",
            ModuleKind::Circles => "circles",
            ModuleKind::Lines => "lines",
            ModuleKind::Noise => "noise",
            ModuleKind::Fractals => "fractals",
            ModuleKind::Triangles => "triangles",
            ModuleKind::Squares => "squares",
            ModuleKind::Stars => "stars",
            ModuleKind::Polygons => "polygons",
            ModuleKind::Hexagons => "hexagons",
            ModuleKind::AudioBars => "audio-bars",
            ModuleKind::RadialSpectrum => "radial-spectrum",
            ModuleKind::ColorFilter => "color-filter",
            ModuleKind::Blur => "blur",
            ModuleKind::Kaleidoscope => "kaleidoscope",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    pub fn category(self) -> ModuleCategory {
        match self {
            ModuleKind::Particles
            | ModuleKind::Waves
            | ModuleKind::Spirograph
            | ModuleKind::Circles
            | ModuleKind::Lines
            | ModuleKind::Noise
            | ModuleKind::Fractals => ModuleCategory::Generator,
            ModuleKind::Triangles
            | ModuleKind::Squares
            | ModuleKind::Stars
            | ModuleKind::Polygons
            | ModuleKind::Hexagons => ModuleCategory::Shape,
            ModuleKind::AudioBars | ModuleKind::RadialSpectrum => ModuleCategory::Audio,
            ModuleKind::ColorFilter | ModuleKind::Blur | ModuleKind::Kaleidoscope => {
                ModuleCategory::Effect
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModuleKind::Particles => "Drifting particles that wrap at the canvas edges",
            ModuleKind::Waves => "Stacked sine waves scrolling horizontally",
            ModuleKind::Spirograph => "Hypotrochoid curve with an animated phase",
            ModuleKind::Circles => "Concentric rings rotating about the center",
            ModuleKind::Lines => "Radial line burst rotating about the center",
            ModuleKind::Noise => "Animated interference pattern on a 10px grid",
            ModuleKind::Fractals => "Binary branching tree growing from the bottom edge",
            ModuleKind::Triangles => "Field of equilateral triangles",
            ModuleKind::Squares => "Field of squares",
            ModuleKind::Stars => "Field of pointed stars",
            ModuleKind::Polygons => "Field of regular polygons",
            ModuleKind::Hexagons => "Hexagons in a random, grid or line pattern",
            ModuleKind::AudioBars => "Spectrum bars rising from the bottom edge",
            ModuleKind::RadialSpectrum => "Spectrum drawn as rays around a circle",
            ModuleKind::ColorFilter => "Hue, saturation and brightness adjustment",
            ModuleKind::Blur => "Gaussian blur of everything drawn below",
            ModuleKind::Kaleidoscope => "Rotational copies of the canvas about its center",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ModuleKind::from_tag("plasma"), None);
    }

    #[test]
    fn test_category_counts() {
        let count = |category| ModuleKind::ALL.iter().filter(|k| k.category() == category).count();
        assert_eq!(count(ModuleCategory::Generator) + count(ModuleCategory::Shape), 12);
        assert_eq!(count(ModuleCategory::Effect), 3);
        assert_eq!(count(ModuleCategory::Audio), 2);
    }
}
