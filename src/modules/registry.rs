use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::error::Result;
use crate::modules::effects::{BlurModule, ColorFilterModule, KaleidoscopeModule};
use crate::modules::generators::{
    CircleModule, FractalModule, LineModule, NoiseModule, ParticleModule, SpirographModule,
    WaveModule,
};
use crate::modules::reactive::{AudioBarsModule, RadialSpectrumModule};
use crate::modules::shapes::{
    HexagonModule, PolygonModule, SquareModule, StarModule, TriangleModule,
};
use crate::modules::traits::{ConfigMap, Module, ModuleSpec};
use crate::modules::{BaseModule, ModuleKind};

/// Builds a module from its option overrides and the factory's random stream
pub type Constructor =
    Box<dyn Fn(&ConfigMap, &mut dyn RngCore) -> Result<Box<dyn Module>> + Send + Sync>;

/// Registry mapping type tags to module constructors
///
/// Built-in types are registered up front. Unknown tags are not an error:
/// they produce a [`BaseModule`] that keeps the tag and draws nothing.
/// The factory owns the random stream used by randomized modules, so a
/// seeded factory generates the same layers every run.
pub struct ModuleFactory {
    constructors: HashMap<String, Constructor>,
    rng: SmallRng,
}

impl ModuleFactory {
    /// Create a factory with all built-in types and an entropy-seeded stream
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Create a factory whose random stream starts from `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
            rng,
        };
        factory.register_builtin_modules();
        factory
    }

    fn register_builtin_modules(&mut self) {
        for kind in ModuleKind::ALL {
            self.constructors.insert(kind.tag().to_string(), builtin(kind));
        }
    }

    /// Register a custom module type, replacing any existing constructor
    ///
    /// # Arguments
    ///
    /// * `tag` - Type tag used in module specs
    /// * `constructor` - Function that creates new instances of the module
    pub fn register<F>(&mut self, tag: impl Into<String>, constructor: F)
    where
        F: Fn(&ConfigMap, &mut dyn RngCore) -> Result<Box<dyn Module>> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Box::new(constructor));
    }

    /// Instantiate the module described by `spec`
    ///
    /// Fails only when an override has the wrong type for a declared option.
    pub fn create(&mut self, spec: &ModuleSpec) -> Result<Box<dyn Module>> {
        match self.constructors.get(&spec.kind) {
            Some(constructor) => constructor(&spec.config, &mut self.rng),
            None => Ok(Box::new(BaseModule::new(&spec.kind, &spec.config))),
        }
    }

    /// Default option map of a registered type
    pub fn defaults(&self, tag: &str) -> Option<ConfigMap> {
        let constructor = self.constructors.get(tag)?;
        let mut rng = SmallRng::seed_from_u64(0);
        match constructor(&ConfigMap::new(), &mut rng) {
            Ok(module) => Some(module.serialize().config),
            Err(e) => {
                debug!("Constructor for '{}' rejected empty options: {}", tag, e);
                None
            }
        }
    }

    /// All registered type tags, sorted
    pub fn available_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.constructors.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn has_type(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Get the number of registered types
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Random stream shared with [`Module::regenerate`]
    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

impl Default for ModuleFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn ctor<F>(constructor: F) -> Constructor
where
    F: Fn(&ConfigMap, &mut dyn RngCore) -> Result<Box<dyn Module>> + Send + Sync + 'static,
{
    Box::new(constructor)
}

fn boxed<M: Module + 'static>(module: Result<M>) -> Result<Box<dyn Module>> {
    module.map(|m| Box::new(m) as Box<dyn Module>)
}

fn builtin(kind: ModuleKind) -> Constructor {
    match kind {
        ModuleKind::Particles => ctor(|c, rng| boxed(ParticleModule::new(c, rng))),
        ModuleKind::Waves => ctor(|c, _| boxed(WaveModule::new(c))),
        ModuleKind::Spirograph => ctor(|c, _| boxed(SpirographModule::new(c))),
        ModuleKind::Circles => ctor(|c, _| boxed(CircleModule::new(c))),
        ModuleKind::Lines => ctor(|c, _| boxed(LineModule::new(c))),
        ModuleKind::Noise => ctor(|c, _| boxed(NoiseModule::new(c))),
        ModuleKind::Fractals => ctor(|c, _| boxed(FractalModule::new(c))),
        ModuleKind::Triangles => ctor(|c, rng| boxed(TriangleModule::new(c, rng))),
        ModuleKind::Squares => ctor(|c, rng| boxed(SquareModule::new(c, rng))),
        ModuleKind::Stars => ctor(|c, rng| boxed(StarModule::new(c, rng))),
        ModuleKind::Polygons => ctor(|c, rng| boxed(PolygonModule::new(c, rng))),
        ModuleKind::Hexagons => ctor(|c, rng| boxed(HexagonModule::new(c, rng))),
        ModuleKind::AudioBars => ctor(|c, _| boxed(AudioBarsModule::new(c))),
        ModuleKind::RadialSpectrum => ctor(|c, _| boxed(RadialSpectrumModule::new(c))),
        ModuleKind::ColorFilter => ctor(|c, _| boxed(ColorFilterModule::new(c))),
        ModuleKind::Blur => ctor(|c, _| boxed(BlurModule::new(c))),
        ModuleKind::Kaleidoscope => ctor(|c, _| boxed(KaleidoscopeModule::new(c))),
    }
}
