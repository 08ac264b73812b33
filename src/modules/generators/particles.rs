use std::f64::consts::TAU;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, Appearance, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::{BlendMode, Surface};

/// Ticks of motion covered by a particle trail
const TRAIL_TICKS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleConfig {
    pub count: u32,
    pub size: f64,
    pub speed: f64,
    pub color: String,
    pub opacity: f64,
    pub trail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            size: 2.0,
            speed: 1.0,
            color: "#ffffff".to_string(),
            opacity: 0.8,
            trail: false,
            blend_mode: None,
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for ParticleConfig {
    const FIELDS: &'static [&'static str] = &[
        "count",
        "size",
        "speed",
        "color",
        "opacity",
        "trail",
    ];

    fn appearance(&self) -> Appearance {
        Appearance {
            opacity: Some(self.opacity),
            blend_mode: self.blend_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

/// Particles drifting in normalized coordinates, wrapping at the edges
pub struct ParticleModule {
    config: ParticleConfig,
    particles: Vec<Particle>,
}

impl ParticleModule {
    pub fn new(overrides: &ConfigMap, rng: &mut dyn RngCore) -> Result<Self> {
        let config = options::merge(ModuleKind::Particles.tag(), overrides)?;
        let mut module = Self { config, particles: Vec::new() };
        module.regenerate(rng);
        Ok(module)
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }
}

impl Module for ParticleModule {
    fn kind(&self) -> &str {
        ModuleKind::Particles.tag()
    }

    fn update(&mut self, _tick: u64) {
        for p in &mut self.particles {
            p.x += p.vx * 0.01;
            p.y += p.vy * 0.01;

            if p.x < 0.0 {
                p.x = 1.0;
            }
            if p.x > 1.0 {
                p.x = 0.0;
            }
            if p.y < 0.0 {
                p.y = 1.0;
            }
            if p.y > 1.0 {
                p.y = 0.0;
            }
        }
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        self.config.appearance().apply(surface);
        let color = options::color(&self.config.color);
        surface.set_fill_color(color);

        for p in &self.particles {
            surface.begin_path();
            surface.arc(p.x * width, p.y * height, self.config.size, 0.0, TAU);
            surface.fill();
        }

        if self.config.trail {
            surface.set_stroke_color(color);
            surface.set_line_width(self.config.size.max(1.0));
            for p in &self.particles {
                let (x, y) = (p.x * width, p.y * height);
                surface.begin_path();
                surface.move_to(x, y);
                surface.line_to(
                    x - p.vx * 0.01 * TRAIL_TICKS * width,
                    y - p.vy * 0.01 * TRAIL_TICKS * height,
                );
                surface.stroke();
            }
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, ModuleKind::Particles.tag(), key, value)
    }

    fn regenerate(&mut self, rng: &mut dyn RngCore) {
        let speed = self.config.speed;
        self.particles = (0..options::count(self.config.count))
            .map(|_| Particle {
                x: rng.gen(),
                y: rng.gen(),
                vx: (rng.gen::<f64>() - 0.5) * speed,
                vy: (rng.gen::<f64>() - 0.5) * speed,
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn module(overrides: ConfigMap) -> ParticleModule {
        ParticleModule::new(&overrides, &mut SmallRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let m = module(ConfigMap::new());
        assert_eq!(m.particle_count(), 100);
        assert_eq!(m.config().opacity, 0.8);
        assert!(!m.serialize().config.contains_key("blendMode"));
    }

    #[test]
    fn test_same_seed_same_particles() {
        let a = module(ConfigMap::new());
        let b = module(ConfigMap::new());
        assert_eq!(a.particles, b.particles);
    }

    #[test]
    fn test_particles_stay_in_unit_square() {
        let mut overrides = ConfigMap::new();
        overrides.insert("speed".into(), ConfigValue::Float(50.0));
        let mut m = module(overrides);

        for tick in 1..=200 {
            m.update(tick);
        }
        for p in &m.particles {
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_draw_uses_module_opacity() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(3));
        let m = module(overrides);
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);

        assert_eq!(surface.ops()[0], DrawOp::GlobalAlpha(0.8));
        assert_eq!(surface.primitive_count(), 3);
    }

    #[test]
    fn test_trail_adds_strokes() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(4));
        overrides.insert("trail".into(), ConfigValue::Bool(true));
        let m = module(overrides);
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);

        let strokes = surface.ops().iter().filter(|op| **op == DrawOp::Stroke).count();
        assert_eq!(strokes, 4);
    }

    #[test]
    fn test_count_is_clamped() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(1_000_000));
        assert_eq!(module(overrides).particle_count(), 10_000);
    }
}
