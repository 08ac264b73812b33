//! Generators draw from configuration and their own animation state only.

pub mod circles;
pub mod fractals;
pub mod lines;
pub mod noise;
pub mod particles;
pub mod spirograph;
pub mod waves;

pub use circles::{CircleConfig, CircleModule};
pub use fractals::{FractalConfig, FractalModule};
pub use lines::{LineConfig, LineModule};
pub use noise::{NoiseConfig, NoiseModule};
pub use particles::{ParticleConfig, ParticleModule};
pub use spirograph::{SpirographConfig, SpirographModule};
pub use waves::{WaveConfig, WaveModule};
