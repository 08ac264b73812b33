//! Audio-reactive modules. Both draw nothing at all when no audio snapshot is
//! supplied.

pub mod bars;
pub mod radial;

pub use bars::{AudioBarsConfig, AudioBarsModule};
pub use radial::{RadialSpectrumConfig, RadialSpectrumModule};
