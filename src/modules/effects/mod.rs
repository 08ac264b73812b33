//! Post-processing effects. Each one transforms what the layers before it
//! have already drawn, at the moment its own `draw` runs.

pub mod blur;
pub mod color_filter;
pub mod kaleidoscope;

pub use blur::{BlurConfig, BlurModule};
pub use color_filter::{ColorFilterConfig, ColorFilterModule};
pub use kaleidoscope::{KaleidoscopeConfig, KaleidoscopeModule};
