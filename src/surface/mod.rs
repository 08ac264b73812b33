//! # Drawing Surfaces
//!
//! Modules draw through the [`Surface`] trait, a canvas-style immediate mode
//! API: a state stack (transform, alpha, blend mode, colors, line width), a
//! current path, and a handful of primitives.
//!
//! - [`RasterSurface`] rasterizes with anti-aliasing into an RGBA pixmap and
//!   can export PNG/JPEG images.
//! - [`RecordingSurface`] keeps the issued operations instead of pixels, which
//!   is what headless inspection and the test suites use.

pub mod raster;
pub mod recording;
pub mod types;

pub use raster::RasterSurface;
pub use recording::{DrawOp, RecordingSurface};
pub use types::{BlendMode, ColorMatrix, Filter, Rgba, Snapshot};

use image::RgbaImage;

use crate::error::Result;

/// Canvas-style 2D drawing surface
///
/// Path coordinates are mapped through the transform that is current when
/// they are added, like an HTML canvas.
pub trait Surface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reallocate the surface; contents are discarded
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    fn save(&mut self);

    fn restore(&mut self);

    fn translate(&mut self, x: f64, y: f64);

    fn rotate(&mut self, radians: f64);

    fn set_global_alpha(&mut self, alpha: f64);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn set_fill_color(&mut self, color: Rgba);

    fn set_stroke_color(&mut self, color: Rgba);

    fn set_line_width(&mut self, width: f64);

    fn begin_path(&mut self);

    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    /// Append a clockwise arc, connected to the current point if there is one
    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64);

    fn close_path(&mut self);

    fn fill(&mut self);

    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Post-process everything drawn so far
    fn apply_filter(&mut self, filter: Filter);

    /// Copy the current contents
    fn snapshot(&self) -> Snapshot;

    /// Draw a snapshot with its top-left corner at `(x, y)` in the current transform
    fn draw_snapshot(&mut self, snapshot: &Snapshot, x: f64, y: f64);

    /// Current pixels as straight-alpha RGBA, if this surface holds any
    fn to_image(&self) -> Option<RgbaImage>;
}

/// Number of line segments used to approximate an arc
pub(crate) fn arc_segments(radius: f64, sweep: f64) -> usize {
    let length = radius.abs() * sweep.abs();
    ((length / 4.0).ceil() as usize).clamp(8, 512)
}
