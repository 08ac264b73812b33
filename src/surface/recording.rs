use image::RgbaImage;

use crate::error::{Result, SurfaceError};
use crate::surface::{BlendMode, Filter, Rgba, Snapshot, Surface};

/// One call made against a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    GlobalAlpha(f64),
    Blend(BlendMode),
    FillColor(Rgba),
    StrokeColor(Rgba),
    LineWidth(f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc { cx: f64, cy: f64, radius: f64, start: f64, end: f64 },
    ClosePath,
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    StrokeRect { x: f64, y: f64, width: f64, height: f64 },
    Filter(Filter),
    DrawSnapshot { x: f64, y: f64 },
}

impl DrawOp {
    /// Whether this operation can change pixels
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DrawOp::Clear
                | DrawOp::Fill
                | DrawOp::Stroke
                | DrawOp::FillRect { .. }
                | DrawOp::StrokeRect { .. }
                | DrawOp::Filter(_)
                | DrawOp::DrawSnapshot { .. }
        )
    }
}

/// Surface that records every operation instead of rasterizing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Unavailable { width, height }.into());
        }
        Ok(Self { width, height, ops: Vec::new() })
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded operations
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of recorded operations that touch pixels
    pub fn primitive_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_primitive()).count()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Unavailable { width, height }.into());
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate(x, y));
    }

    fn rotate(&mut self, radians: f64) {
        self.ops.push(DrawOp::Rotate(radians));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.ops.push(DrawOp::Blend(mode));
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.ops.push(DrawOp::FillColor(color));
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        self.ops.push(DrawOp::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Arc { cx, cy, radius, start, end });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::FillRect { x, y, width, height });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::StrokeRect { x, y, width, height });
    }

    fn apply_filter(&mut self, filter: Filter) {
        self.ops.push(DrawOp::Filter(filter));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::empty(self.width, self.height)
    }

    fn draw_snapshot(&mut self, _snapshot: &Snapshot, x: f64, y: f64) {
        self.ops.push(DrawOp::DrawSnapshot { x, y });
    }

    fn to_image(&self) -> Option<RgbaImage> {
        None
    }
}
