use image::RgbaImage;
use rayon::prelude::*;
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::error::{Result, SurfaceError};
use crate::surface::{arc_segments, BlendMode, ColorMatrix, Filter, Rgba, Snapshot, Surface};

/// Canvas-convention affine transform: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn translated(self, x: f64, y: f64) -> Self {
        Self {
            e: self.e + self.a * x + self.c * y,
            f: self.f + self.b * x + self.d * y,
            ..self
        }
    }

    fn rotated(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    fn map(&self, x: f64, y: f64) -> (f32, f32) {
        (
            (self.a * x + self.c * y + self.e) as f32,
            (self.b * x + self.d * y + self.f) as f32,
        )
    }

    fn to_skia(self) -> Transform {
        Transform::from_row(
            self.a as f32,
            self.b as f32,
            self.c as f32,
            self.d as f32,
            self.e as f32,
            self.f as f32,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine,
    alpha: f64,
    blend: BlendMode,
    fill: Rgba,
    stroke: Rgba,
    line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            blend: BlendMode::SourceOver,
            fill: Rgba::BLACK,
            stroke: Rgba::BLACK,
            line_width: 1.0,
        }
    }
}

/// Path command in device coordinates
#[derive(Debug, Clone, Copy)]
enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Close,
}

/// Software rasterizer over a premultiplied RGBA pixmap
pub struct RasterSurface {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<PathCmd>,
    has_current_point: bool,
}

impl RasterSurface {
    /// Allocate a transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or(SurfaceError::Unavailable { width, height })?;

        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            has_current_point: false,
        })
    }

    /// Borrow the underlying pixmap
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color of one pixel, `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    fn paint_for(&self, color: Rgba) -> Option<Paint<'static>> {
        let alpha = (color.a as f64 * self.state.alpha).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return None;
        }

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, (alpha * 255.0).round() as u8);
        paint.anti_alias = true;
        paint.blend_mode = self.state.blend.to_skia();
        Some(paint)
    }

    fn build_path(commands: &[PathCmd]) -> Option<tiny_skia::Path> {
        let mut builder = PathBuilder::new();
        for command in commands {
            match *command {
                PathCmd::MoveTo(x, y) => builder.move_to(x, y),
                PathCmd::LineTo(x, y) => builder.line_to(x, y),
                PathCmd::Close => builder.close(),
            }
        }
        builder.finish()
    }

    fn rect_commands(&self, x: f64, y: f64, width: f64, height: f64) -> [PathCmd; 5] {
        let t = self.state.transform;
        let (x0, y0) = t.map(x, y);
        let (x1, y1) = t.map(x + width, y);
        let (x2, y2) = t.map(x + width, y + height);
        let (x3, y3) = t.map(x, y + height);
        [
            PathCmd::MoveTo(x0, y0),
            PathCmd::LineTo(x1, y1),
            PathCmd::LineTo(x2, y2),
            PathCmd::LineTo(x3, y3),
            PathCmd::Close,
        ]
    }

    fn fill_commands(&mut self, commands: &[PathCmd]) {
        let Some(paint) = self.paint_for(self.state.fill) else { return };
        if let Some(path) = Self::build_path(commands) {
            self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke_commands(&mut self, commands: &[PathCmd]) {
        let Some(paint) = self.paint_for(self.state.stroke) else { return };
        if let Some(path) = Self::build_path(commands) {
            let stroke = Stroke {
                width: self.state.line_width.max(0.0) as f32,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn apply_color_matrix(&mut self, matrix: ColorMatrix) {
        let row_bytes = self.pixmap.width() as usize * 4;
        self.pixmap
            .data_mut()
            .par_chunks_mut(row_bytes)
            .for_each(|row| {
                for px in row.chunks_exact_mut(4) {
                    let alpha = px[3] as f32;
                    if alpha == 0.0 {
                        continue;
                    }
                    // Premultiplied channels stay linear in alpha, so the
                    // matrix applies directly as long as results stay <= alpha
                    let out = matrix.apply([px[0] as f32, px[1] as f32, px[2] as f32]);
                    for (channel, value) in px.iter_mut().zip(out) {
                        *channel = value.round().clamp(0.0, alpha) as u8;
                    }
                }
            });
    }

    fn apply_blur(&mut self, sigma: f32) {
        if !(sigma > 0.0) {
            return;
        }

        // Three box passes approximate a Gaussian of the same variance
        let width = self.pixmap.width() as usize;
        let height = self.pixmap.height() as usize;

        // Past the longer side every window covers the whole clamped row
        let box_width = (4.0 * sigma as f64 * sigma as f64 + 1.0).sqrt();
        let radius = ((box_width - 1.0) / 2.0).round().min(width.max(height) as f64) as usize;
        if radius == 0 {
            return;
        }

        let data = self.pixmap.data_mut();

        for _ in 0..3 {
            box_blur_rows(data, width, radius);
        }

        let mut transposed = transpose_pixels(data, width, height);
        for _ in 0..3 {
            box_blur_rows(&mut transposed, height, radius);
        }
        data.copy_from_slice(&transpose_pixels(&transposed, height, width));
    }
}

/// Horizontal box blur of every row, edges clamped
fn box_blur_rows(data: &mut [u8], width: usize, radius: usize) {
    let window = (2 * radius + 1) as u64;
    data.par_chunks_mut(width * 4).for_each_init(Vec::new, |scratch: &mut Vec<u8>, row| {
        scratch.clear();
        scratch.extend_from_slice(row);
        let last = width as isize - 1;
        let sample =
            |i: isize, channel: usize| scratch[i.clamp(0, last) as usize * 4 + channel] as u64;

        for channel in 0..4 {
            let r = radius as isize;
            let mut sum: u64 = 0;
            for i in -r..=r {
                sum += sample(i, channel);
            }
            for x in 0..width {
                row[x * 4 + channel] = ((sum + window / 2) / window) as u8;
                let xi = x as isize;
                sum += sample(xi + r + 1, channel);
                sum -= sample(xi - r, channel);
            }
        }
    });
}

fn transpose_pixels(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    for y in 0..height {
        for x in 0..width {
            let src = (y * width + x) * 4;
            let dst = (x * height + y) * 4;
            out[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
        }
    }
    out
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.pixmap = Pixmap::new(width, height)
            .ok_or(SurfaceError::Unavailable { width, height })?;
        self.state = DrawState::default();
        self.stack.clear();
        self.path.clear();
        self.has_current_point = false;
        Ok(())
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.translated(x, y);
    }

    fn rotate(&mut self, radians: f64) {
        self.state.transform = self.state.transform.rotated(radians);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.state.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
        self.has_current_point = false;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let (px, py) = self.state.transform.map(x, y);
        self.path.push(PathCmd::MoveTo(px, py));
        self.has_current_point = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if !self.has_current_point {
            self.move_to(x, y);
            return;
        }
        let (px, py) = self.state.transform.map(x, y);
        self.path.push(PathCmd::LineTo(px, py));
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
        if !(radius.is_finite() && radius >= 0.0) {
            return;
        }

        let sweep = (end - start).clamp(-std::f64::consts::TAU, std::f64::consts::TAU);
        let segments = arc_segments(radius, sweep);
        for i in 0..=segments {
            let angle = start + sweep * i as f64 / segments as f64;
            let x = cx + radius * angle.cos();
            let y = cy + radius * angle.sin();
            if i == 0 && !self.has_current_point {
                self.move_to(x, y);
            } else {
                self.line_to(x, y);
            }
        }
    }

    fn close_path(&mut self) {
        if self.has_current_point {
            self.path.push(PathCmd::Close);
        }
    }

    fn fill(&mut self) {
        let commands = std::mem::take(&mut self.path);
        self.fill_commands(&commands);
        self.path = commands;
    }

    fn stroke(&mut self) {
        let commands = std::mem::take(&mut self.path);
        self.stroke_commands(&commands);
        self.path = commands;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let commands = self.rect_commands(x, y, width, height);
        self.fill_commands(&commands);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let commands = self.rect_commands(x, y, width, height);
        self.stroke_commands(&commands);
    }

    fn apply_filter(&mut self, filter: Filter) {
        match filter {
            Filter::Color(matrix) => self.apply_color_matrix(matrix),
            Filter::Blur(sigma) => self.apply_blur(sigma),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            pixmap: Some(self.pixmap.clone()),
        }
    }

    fn draw_snapshot(&mut self, snapshot: &Snapshot, x: f64, y: f64) {
        let Some(source) = &snapshot.pixmap else { return };
        let paint = PixmapPaint {
            opacity: self.state.alpha as f32,
            blend_mode: self.state.blend.to_skia(),
            quality: FilterQuality::Bilinear,
        };
        let transform = self.state.transform.translated(x, y).to_skia();
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    fn to_image(&self) -> Option<RgbaImage> {
        let mut buffer = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            buffer.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_surface_is_unavailable() {
        assert!(RasterSurface::new(0, 10).is_err());
        let mut surface = RasterSurface::new(4, 4).unwrap();
        assert!(surface.resize(4, 0).is_err());
    }

    #[test]
    fn test_fill_rect_paints_pixels() {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        surface.set_fill_color(Rgba::rgb(255, 0, 0));
        surface.fill_rect(0.0, 0.0, 10.0, 10.0);

        assert_eq!(surface.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(15, 15), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_translate_applies_to_path_points() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        surface.set_fill_color(Rgba::WHITE);
        surface.save();
        surface.translate(20.0, 20.0);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0);
        surface.restore();

        assert_eq!(surface.pixel(25, 25).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(5, 5).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_global_alpha_scales_coverage() {
        let mut surface = RasterSurface::new(10, 10).unwrap();
        surface.set_fill_color(Rgba::WHITE);
        surface.set_global_alpha(0.5);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0);

        let alpha = surface.pixel(5, 5).unwrap()[3];
        assert!((120..=135).contains(&alpha));
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut surface = RasterSurface::new(10, 10).unwrap();
        surface.set_fill_color(Rgba::WHITE);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0);
        surface.clear();
        assert_eq!(surface.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_grayscale_filter() {
        let mut surface = RasterSurface::new(4, 4).unwrap();
        surface.set_fill_color(Rgba::rgb(255, 0, 0));
        surface.fill_rect(0.0, 0.0, 4.0, 4.0);
        surface.apply_filter(Filter::Color(ColorMatrix::saturate(0.0)));

        let [r, g, b, a] = surface.pixel(1, 1).unwrap();
        assert_eq!(a, 255);
        assert!((r as i32 - g as i32).abs() <= 1);
        assert!((g as i32 - b as i32).abs() <= 1);
    }

    #[test]
    fn test_blur_spreads_coverage() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        surface.set_fill_color(Rgba::WHITE);
        surface.fill_rect(15.0, 15.0, 10.0, 10.0);
        assert_eq!(surface.pixel(12, 20).unwrap()[3], 0);

        surface.apply_filter(Filter::Blur(3.0));
        assert!(surface.pixel(12, 20).unwrap()[3] > 0);
        assert!(surface.pixel(20, 20).unwrap()[3] > 0);
    }

    #[test]
    fn test_huge_blur_flattens_without_overflow() {
        let mut surface = RasterSurface::new(16, 16).unwrap();
        surface.set_fill_color(Rgba::WHITE);
        surface.fill_rect(0.0, 0.0, 16.0, 16.0);

        surface.apply_filter(Filter::Blur(1e8));
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(15, 15), Some([255, 255, 255, 255]));

        surface.apply_filter(Filter::Blur(f32::INFINITY));
        assert_eq!(surface.pixel(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        surface.set_fill_color(Rgba::rgb(0, 0, 255));
        surface.fill_rect(0.0, 0.0, 5.0, 5.0);

        let snapshot = surface.snapshot();
        surface.clear();
        surface.draw_snapshot(&snapshot, 10.0, 10.0);

        assert_eq!(surface.pixel(12, 12), Some([0, 0, 255, 255]));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_to_image_matches_dimensions() {
        let surface = RasterSurface::new(7, 3).unwrap();
        let image = surface.to_image().unwrap();
        assert_eq!(image.dimensions(), (7, 3));
    }
}
