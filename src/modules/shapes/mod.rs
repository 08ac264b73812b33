//! # Shape Fields
//!
//! Triangles, squares, stars, polygons and hexagons share one implementation:
//! a list of instances generated when the module is built (or regenerated),
//! each drawn translated, rotated and faded by its own opacity. The variants
//! only differ in their options, their layout rules and the outline they
//! trace.

pub mod hexagons;
pub mod polygons;
pub mod squares;
pub mod stars;
pub mod triangles;

pub use hexagons::HexagonConfig;
pub use polygons::PolygonConfig;
pub use squares::SquareConfig;
pub use stars::StarConfig;
pub use triangles::TriangleConfig;

use std::f64::consts::TAU;

use rand::{Rng, RngCore};

use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::modules::options::{self, FillType, ModuleOptions};
use crate::modules::traits::{ConfigMap, ConfigValue, Module, ModuleSpec};
use crate::modules::ModuleKind;
use crate::surface::Surface;

pub type TriangleModule = ShapeModule<TriangleConfig>;
pub type SquareModule = ShapeModule<SquareConfig>;
pub type StarModule = ShapeModule<StarConfig>;
pub type PolygonModule = ShapeModule<PolygonConfig>;
pub type HexagonModule = ShapeModule<HexagonConfig>;

/// Outline stroke width for every shape
const STROKE_WIDTH: f64 = 2.0;

/// One generated shape, positioned in normalized canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeInstance {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub rotation: f64,
    pub opacity: f64,
}

/// Where instances are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Evenly spaced along the horizontal midline
    Line,
    /// Uniformly random
    Random,
    /// `ceil(sqrt(count))` columns, centered in their cells
    Grid,
}

/// Rules for generating a shape field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub count: usize,
    pub placement: Placement,
    pub size: f64,
    /// Random sizes are `rand * size + size_floor`
    pub random_size: Option<f64>,
    pub rotation: f64,
    pub random_rotation: bool,
    /// Opacity in 0.5..1.0 instead of 1
    pub random_opacity: bool,
}

impl Layout {
    /// Generate instances, drawing random numbers in the order
    /// x, y, size, rotation, opacity for each instance
    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec<ShapeInstance> {
        let count = self.count;
        let columns = (count as f64).sqrt().ceil().max(1.0) as usize;
        let rows = count.div_ceil(columns).max(1);

        (0..count)
            .map(|i| {
                let (x, y) = match self.placement {
                    Placement::Random => (rng.gen::<f64>(), rng.gen::<f64>()),
                    Placement::Line => ((i + 1) as f64 / (count + 1) as f64, 0.5),
                    Placement::Grid => (
                        ((i % columns) as f64 + 0.5) / columns as f64,
                        ((i / columns) as f64 + 0.5) / rows as f64,
                    ),
                };
                let size = match self.random_size {
                    Some(floor) => rng.gen::<f64>() * self.size + floor,
                    None => self.size,
                };
                let rotation = if self.random_rotation {
                    rng.gen::<f64>() * TAU
                } else {
                    self.rotation
                };
                let opacity = if self.random_opacity { rng.gen::<f64>() * 0.5 + 0.5 } else { 1.0 };

                ShapeInstance { x, y, size, rotation, opacity }
            })
            .collect()
    }
}

/// Options of one shape variant
pub trait ShapeOptions: ModuleOptions {
    const KIND: ModuleKind;

    fn layout(&self) -> Layout;

    fn color(&self) -> &str;

    fn fill_type(&self) -> FillType;

    /// Trace the outline of one instance of `size`, centered on the origin
    fn trace(&self, surface: &mut dyn Surface, size: f64);
}

/// Trace a closed polygon through `points`
pub(crate) fn trace_polygon(
    surface: &mut dyn Surface,
    points: impl IntoIterator<Item = (f64, f64)>,
) {
    let mut points = points.into_iter();
    if let Some((x, y)) = points.next() {
        surface.move_to(x, y);
        for (x, y) in points {
            surface.line_to(x, y);
        }
        surface.close_path();
    }
}

/// Field of pre-generated shape instances
pub struct ShapeModule<C: ShapeOptions> {
    config: C,
    instances: Vec<ShapeInstance>,
}

impl<C: ShapeOptions> ShapeModule<C> {
    pub fn new(overrides: &ConfigMap, rng: &mut dyn RngCore) -> Result<Self> {
        let config: C = options::merge(C::KIND.tag(), overrides)?;
        let instances = config.layout().generate(rng);
        Ok(Self { config, instances })
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn instances(&self) -> &[ShapeInstance] {
        &self.instances
    }
}

impl<C: ShapeOptions> Module for ShapeModule<C> {
    fn kind(&self) -> &str {
        C::KIND.tag()
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        width: f64,
        height: f64,
        _audio: Option<&AudioFeatures>,
    ) {
        let appearance = self.config.appearance();
        appearance.apply(surface);

        let color = options::color(self.config.color());
        let fill_type = self.config.fill_type();
        surface.set_fill_color(color);
        surface.set_stroke_color(color);
        surface.set_line_width(STROKE_WIDTH);

        for shape in &self.instances {
            surface.save();
            surface.translate(shape.x * width, shape.y * height);
            surface.rotate(shape.rotation);
            surface.set_global_alpha(appearance.opacity() * shape.opacity);

            surface.begin_path();
            self.config.trace(surface, shape.size);
            if fill_type.fills() {
                surface.fill();
            }
            if fill_type.strokes() {
                surface.stroke();
            }

            surface.restore();
        }
    }

    fn serialize(&self) -> ModuleSpec {
        ModuleSpec::new(self.kind(), options::snapshot(&self.config))
    }

    fn update_config(&mut self, key: &str, value: ConfigValue) -> Result<()> {
        options::set(&mut self.config, C::KIND.tag(), key, value)
    }

    fn regenerate(&mut self, rng: &mut dyn RngCore) {
        self.instances = self.config.layout().generate(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn layout(placement: Placement, count: usize) -> Layout {
        Layout {
            count,
            placement,
            size: 40.0,
            random_size: None,
            rotation: 0.25,
            random_rotation: false,
            random_opacity: false,
        }
    }

    #[test]
    fn test_line_placement() {
        let shapes = layout(Placement::Line, 3).generate(&mut SmallRng::seed_from_u64(1));
        let xs: Vec<f64> = shapes.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![0.25, 0.5, 0.75]);
        assert!(shapes.iter().all(|s| s.y == 0.5 && s.opacity == 1.0 && s.rotation == 0.25));
    }

    #[test]
    fn test_grid_placement() {
        let shapes = layout(Placement::Grid, 5).generate(&mut SmallRng::seed_from_u64(1));
        // 3 columns, 2 rows
        assert_eq!((shapes[0].x, shapes[0].y), (0.5 / 3.0, 0.25));
        assert_eq!((shapes[4].x, shapes[4].y), (1.5 / 3.0, 0.75));
    }

    #[test]
    fn test_random_draw_order() {
        let mut l = layout(Placement::Random, 1);
        l.random_size = Some(20.0);
        l.random_rotation = true;
        l.random_opacity = true;
        let shape = l.generate(&mut SmallRng::seed_from_u64(9))[0];

        let mut rng = SmallRng::seed_from_u64(9);
        let expected: Vec<f64> = (0..5).map(|_| rng.gen::<f64>()).collect();
        assert_eq!(shape.x, expected[0]);
        assert_eq!(shape.y, expected[1]);
        assert_eq!(shape.size, expected[2] * 40.0 + 20.0);
        assert_eq!(shape.rotation, expected[3] * TAU);
        assert_eq!(shape.opacity, expected[4] * 0.5 + 0.5);
    }

    #[test]
    fn test_empty_field() {
        assert!(layout(Placement::Grid, 0).generate(&mut SmallRng::seed_from_u64(1)).is_empty());
    }
}
