use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::modules::options::{self, Appearance, FillType, ModuleOptions};
use crate::modules::shapes::{trace_polygon, Layout, Placement, ShapeOptions};
use crate::modules::traits::ConfigMap;
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StarConfig {
    pub count: u32,
    pub size: f64,
    pub points: u32,
    pub color: String,
    pub fill_type: FillType,
    pub rotation: f64,
    pub randomize: bool,
    pub random_rotation: bool,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 5,
            size: 50.0,
            points: 5,
            color: "#ffff00".to_string(),
            fill_type: FillType::Fill,
            rotation: 0.0,
            randomize: false,
            random_rotation: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for StarConfig {
    const FIELDS: &'static [&'static str] = &[
        "count",
        "size",
        "points",
        "color",
        "fillType",
        "rotation",
        "randomize",
        "randomRotation",
    ];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

impl ShapeOptions for StarConfig {
    const KIND: ModuleKind = ModuleKind::Stars;

    fn layout(&self) -> Layout {
        Layout {
            count: options::count(self.count),
            placement: if self.randomize { Placement::Random } else { Placement::Line },
            size: self.size,
            random_size: self.randomize.then_some(20.0),
            rotation: self.rotation,
            random_rotation: self.random_rotation,
            random_opacity: self.randomize,
        }
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn fill_type(&self) -> FillType {
        self.fill_type
    }

    /// Vertices alternate between the outer radius and half of it
    fn trace(&self, surface: &mut dyn Surface, size: f64) {
        let points = options::count(self.points);
        if points == 0 {
            return;
        }
        trace_polygon(
            surface,
            (0..points * 2).map(|i| {
                let radius = if i % 2 == 0 { size } else { size * 0.5 };
                let angle = PI * i as f64 / points as f64;
                (angle.cos() * radius, angle.sin() * radius)
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    #[test]
    fn test_vertex_count() {
        let config = StarConfig { points: 4, ..StarConfig::default() };
        let mut surface = RecordingSurface::new(10, 10).unwrap();
        config.trace(&mut surface, 10.0);

        let vertices = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::MoveTo(..) | DrawOp::LineTo(..)))
            .count();
        assert_eq!(vertices, 8);
        assert_eq!(surface.ops()[0], DrawOp::MoveTo(10.0, 0.0));
    }

    #[test]
    fn test_zero_points_traces_nothing() {
        let config = StarConfig { points: 0, ..StarConfig::default() };
        let mut surface = RecordingSurface::new(10, 10).unwrap();
        config.trace(&mut surface, 10.0);
        assert!(surface.ops().is_empty());
    }
}
