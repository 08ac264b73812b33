use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::modules::options::{self, Appearance, FillType, ModuleOptions};
use crate::modules::shapes::{trace_polygon, Layout, Placement, ShapeOptions};
use crate::modules::traits::ConfigMap;
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolygonConfig {
    pub count: u32,
    pub size: f64,
    pub sides: u32,
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

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            count: 5,
            size: 60.0,
            sides: 6,
            color: "#ff8800".to_string(),
            fill_type: FillType::Fill,
            rotation: 0.0,
            randomize: false,
            random_rotation: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for PolygonConfig {
    const FIELDS: &'static [&'static str] =
        &["count", "size", "sides", "color", "fillType", "rotation", "randomize", "randomRotation"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

impl ShapeOptions for PolygonConfig {
    const KIND: ModuleKind = ModuleKind::Polygons;

    fn layout(&self) -> Layout {
        Layout {
            count: options::count(self.count),
            placement: if self.randomize { Placement::Random } else { Placement::Line },
            size: self.size,
            random_size: self.randomize.then_some(30.0),
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

    fn trace(&self, surface: &mut dyn Surface, size: f64) {
        let sides = options::count(self.sides);
        trace_polygon(
            surface,
            (0..sides).map(|i| {
                let angle = TAU * i as f64 / sides as f64 - FRAC_PI_2;
                (angle.cos() * size, angle.sin() * size)
            }),
        );
    }
}
