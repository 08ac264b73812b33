use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::modules::options::{self, Appearance, FillType, ModuleOptions, ShapePattern};
use crate::modules::shapes::{trace_polygon, Layout, Placement, ShapeOptions};
use crate::modules::traits::ConfigMap;
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HexagonConfig {
    pub count: u32,
    pub size: f64,
    pub color: String,
    pub fill_type: FillType,
    pub rotation: f64,
    pub pattern: ShapePattern,
    pub random_rotation: bool,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for HexagonConfig {
    fn default() -> Self {
        Self {
            count: 8,
            size: 40.0,
            color: "#00ffff".to_string(),
            fill_type: FillType::Stroke,
            rotation: 0.0,
            pattern: ShapePattern::Random,
            random_rotation: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for HexagonConfig {
    const FIELDS: &'static [&'static str] =
        &["count", "size", "color", "fillType", "rotation", "pattern", "randomRotation"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

impl ShapeOptions for HexagonConfig {
    const KIND: ModuleKind = ModuleKind::Hexagons;

    fn layout(&self) -> Layout {
        let random = self.pattern == ShapePattern::Random;
        Layout {
            count: options::count(self.count),
            placement: match self.pattern {
                ShapePattern::Random => Placement::Random,
                ShapePattern::Grid => Placement::Grid,
                ShapePattern::Line => Placement::Line,
            },
            size: self.size,
            random_size: random.then_some(20.0),
            rotation: self.rotation,
            random_rotation: self.random_rotation,
            random_opacity: random,
        }
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn fill_type(&self) -> FillType {
        self.fill_type
    }

    fn trace(&self, surface: &mut dyn Surface, size: f64) {
        trace_polygon(
            surface,
            (0..6).map(|i| {
                let angle = TAU * i as f64 / 6.0;
                (angle.cos() * size, angle.sin() * size)
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shapes::HexagonModule;
    use crate::modules::traits::{ConfigValue, Module};
    use crate::surface::{DrawOp, RecordingSurface};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_grid_pattern_is_deterministic() {
        let mut overrides = ConfigMap::new();
        overrides.insert("pattern".into(), ConfigValue::from("grid"));
        let a = HexagonModule::new(&overrides, &mut SmallRng::seed_from_u64(1)).unwrap();
        let b = HexagonModule::new(&overrides, &mut SmallRng::seed_from_u64(2)).unwrap();

        assert_eq!(a.instances(), b.instances());
        assert!(a.instances().iter().all(|s| s.size == 40.0 && s.opacity == 1.0));
    }

    #[test]
    fn test_strokes_by_default() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(2));
        let m = HexagonModule::new(&overrides, &mut SmallRng::seed_from_u64(1)).unwrap();
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);

        assert_eq!(surface.ops().iter().filter(|op| **op == DrawOp::Stroke).count(), 2);
        assert!(!surface.ops().contains(&DrawOp::Fill));
    }

    #[test]
    fn test_unknown_pattern_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("pattern".into(), ConfigValue::from("spiral"));
        assert!(HexagonModule::new(&overrides, &mut SmallRng::seed_from_u64(1)).is_err());
    }
}
