use serde::{Deserialize, Serialize};

use crate::modules::options::{self, Appearance, FillType, ModuleOptions};
use crate::modules::shapes::{trace_polygon, Layout, Placement, ShapeOptions};
use crate::modules::traits::ConfigMap;
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SquareConfig {
    pub count: u32,
    pub size: f64,
    pub color: String,
    pub fill_type: FillType,
    pub rotation: f64,
    pub randomize: bool,
    pub random_rotation: bool,
    pub random_sizes: bool,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            count: 5,
            size: 60.0,
            color: "#00ff00".to_string(),
            fill_type: FillType::Fill,
            rotation: 0.0,
            randomize: false,
            random_rotation: false,
            random_sizes: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for SquareConfig {
    const FIELDS: &'static [&'static str] = &[
        "count",
        "size",
        "color",
        "fillType",
        "rotation",
        "randomize",
        "randomRotation",
        "randomSizes",
    ];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

impl ShapeOptions for SquareConfig {
    const KIND: ModuleKind = ModuleKind::Squares;

    fn layout(&self) -> Layout {
        Layout {
            count: options::count(self.count),
            placement: if self.randomize { Placement::Random } else { Placement::Line },
            size: self.size,
            // Size follows its own switch here, not `randomize`
            random_size: self.random_sizes.then_some(20.0),
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
        let h = size / 2.0;
        trace_polygon(surface, [(-h, -h), (h, -h), (h, h), (-h, h)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shapes::SquareModule;
    use crate::modules::traits::ConfigValue;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_sizes_without_randomize() {
        let mut overrides = ConfigMap::new();
        overrides.insert("randomSizes".into(), ConfigValue::Bool(true));
        let m = SquareModule::new(&overrides, &mut SmallRng::seed_from_u64(4)).unwrap();

        for (i, shape) in m.instances().iter().enumerate() {
            assert_eq!(shape.x, (i + 1) as f64 / 6.0);
            assert_eq!(shape.opacity, 1.0);
            assert!((20.0..80.0).contains(&shape.size));
        }
    }

    #[test]
    fn test_randomize_keeps_fixed_size() {
        let mut overrides = ConfigMap::new();
        overrides.insert("randomize".into(), ConfigValue::Bool(true));
        let m = SquareModule::new(&overrides, &mut SmallRng::seed_from_u64(4)).unwrap();
        assert!(m.instances().iter().all(|s| s.size == 60.0));
    }
}
