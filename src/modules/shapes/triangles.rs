use serde::{Deserialize, Serialize};

use crate::modules::options::{self, Appearance, FillType, ModuleOptions};
use crate::modules::shapes::{trace_polygon, Layout, Placement, ShapeOptions};
use crate::modules::traits::ConfigMap;
use crate::modules::ModuleKind;
use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriangleConfig {
    pub count: u32,
    pub size: f64,
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

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            count: 5,
            size: 80.0,
            color: "#ff00ff".to_string(),
            fill_type: FillType::Fill,
            rotation: 0.0,
            randomize: false,
            random_rotation: false,
            appearance: Appearance::default(),
            extra: ConfigMap::new(),
        }
    }
}

impl ModuleOptions for TriangleConfig {
    const FIELDS: &'static [&'static str] =
        &["count", "size", "color", "fillType", "rotation", "randomize", "randomRotation"];

    fn appearance(&self) -> Appearance {
        self.appearance
    }
}

impl ShapeOptions for TriangleConfig {
    const KIND: ModuleKind = ModuleKind::Triangles;

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

    fn trace(&self, surface: &mut dyn Surface, size: f64) {
        trace_polygon(
            surface,
            [(0.0, -size), (size * 0.866, size * 0.5), (-size * 0.866, size * 0.5)],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shapes::TriangleModule;
    use crate::modules::traits::{ConfigValue, Module};
    use crate::surface::{DrawOp, RecordingSurface};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_field() {
        let m = TriangleModule::new(&ConfigMap::new(), &mut SmallRng::seed_from_u64(1)).unwrap();
        assert_eq!(m.instances().len(), 5);
        assert_eq!(m.instances()[0].size, 80.0);
        assert_eq!(m.serialize().config.get("fillType"), Some(&ConfigValue::from("fill")));
    }

    #[test]
    fn test_instance_alpha_multiplies_module_opacity() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(1));
        overrides.insert("opacity".into(), ConfigValue::Float(0.5));
        let m = TriangleModule::new(&overrides, &mut SmallRng::seed_from_u64(1)).unwrap();
        let mut surface = RecordingSurface::new(100, 100).unwrap();
        m.draw(&mut surface, 100.0, 100.0, None);

        let alphas: Vec<&DrawOp> = surface.ops().iter().filter(|op| matches!(op, DrawOp::GlobalAlpha(_))).collect();
        assert_eq!(alphas, vec![&DrawOp::GlobalAlpha(0.5), &DrawOp::GlobalAlpha(0.5)]);
        assert!(surface.ops().contains(&DrawOp::Translate(50.0, 50.0)));
        assert!(surface.ops().contains(&DrawOp::MoveTo(0.0, -80.0)));
        assert_eq!(surface.primitive_count(), 1);
    }

    #[test]
    fn test_randomized_field_varies() {
        let mut overrides = ConfigMap::new();
        overrides.insert("randomize".into(), ConfigValue::Bool(true));
        let m = TriangleModule::new(&overrides, &mut SmallRng::seed_from_u64(1)).unwrap();
        for shape in m.instances() {
            assert!((20.0..100.0).contains(&shape.size));
            assert!((0.5..1.0).contains(&shape.opacity));
        }
    }

    #[test]
    fn test_update_config_keeps_instances_until_regenerate() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut m = TriangleModule::new(&ConfigMap::new(), &mut rng).unwrap();
        m.update_config("count", ConfigValue::Integer(2)).unwrap();
        assert_eq!(m.instances().len(), 5);

        m.regenerate(&mut rng);
        assert_eq!(m.instances().len(), 2);
    }
}
