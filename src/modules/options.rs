use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModuleError, Result};
use crate::modules::traits::{ConfigMap, ConfigValue};
use crate::surface::{BlendMode, Rgba, Surface};

/// Upper bound on instances, bars, segments and similar counts
pub const MAX_COUNT: u32 = 10_000;

/// Typed configuration record of one module variant
///
/// Records serialize to a flat camelCase map. Keys that are not declared are
/// kept in an `extra` map and written back out unchanged.
pub trait ModuleOptions: Serialize + DeserializeOwned + Default + Clone + Send + 'static {
    /// Declared option names, as they appear on the wire
    const FIELDS: &'static [&'static str];

    fn appearance(&self) -> Appearance;
}

/// Opacity and blend mode shared by every module
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
}

impl Appearance {
    pub fn opacity(&self) -> f64 {
        self.opacity.filter(|o| o.is_finite()).unwrap_or(1.0).clamp(0.0, 1.0)
    }

    /// Set global alpha and blend mode on the surface
    pub fn apply(&self, surface: &mut dyn Surface) {
        surface.set_global_alpha(self.opacity());
        surface.set_blend_mode(self.blend_mode.unwrap_or_default());
    }
}

/// How shape outlines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillType {
    #[default]
    Fill,
    Stroke,
    Both,
}

impl FillType {
    pub fn fills(self) -> bool {
        matches!(self, FillType::Fill | FillType::Both)
    }

    pub fn strokes(self) -> bool {
        matches!(self, FillType::Stroke | FillType::Both)
    }
}

/// Placement of hexagon instances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePattern {
    #[default]
    Random,
    Grid,
    Line,
}

/// Parse a configured color string
pub fn color(value: &str) -> Rgba {
    Rgba::parse_or_white(value)
}

/// Clamp a configured count to the supported range
pub fn count(value: u32) -> usize {
    value.min(MAX_COUNT) as usize
}

/// Build a record from its defaults with `overrides` laid on top
pub fn merge<C: ModuleOptions>(kind: &str, overrides: &ConfigMap) -> Result<C> {
    let mut map = to_map(&C::default(), kind)?;
    for (key, value) in overrides {
        if key == "type" {
            continue;
        }
        let value = coerce(map.get(key), value);
        map.insert(key.clone(), value);
    }

    match serde_json::from_value(Value::Object(map)) {
        Ok(config) => Ok(config),
        Err(e) => Err(locate_error::<C>(kind, overrides, e).into()),
    }
}

/// Flat option map of a record, skipping values with no wire form
pub fn snapshot<C: ModuleOptions>(config: &C) -> ConfigMap {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, value)| ConfigValue::from_json(value).map(|v| (key.clone(), v)))
            .collect(),
        _ => ConfigMap::new(),
    }
}

/// Validated single-option update; `config` is untouched on error
pub fn set<C: ModuleOptions>(
    config: &mut C,
    kind: &str,
    key: &str,
    value: ConfigValue,
) -> Result<()> {
    if !is_known_key::<C>(key) {
        return Err(ModuleError::UnknownOption {
            kind: kind.to_string(),
            key: key.to_string(),
        }
        .into());
    }

    let mut map = to_map(config, kind)?;
    let value = coerce(map.get(key), &value);
    map.insert(key.to_string(), value);

    let updated = serde_json::from_value(Value::Object(map)).map_err(|e| ModuleError::InvalidOption {
        kind: kind.to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    *config = updated;
    Ok(())
}

pub fn is_known_key<C: ModuleOptions>(key: &str) -> bool {
    C::FIELDS.contains(&key) || key == "opacity" || key == "blendMode"
}

fn to_map<C: ModuleOptions>(config: &C, kind: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ModuleError::InvalidSpec {
            reason: format!("configuration of '{}' is not a map", kind),
        }
        .into()),
        Err(e) => Err(ModuleError::InvalidSpec { reason: e.to_string() }.into()),
    }
}

/// Numbers written into integer options become in-range counts
///
/// Negative and NaN values give 0, fractions round up the way a `i < n` loop
/// bound would, and anything above [`MAX_COUNT`] is capped.
fn coerce(current: Option<&Value>, value: &ConfigValue) -> Value {
    let integer_slot = current.map(|v| v.is_i64() || v.is_u64()).unwrap_or(false);
    match value.as_f64() {
        Some(n) if integer_slot => Value::from(clamp_count(n)),
        _ => value.to_json(),
    }
}

fn clamp_count(n: f64) -> u32 {
    if n.is_nan() {
        return 0;
    }
    n.ceil().clamp(0.0, MAX_COUNT as f64) as u32
}

/// Find which override broke deserialization
fn locate_error<C: ModuleOptions>(
    kind: &str,
    overrides: &ConfigMap,
    error: serde_json::Error,
) -> ModuleError {
    for (key, value) in overrides {
        if key == "type" {
            continue;
        }
        let mut scratch = C::default();
        if set(&mut scratch, kind, key, value.clone()).is_err() && is_known_key::<C>(key) {
            return ModuleError::InvalidOption {
                kind: kind.to_string(),
                key: key.clone(),
                reason: error.to_string(),
            };
        }
    }
    ModuleError::InvalidSpec { reason: error.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Sample {
        count: u32,
        line_width: f64,
        fill_type: FillType,
        #[serde(flatten)]
        appearance: Appearance,
        #[serde(flatten)]
        extra: ConfigMap,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                count: 4,
                line_width: 1.5,
                fill_type: FillType::Stroke,
                appearance: Appearance::default(),
                extra: ConfigMap::new(),
            }
        }
    }

    impl ModuleOptions for Sample {
        const FIELDS: &'static [&'static str] = &["count", "lineWidth", "fillType"];

        fn appearance(&self) -> Appearance {
            self.appearance
        }
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Integer(9));
        overrides.insert("type".into(), ConfigValue::from("sample"));
        overrides.insert("custom".into(), ConfigValue::Bool(true));

        let sample: Sample = merge("sample", &overrides).unwrap();
        assert_eq!(sample.count, 9);
        assert_eq!(sample.line_width, 1.5);
        assert_eq!(sample.extra.get("custom"), Some(&ConfigValue::Bool(true)));
        assert!(!sample.extra.contains_key("type"));
    }

    #[test]
    fn test_merge_reports_bad_key() {
        let mut overrides = ConfigMap::new();
        overrides.insert("fillType".into(), ConfigValue::from("dotted"));

        match merge::<Sample>("sample", &overrides) {
            Err(StudioError::Module(ModuleError::InvalidOption { key, .. })) => assert_eq!(key, "fillType"),
            other => panic!("unexpected: {:?}", other.map(|p| p.count)),
        }
    }

    #[test]
    fn test_snapshot_omits_unset_appearance() {
        let snap = snapshot(&Sample::default());
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get("fillType"), Some(&ConfigValue::from("stroke")));

        let mut sample = Sample::default();
        set(&mut sample, "sample", "blendMode", ConfigValue::from("screen")).unwrap();
        assert_eq!(snapshot(&sample).get("blendMode"), Some(&ConfigValue::from("screen")));
    }

    #[test]
    fn test_set_validates() {
        let mut sample = Sample::default();
        assert!(set(&mut sample, "sample", "nope", ConfigValue::Integer(1)).is_err());
        assert!(set(&mut sample, "sample", "count", ConfigValue::from("many")).is_err());
        assert_eq!(sample, Sample::default());

        set(&mut sample, "sample", "count", ConfigValue::Float(7.0)).unwrap();
        set(&mut sample, "sample", "lineWidth", ConfigValue::Integer(3)).unwrap();
        assert_eq!(sample.count, 7);
        assert_eq!(sample.line_width, 3.0);
    }

    #[test]
    fn test_out_of_range_counts_are_clamped() {
        let mut sample = Sample::default();
        set(&mut sample, "sample", "count", ConfigValue::Integer(-1)).unwrap();
        assert_eq!(sample.count, 0);
        set(&mut sample, "sample", "count", ConfigValue::Integer(5_000_000_000)).unwrap();
        assert_eq!(sample.count, MAX_COUNT);
        set(&mut sample, "sample", "count", ConfigValue::Float(2.5)).unwrap();
        assert_eq!(sample.count, 3);
        set(&mut sample, "sample", "count", ConfigValue::Float(f64::NAN)).unwrap();
        assert_eq!(sample.count, 0);

        let mut overrides = ConfigMap::new();
        overrides.insert("count".into(), ConfigValue::Float(-7.9));
        assert_eq!(merge::<Sample>("sample", &overrides).unwrap().count, 0);
    }

    #[test]
    fn test_appearance_defaults() {
        let appearance = Appearance::default();
        assert_eq!(appearance.opacity(), 1.0);
        assert_eq!(Appearance { opacity: Some(2.0), blend_mode: None }.opacity(), 1.0);
    }
}
