use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CompositionError, Result};
use crate::modules::ModuleSpec;

/// Saved arrangement of layers
///
/// This is the exported form. Loading goes through [`Composition::validate`]
/// on the raw JSON instead, so one bad entry does not reject the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub modules: Vec<ModuleSpec>,
    pub canvas_size: CanvasSize,
    /// Unix milliseconds (UTC) at export
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Composition {
    /// Stamp a module list with the current time
    pub fn new(modules: Vec<ModuleSpec>, width: u32, height: u32) -> Self {
        Self {
            modules,
            canvas_size: CanvasSize { width, height },
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_value(&self) -> Value {
        // Every field is a string, number, bool or list of those
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CompositionError::Malformed { reason: e.to_string() }.into()
        })
    }

    /// Save the record as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Parse a JSON document without interpreting its entries
    pub fn parse(text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| {
            CompositionError::ParseFailed { reason: e.to_string() }.into()
        })
    }

    /// Read a composition file as raw JSON
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Value> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Check the record shape and return its module entries
    ///
    /// Only the outer structure is checked here; each entry is validated
    /// when it is added.
    pub fn validate(data: &Value) -> Result<&[Value]> {
        let record = data.as_object().ok_or_else(|| CompositionError::Malformed {
            reason: "expected a JSON object".to_string(),
        })?;

        let modules = record.get("modules").ok_or(CompositionError::MissingModules)?;
        let entries = modules.as_array().ok_or_else(|| CompositionError::Malformed {
            reason: "'modules' must be an array".to_string(),
        })?;

        Ok(entries.as_slice())
    }
}
