//! Point observations, extrema and snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{FieldNames, MAX_RADIUS};
use crate::error::{HeatmapError, HeatmapResult};

fn default_value() -> f64 {
    1.0
}

/// A single weighted observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: i32,
    pub y: i32,
    /// Contributed weight, 1 when omitted
    #[serde(default = "default_value")]
    pub value: f64,
    /// Stamp radius in pixels; the configured radius is used when omitted
    #[serde(default)]
    pub radius: Option<u32>,
}

impl DataPoint {
    /// A point with the default weight of 1.
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            value: default_value(),
            radius: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Extract a point from an arbitrary JSON record using the configured
    /// field names.
    ///
    /// Coordinates may be numbers or numeric strings. A missing value
    /// field yields the default weight of 1; `radius` is always read from
    /// the `radius` key.
    pub fn from_json(record: &Value, fields: &FieldNames) -> HeatmapResult<Self> {
        let x = coordinate(record, &fields.x)?;
        let y = coordinate(record, &fields.y)?;

        let value = match record.get(&fields.value) {
            None | Some(Value::Null) => default_value(),
            Some(v) => number(v).ok_or_else(|| {
                HeatmapError::InvalidPoint(format!("field '{}' is not numeric", fields.value))
            })?,
        };

        let radius = match record.get("radius") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let r = number(v)
                    .filter(|r| (0.0..=MAX_RADIUS as f64).contains(r))
                    .ok_or_else(|| HeatmapError::InvalidPoint("invalid radius".to_string()))?;
                Some(r as u32)
            }
        };

        Ok(Self { x, y, value, radius })
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn coordinate(record: &Value, field: &str) -> HeatmapResult<i32> {
    let raw = record
        .get(field)
        .ok_or_else(|| HeatmapError::InvalidPoint(format!("missing field '{}'", field)))?;
    let v = number(raw)
        .ok_or_else(|| HeatmapError::InvalidPoint(format!("field '{}' is not numeric", field)))?;
    if v < i32::MIN as f64 || v > i32::MAX as f64 {
        return Err(HeatmapError::InvalidPoint(format!(
            "field '{}' out of range: {}",
            field, v
        )));
    }
    Ok(v as i32)
}

/// An aggregated cell ready to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub x: i32,
    pub y: i32,
    pub value: f64,
    pub radius: u32,
}

/// The value range used to scale density into a color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub min: f64,
    pub max: f64,
}

impl Default for Extrema {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl Extrema {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Points plus the extrema they should be drawn with.
///
/// Used both for incremental deltas and for full snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub min: f64,
    pub max: f64,
    pub data: Vec<RenderPoint>,
}

impl HeatmapData {
    pub fn new(extrema: Extrema, data: Vec<RenderPoint>) -> Self {
        Self {
            min: extrema.min,
            max: extrema.max,
            data,
        }
    }

    pub fn extrema(&self) -> Extrema {
        Extrema::new(self.min, self.max)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A full dataset as accepted by `set_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub max: f64,
    #[serde(default)]
    pub min: Option<f64>,
    pub data: Vec<DataPoint>,
}
