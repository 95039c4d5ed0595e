//! Heatmap engine configuration.
//!
//! `HeatmapConfig` is the full, resolved configuration. `ConfigPatch` carries
//! the subset of options passed to `configure` and is merged on top of the
//! current configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HeatmapError, HeatmapResult};
use crate::style::Gradient;

pub const DEFAULT_RADIUS: u32 = 40;
pub const DEFAULT_MAX_OPACITY: f64 = 1.0;
pub const DEFAULT_MIN_OPACITY: f64 = 0.0;
pub const DEFAULT_BLUR: f64 = 0.85;

/// Largest accepted stamp radius in pixels.
pub const MAX_RADIUS: u32 = 1024;

fn default_radius() -> u32 {
    DEFAULT_RADIUS
}

fn default_max_opacity() -> f64 {
    DEFAULT_MAX_OPACITY
}

fn default_min_opacity() -> f64 {
    DEFAULT_MIN_OPACITY
}

fn default_blur() -> f64 {
    DEFAULT_BLUR
}

/// Names of the record fields read when ingesting JSON records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_x_field")]
    pub x: String,
    #[serde(default = "default_y_field")]
    pub y: String,
    #[serde(default = "default_value_field")]
    pub value: String,
}

fn default_x_field() -> String {
    "x".to_string()
}

fn default_y_field() -> String {
    "y".to_string()
}

fn default_value_field() -> String {
    "value".to_string()
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            x: default_x_field(),
            y: default_y_field(),
            value: default_value_field(),
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Default stamp radius for points without their own radius
    #[serde(default = "default_radius")]
    pub radius: u32,

    /// Color stops used to build the palette
    #[serde(default)]
    pub gradient: Gradient,

    /// Upper bound for the output alpha, as a fraction
    #[serde(default = "default_max_opacity")]
    pub max_opacity: f64,

    /// Lower bound for the output alpha, as a fraction
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f64,

    /// Global opacity override; 0 means unset
    #[serde(default)]
    pub opacity: f64,

    /// Blur amount in `[0, 1]`; 0 draws hard-edged disks
    #[serde(default = "default_blur")]
    pub blur: f64,

    /// Take the output alpha from the gradient colors instead
    #[serde(default)]
    pub use_gradient_opacity: bool,

    /// Surface width in pixels
    #[serde(default)]
    pub width: u32,

    /// Surface height in pixels
    #[serde(default)]
    pub height: u32,

    /// Name of a registered store/renderer plugin
    #[serde(default)]
    pub plugin: Option<String>,

    #[serde(default)]
    pub fields: FieldNames,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            gradient: Gradient::default(),
            max_opacity: DEFAULT_MAX_OPACITY,
            min_opacity: DEFAULT_MIN_OPACITY,
            opacity: 0.0,
            blur: DEFAULT_BLUR,
            use_gradient_opacity: false,
            width: 0,
            height: 0,
            plugin: None,
            fields: FieldNames::default(),
        }
    }
}

impl HeatmapConfig {
    /// Default configuration with the given surface size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> HeatmapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> HeatmapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        for (field, v) in [
            ("max_opacity", self.max_opacity),
            ("min_opacity", self.min_opacity),
            ("opacity", self.opacity),
            ("blur", self.blur),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(HeatmapError::invalid_config(
                    field,
                    format!("{} is outside [0, 1]", v),
                ));
            }
        }

        if self.radius > MAX_RADIUS {
            return Err(HeatmapError::invalid_config(
                "radius",
                format!("{} exceeds the maximum of {}", self.radius, MAX_RADIUS),
            ));
        }

        if self.min_opacity > self.max_opacity {
            return Err(HeatmapError::invalid_config(
                "min_opacity",
                "must not exceed max_opacity",
            ));
        }

        self.gradient
            .validate()
            .map_err(|e| HeatmapError::invalid_config("gradient", e))
    }

    /// Merge a partial configuration on top of this one.
    pub fn merge(&mut self, patch: &ConfigPatch) {
        if let Some(radius) = patch.radius {
            self.radius = radius;
        }
        if let Some(gradient) = &patch.gradient {
            self.gradient = gradient.clone();
        }
        if let Some(v) = patch.max_opacity {
            self.max_opacity = v;
        }
        if let Some(v) = patch.min_opacity {
            self.min_opacity = v;
        }
        if let Some(v) = patch.opacity {
            self.opacity = v;
        }
        if let Some(v) = patch.blur {
            self.blur = v;
        }
        if let Some(v) = patch.use_gradient_opacity {
            self.use_gradient_opacity = v;
        }
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(fields) = &patch.fields {
            self.fields = fields.clone();
        }
    }
}

/// Partial configuration accepted by `configure`.
///
/// The plugin cannot be changed after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub gradient: Option<Gradient>,
    #[serde(default)]
    pub max_opacity: Option<f64>,
    #[serde(default)]
    pub min_opacity: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub blur: Option<f64>,
    #[serde(default)]
    pub use_gradient_opacity: Option<bool>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fields: Option<FieldNames>,
}

impl ConfigPatch {
    pub fn gradient(gradient: Gradient) -> Self {
        Self {
            gradient: Some(gradient),
            ..Self::default()
        }
    }

    pub fn size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}
