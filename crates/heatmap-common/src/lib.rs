//! Common types shared by the heatmap store, renderer and facade.

pub mod config;
pub mod error;
pub mod point;
pub mod style;

pub use config::{ConfigPatch, FieldNames, HeatmapConfig};
pub use error::{HeatmapError, HeatmapResult};
pub use point::{DataPoint, DataSet, Extrema, HeatmapData, RenderPoint};
pub use style::{Color, Gradient, GradientStop};
