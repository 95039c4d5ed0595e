//! Heatmap aggregation and rendering engine.
//!
//! Weighted point observations are accumulated per pixel in a sparse store
//! and drawn as a color-coded density image:
//!
//! ```no_run
//! use heatmap::{DataPoint, Heatmap, HeatmapConfig};
//!
//! let mut map = Heatmap::new(HeatmapConfig::with_size(400, 300))?;
//! map.add_point(DataPoint::new(120, 80).with_value(3.0))?;
//! let png = map.get_image_png()?;
//! # Ok::<(), heatmap::HeatmapError>(())
//! ```

pub mod coordinator;
pub mod heatmap;
pub mod plugin;
pub mod store;

pub use coordinator::{Coordinator, EventKind, ExtremaChange, HeatmapEvent};
pub use heatmap::Heatmap;
pub use plugin::{Plugin, PluginRegistry};
pub use store::{AggregationStore, DataStore, StoreEvent};

pub use heatmap_common::{
    Color, ConfigPatch, DataPoint, DataSet, Extrema, FieldNames, Gradient, GradientStop,
    HeatmapConfig, HeatmapData, HeatmapError, HeatmapResult, RenderPoint,
};
