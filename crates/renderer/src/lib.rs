//! Heatmap rendering.
//!
//! Implements the drawing side of a heatmap:
//! - Palette generation from gradient stops
//! - Point templates (hard disks or radial falloff)
//! - Two-pass canvas compositing (alpha accumulation, then colorization)
//! - PNG encoding of the visible surface

pub mod backend;
pub mod canvas;
pub mod palette;
pub mod png;
pub mod template;

pub use backend::{png_data_url, HeatmapRenderer};
pub use canvas::{CanvasRenderer, DirtyRect};
pub use palette::Palette;
pub use template::{PointTemplate, TemplateCache};
