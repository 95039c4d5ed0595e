//! The interface the heatmap facade drives renderers through.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use heatmap_common::{HeatmapConfig, HeatmapData, HeatmapResult};

/// A drawing backend for heatmap data.
///
/// Implemented by [`crate::canvas::CanvasRenderer`]; alternative renderers
/// are supplied through the facade's plugin registry.
pub trait HeatmapRenderer {
    /// Draw a delta of newly added points on top of the current image.
    fn render_partial(&mut self, data: &HeatmapData);

    /// Clear everything and draw a complete snapshot.
    fn render_all(&mut self, data: &HeatmapData);

    /// Apply a (merged) configuration. Does not redraw.
    fn update_config(&mut self, config: &HeatmapConfig);

    /// Reallocate the surfaces. Prior content is discarded.
    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Approximate density at a pixel, if the renderer can answer.
    fn get_value_at(&self, _x: i32, _y: i32) -> Option<f64> {
        None
    }

    /// The visible surface encoded as PNG.
    fn get_image_png(&self) -> HeatmapResult<Vec<u8>>;

    /// The visible surface as a `data:` URL.
    fn get_image_url(&self) -> HeatmapResult<String> {
        let png = self.get_image_png()?;
        Ok(png_data_url(&png))
    }
}

/// Wrap PNG bytes in a base64 `data:` URL.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
