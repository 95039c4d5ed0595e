//! Alpha stamps for individual points.
//!
//! Each point is drawn onto the alpha surface by stamping a square template
//! of side `2 * radius`. Templates are drawn once with tiny-skia and cached
//! per renderer.

use std::collections::HashMap;

use tiny_skia::{
    Color, FillRule, GradientStop, Paint, PathBuilder, Pixmap, Point, RadialGradient, Rect,
    SpreadMode, Transform,
};
use tracing::{debug, warn};

use heatmap_common::config::MAX_RADIUS;

/// A square single-channel alpha image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTemplate {
    size: u32,
    alpha: Vec<u8>,
}

impl PointTemplate {
    fn empty() -> Self {
        Self {
            size: 0,
            alpha: Vec::new(),
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.size || y >= self.size {
            return 0;
        }
        self.alpha[(y * self.size + x) as usize]
    }

    /// Row-major alpha values.
    pub fn as_slice(&self) -> &[u8] {
        &self.alpha
    }
}

/// Draw the stamp for one radius.
///
/// `blur_factor == 1` gives a hard-edged opaque disk. Otherwise a radial
/// gradient runs from opaque at `radius * blur_factor` to transparent at
/// `radius`.
///
/// Radii above [`MAX_RADIUS`] give an empty template.
pub fn draw_point_template(radius: u32, blur_factor: f64) -> PointTemplate {
    if radius > MAX_RADIUS {
        warn!(radius, max = MAX_RADIUS, "Template radius too large");
        return PointTemplate::empty();
    }
    let size = match radius.checked_mul(2) {
        Some(size) => size,
        None => return PointTemplate::empty(),
    };
    let mut pixmap = match Pixmap::new(size, size) {
        Some(p) => p,
        None => return PointTemplate::empty(),
    };

    let center = radius as f32;
    let mut paint = Paint::default();
    paint.anti_alias = true;

    if blur_factor >= 1.0 {
        paint.set_color(Color::BLACK);
        if let Some(path) = PathBuilder::from_circle(center, center, radius as f32) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    } else {
        let inner = blur_factor.clamp(0.0, 1.0) as f32;
        let shader = RadialGradient::new(
            Point::from_xy(center, center),
            Point::from_xy(center, center),
            radius as f32,
            vec![
                GradientStop::new(inner, Color::BLACK),
                GradientStop::new(1.0, Color::TRANSPARENT),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );

        match shader {
            Some(shader) => paint.shader = shader,
            None => {
                warn!(radius, blur_factor, "Failed to build template gradient");
                return PointTemplate::empty();
            }
        }

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, size as f32, size as f32) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    // Premultiplication leaves the alpha channel untouched
    let alpha = pixmap.pixels().iter().map(|p| p.alpha()).collect();

    PointTemplate { size, alpha }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TemplateKey {
    radius: u32,
    blur_bits: u64,
}

/// Templates keyed by radius and blur factor.
///
/// Unbounded: the number of distinct radii is small and caller-controlled.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: HashMap<TemplateKey, PointTemplate>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached template, drawn on first use.
    pub fn get(&mut self, radius: u32, blur_factor: f64) -> &PointTemplate {
        let key = TemplateKey {
            radius,
            blur_bits: blur_factor.to_bits(),
        };
        self.templates.entry(key).or_insert_with(|| {
            debug!(radius, blur_factor, "Drawing point template");
            draw_point_template(radius, blur_factor)
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
