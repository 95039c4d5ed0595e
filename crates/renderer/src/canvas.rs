//! Canvas compositing renderer.
//!
//! Rendering happens in two passes over two equally sized surfaces:
//!
//! 1. **Alpha pass**: every point stamps its template onto an off-screen
//!    single-channel surface with source-over compositing. The stamp opacity
//!    is the point's value scaled into the current extrema, so overlapping
//!    points accumulate density.
//! 2. **Colorize pass**: each non-transparent alpha pixel is used as an index
//!    into the 256-entry palette and written to the visible RGBA surface.
//!
//! Partial renders only colorize the dirty rectangle covered by the newly
//! stamped points. Full renders clear both surfaces and colorize everything.

use image::{GrayImage, Rgba, RgbaImage};
use tracing::{debug, trace};

use heatmap_common::{Extrema, Gradient, HeatmapConfig, HeatmapError, HeatmapData, HeatmapResult};

use crate::backend::HeatmapRenderer;
use crate::palette::Palette;
use crate::png::create_png_auto;
use crate::template::TemplateCache;

/// Lowest stamp opacity, so a freshly added point is never invisible.
pub const MIN_TEMPLATE_ALPHA: f32 = 0.01;

/// Stamp opacity for a value within the extrema.
///
/// Clamped to `[0.01, 1]`. A degenerate range (`max == min`) or a NaN ratio
/// yields the floor.
pub fn template_alpha(value: f64, min: f64, max: f64) -> f32 {
    let range = max - min;
    if range == 0.0 {
        return MIN_TEMPLATE_ALPHA;
    }
    let ratio = ((value - min) / range) as f32;
    if ratio.is_nan() {
        return MIN_TEMPLATE_ALPHA;
    }
    ratio.clamp(MIN_TEMPLATE_ALPHA, 1.0)
}

/// Bounding box of pixels awaiting colorization. Max edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl DirtyRect {
    pub const EMPTY: DirtyRect = DirtyRect {
        min_x: i64::MAX,
        min_y: i64::MAX,
        max_x: i64::MIN,
        max_y: i64::MIN,
    };

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Grow to cover `[min_x, max_x) x [min_y, max_y)`.
    pub fn expand(&mut self, min_x: i64, min_y: i64, max_x: i64, max_y: i64) {
        self.min_x = self.min_x.min(min_x);
        self.min_y = self.min_y.min(min_y);
        self.max_x = self.max_x.max(max_x);
        self.max_y = self.max_y.max(max_y);
    }

    /// Intersection with a `width x height` surface as `(x0, y0, x1, y1)`.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if self.is_empty() {
            return None;
        }
        let x0 = self.min_x.clamp(0, width as i64);
        let y0 = self.min_y.clamp(0, height as i64);
        let x1 = self.max_x.clamp(0, width as i64);
        let y1 = self.max_y.clamp(0, height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

impl Default for DirtyRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

fn opacity_byte(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Software renderer backed by an alpha surface and a visible RGBA surface.
pub struct CanvasRenderer {
    width: u32,
    height: u32,
    shadow: GrayImage,
    canvas: RgbaImage,
    dirty: DirtyRect,
    gradient: Gradient,
    palette: Palette,
    templates: TemplateCache,
    blur: f64,
    opacity: u8,
    max_opacity: u8,
    min_opacity: u8,
    use_gradient_opacity: bool,
    extrema: Extrema,
}

impl CanvasRenderer {
    pub fn new(config: &HeatmapConfig) -> Self {
        let mut renderer = Self {
            width: config.width,
            height: config.height,
            shadow: GrayImage::new(config.width, config.height),
            canvas: RgbaImage::new(config.width, config.height),
            dirty: DirtyRect::EMPTY,
            gradient: config.gradient.clone(),
            palette: Palette::from_gradient(&config.gradient),
            templates: TemplateCache::new(),
            blur: config.blur,
            opacity: 0,
            max_opacity: 255,
            min_opacity: 0,
            use_gradient_opacity: false,
            extrema: Extrema::default(),
        };
        renderer.set_styles(config);
        renderer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Visible surface, RGBA with straight alpha.
    pub fn pixels(&self) -> &[u8] {
        self.canvas.as_raw()
    }

    /// Visible pixel at `(x, y)`; transparent outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        self.canvas.get_pixel(x, y).0
    }

    /// Accumulated alpha at `(x, y)`; 0 outside the surface.
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.shadow.get_pixel(x as u32, y as u32).0[0]
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Region still waiting for colorization. Empty between renders.
    pub fn dirty_rect(&self) -> DirtyRect {
        self.dirty
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    fn set_styles(&mut self, config: &HeatmapConfig) {
        self.blur = config.blur;
        self.opacity = opacity_byte(config.opacity);
        self.max_opacity = opacity_byte(config.max_opacity);
        self.min_opacity = opacity_byte(config.min_opacity);
        self.use_gradient_opacity = config.use_gradient_opacity;
    }

    fn clear(&mut self) {
        self.shadow = GrayImage::new(self.width, self.height);
        self.canvas = RgbaImage::new(self.width, self.height);
        self.dirty = DirtyRect::EMPTY;
    }

    /// Stamp every point onto the alpha surface and grow the dirty rect.
    fn draw_alpha(&mut self, data: &HeatmapData) {
        let blur_factor = 1.0 - self.blur;

        for point in &data.data {
            let template = self.templates.get(point.radius, blur_factor);
            if template.size() == 0 {
                continue;
            }
            let opacity = template_alpha(point.value, data.min, data.max);

            let radius = point.radius as i64;
            let left = point.x as i64 - radius;
            let top = point.y as i64 - radius;

            stamp(&mut self.shadow, template.as_slice(), template.size(), left, top, opacity);
            self.dirty.expand(left, top, left + 2 * radius, top + 2 * radius);
        }
    }

    /// Map alpha to palette colors inside `(x0, y0, x1, y1)`.
    fn colorize(&mut self, region: (u32, u32, u32, u32)) {
        let (x0, y0, x1, y1) = region;

        for y in y0..y1 {
            for x in x0..x1 {
                let alpha = self.shadow.get_pixel(x, y).0[0];
                if alpha == 0 {
                    continue;
                }

                let [r, g, b, palette_alpha] = self.palette.color(alpha);
                let final_alpha = if self.use_gradient_opacity {
                    palette_alpha
                } else if self.opacity > 0 {
                    self.opacity
                } else if alpha < self.max_opacity {
                    alpha.max(self.min_opacity)
                } else {
                    self.max_opacity
                };

                self.canvas.put_pixel(x, y, Rgba([r, g, b, final_alpha]));
            }
        }

        self.dirty = DirtyRect::EMPTY;
    }
}

/// Source-over a template onto the alpha surface at `(left, top)`.
fn stamp(surface: &mut GrayImage, template: &[u8], size: u32, left: i64, top: i64, opacity: f32) {
    let (width, height) = (surface.width() as i64, surface.height() as i64);

    for ty in 0..size as i64 {
        let sy = top + ty;
        if sy < 0 || sy >= height {
            continue;
        }
        for tx in 0..size as i64 {
            let sx = left + tx;
            if sx < 0 || sx >= width {
                continue;
            }

            let tpl_alpha = template[(ty * size as i64 + tx) as usize];
            if tpl_alpha == 0 {
                continue;
            }

            let src = tpl_alpha as f32 / 255.0 * opacity;
            let px = surface.get_pixel_mut(sx as u32, sy as u32);
            let dst = px.0[0] as f32 / 255.0;
            let out = src + dst * (1.0 - src);
            px.0[0] = (out * 255.0).round().min(255.0) as u8;
        }
    }
}

impl HeatmapRenderer for CanvasRenderer {
    fn render_partial(&mut self, data: &HeatmapData) {
        if data.is_empty() {
            return;
        }
        self.extrema = data.extrema();
        self.draw_alpha(data);

        trace!(dirty = ?self.dirty, points = data.data.len(), "Partial render");
        match self.dirty.clip(self.width, self.height) {
            Some(region) => self.colorize(region),
            None => self.dirty = DirtyRect::EMPTY,
        }
    }

    fn render_all(&mut self, data: &HeatmapData) {
        self.clear();
        self.extrema = data.extrema();
        if data.is_empty() {
            return;
        }

        debug!(points = data.data.len(), min = data.min, max = data.max, "Full render");
        self.draw_alpha(data);
        self.colorize((0, 0, self.width, self.height));
    }

    fn update_config(&mut self, config: &HeatmapConfig) {
        if config.gradient != self.gradient {
            debug!(stops = config.gradient.stops.len(), "Regenerating palette");
            self.gradient = config.gradient.clone();
            self.palette = Palette::from_gradient(&self.gradient);
        }
        if (config.width != 0 && config.width != self.width)
            || (config.height != 0 && config.height != self.height)
        {
            let width = if config.width != 0 { config.width } else { self.width };
            let height = if config.height != 0 { config.height } else { self.height };
            self.set_dimensions(width, height);
        }
        self.set_styles(config);
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        debug!(width, height, "Resizing surfaces");
        self.width = width;
        self.height = height;
        self.clear();
    }

    fn get_value_at(&self, x: i32, y: i32) -> Option<f64> {
        let alpha = self.alpha_at(x, y) as f64;
        let range = (self.extrema.max - self.extrema.min).abs();
        Some((range * (alpha / 255.0)).floor())
    }

    fn get_image_png(&self) -> HeatmapResult<Vec<u8>> {
        create_png_auto(self.pixels(), self.width as usize, self.height as usize)
            .map_err(HeatmapError::Encoding)
    }
}
