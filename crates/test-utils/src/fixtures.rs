//! Common test fixtures for heatmap tests.

use heatmap_common::{Color, Gradient, GradientStop, HeatmapConfig};

/// Common canvas sizes.
pub mod sizes {
    /// Tiny canvas for pixel-exact assertions
    pub const TINY: (u32, u32) = (10, 10);

    /// Small canvas, a few points wide
    pub const SMALL: (u32, u32) = (100, 100);

    /// Typical embedded map widget
    pub const WIDGET: (u32, u32) = (400, 300);

    /// Full HD surface for benchmarks
    pub const FULL_HD: (u32, u32) = (1920, 1080);
}

/// Two-stop gradient from opaque black to opaque white.
pub fn black_white_gradient() -> Gradient {
    Gradient::new(vec![
        GradientStop::new(0.0, Color::rgb(0, 0, 0)),
        GradientStop::new(1.0, Color::rgb(255, 255, 255)),
    ])
}

/// Gradient whose stops fade from transparent to opaque red.
pub fn fading_red_gradient() -> Gradient {
    Gradient::new(vec![
        GradientStop::new(0.0, Color::rgba(255, 0, 0, 0)),
        GradientStop::new(1.0, Color::rgba(255, 0, 0, 255)),
    ])
}

/// Single-stop gradient: every alpha maps to the same color.
pub fn solid_gradient(color: Color) -> Gradient {
    Gradient::new(vec![GradientStop::new(1.0, color)])
}

/// Configuration with the given surface size and defaults elsewhere.
pub fn sized_config(size: (u32, u32)) -> HeatmapConfig {
    HeatmapConfig::with_size(size.0, size.1)
}

/// Configuration that stamps hard disks and writes fully opaque pixels.
///
/// Handy for exact pixel assertions: template alpha is 255 inside the
/// disk and the palette lookup is the only variable.
pub fn hard_disk_config(size: (u32, u32), radius: u32) -> HeatmapConfig {
    HeatmapConfig {
        radius,
        blur: 0.0,
        gradient: black_white_gradient(),
        ..sized_config(size)
    }
}
