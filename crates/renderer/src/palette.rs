//! Gradient to color-table conversion.
//!
//! The renderer colorizes the alpha surface through a fixed 256-entry RGBA
//! lookup table. The table is always rebuilt from scratch from the gradient
//! stops so identical gradients give byte-identical tables.

use heatmap_common::{Gradient, GradientStop};

/// Number of entries in a palette.
pub const PALETTE_SIZE: usize = 256;

/// 256-entry RGBA lookup table, 4 bytes per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    data: Vec<u8>,
}

impl Palette {
    /// Build a palette by sampling the gradient at `index / 255`.
    pub fn from_gradient(gradient: &Gradient) -> Self {
        let stops = gradient.sorted_stops();
        let mut data = Vec::with_capacity(PALETTE_SIZE * 4);

        for i in 0..PALETTE_SIZE {
            let t = i as f64 / (PALETTE_SIZE - 1) as f64;
            let (r, g, b, a) = sample(&stops, t);
            data.extend_from_slice(&[r, g, b, a]);
        }

        Self { data }
    }

    /// RGBA entry for an 8-bit alpha index.
    #[inline(always)]
    pub fn color(&self, index: u8) -> [u8; 4] {
        let offset = index as usize * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    /// Raw table bytes (1024 bytes).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Color of the gradient at position `t`.
///
/// Positions before the first stop or after the last stop take the end
/// colors. An empty gradient samples as transparent.
fn sample(stops: &[GradientStop], t: f64) -> (u8, u8, u8, u8) {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (0, 0, 0, 0),
    };

    if t <= first.offset {
        return first.color.to_rgba();
    }
    if t >= last.offset {
        return last.color.to_rgba();
    }

    for pair in stops.windows(2) {
        let (low, high) = (&pair[0], &pair[1]);
        if t >= low.offset && t < high.offset {
            let local = (t - low.offset) / (high.offset - low.offset);
            return interpolate_color(low.color.to_rgba(), high.color.to_rgba(), local);
        }
    }

    last.color.to_rgba()
}

/// Linear color interpolation
fn interpolate_color(c1: (u8, u8, u8, u8), c2: (u8, u8, u8, u8), t: f64) -> (u8, u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

    (
        lerp(c1.0, c2.0),
        lerp(c1.1, c2.1),
        lerp(c1.2, c2.2),
        lerp(c1.3, c2.3),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_endpoints() {
        let black = (0, 0, 0, 255);
        let white = (255, 255, 255, 255);
        assert_eq!(interpolate_color(black, white, 0.0), black);
        assert_eq!(interpolate_color(black, white, 1.0), white);
        assert_eq!(interpolate_color(black, white, 0.5), (128, 128, 128, 255));
    }

    #[test]
    fn test_sample_empty_is_transparent() {
        assert_eq!(sample(&[], 0.5), (0, 0, 0, 0));
    }
}
