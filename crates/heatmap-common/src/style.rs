//! Color and gradient definitions for heatmap colorization.
//!
//! A gradient is an ordered list of stops, each mapping an offset in `[0, 1]`
//! to a color. Colors can be written the way a style sheet would write them:
//!
//! ```json
//! {
//!   "stops": [
//!     { "offset": 0.25, "color": "rgb(0,0,255)" },
//!     { "offset": 0.55, "color": "#00ff00" },
//!     { "offset": 0.85, "color": "yellow" },
//!     { "offset": 1.0,  "color": [255, 0, 0] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// CSS-like string: "#RGB", "#RRGGBB", "#RRGGBBAA", "rgb(r,g,b)",
    /// "rgba(r,g,b,a)" or a named color
    Css(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color::Rgba { r, g, b, a }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Color::Css(value.into())
    }

    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert to an RGBA tuple, or `None` if the color cannot be parsed.
    pub fn try_to_rgba(&self) -> Option<(u8, u8, u8, u8)> {
        match self {
            Color::Css(s) => parse_css_color(s),
            Color::Array(arr) => {
                if arr.len() < 3 {
                    return None;
                }
                let a = arr.get(3).copied().unwrap_or(255);
                Some((arr[0], arr[1], arr[2], a))
            }
            Color::Rgba { r, g, b, a } => Some((*r, *g, *b, *a)),
        }
    }

    /// Convert to an RGBA tuple. Unparseable colors become opaque black.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        self.try_to_rgba().unwrap_or((0, 0, 0, 255))
    }
}

fn parse_css_color(s: &str) -> Option<(u8, u8, u8, u8)> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
    {
        return parse_rgb_function(args.strip_suffix(')')?);
    }

    named_color(&lower)
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8, u8)> {
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();

    match hex.len() {
        3 => {
            // "#abc" expands each digit: a -> aa
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 16 + v;
            }
            Some((out[0], out[1], out[2], 255))
        }
        6 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
        8 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, channel(6..8)?)),
        _ => None,
    }
}

fn parse_rgb_function(args: &str) -> Option<(u8, u8, u8, u8)> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| -> Option<u8> {
        let v: f64 = p.parse().ok()?;
        Some(v.round().clamp(0.0, 255.0) as u8)
    };

    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        // Alpha is written as a 0-1 fraction
        Some(p) => {
            let v: f64 = p.parse().ok()?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };

    Some((r, g, b, a))
}

fn named_color(name: &str) -> Option<(u8, u8, u8, u8)> {
    let rgba = match name {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "lime" => (0, 255, 0, 255),
        "green" => (0, 128, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "cyan" | "aqua" => (0, 255, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "navy" => (0, 0, 128, 255),
        "maroon" => (128, 0, 0, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        _ => return None,
    };
    Some(rgba)
}

/// A color stop in a gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient, in `[0, 1]`
    pub offset: f64,

    /// The color at this stop
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Ordered color stops used to build the colorization palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
}

impl Default for Gradient {
    /// Blue, green, yellow, red.
    fn default() -> Self {
        Self {
            stops: vec![
                GradientStop::new(0.25, Color::css("rgb(0,0,255)")),
                GradientStop::new(0.55, Color::css("rgb(0,255,0)")),
                GradientStop::new(0.85, Color::css("yellow")),
                GradientStop::new(1.0, Color::css("rgb(255,0,0)")),
            ],
        }
    }
}

impl Gradient {
    pub fn new(stops: Vec<GradientStop>) -> Self {
        Self { stops }
    }

    /// Stops sorted by offset. Stops sharing an offset keep their input order.
    pub fn sorted_stops(&self) -> Vec<GradientStop> {
        let mut stops = self.stops.clone();
        stops.sort_by(|a, b| {
            a.offset
                .partial_cmp(&b.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        stops
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.stops.is_empty() {
            return Err("Gradient must have at least 1 color stop".to_string());
        }

        for stop in &self.stops {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(format!("Stop offset {} is outside [0, 1]", stop.offset));
            }
            if stop.color.try_to_rgba().is_none() {
                return Err(format!("Unrecognized color {:?}", stop.color));
            }
        }

        Ok(())
    }
}
