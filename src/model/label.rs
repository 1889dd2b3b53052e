//! Label table entries.

use pixmark_scene::Color;
use serde::{Deserialize, Serialize};

/// A label definition: what an annotation can be tagged as.
///
/// The palette itself is managed by the host; the core keeps the table for
/// export and tracks which label is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: Color,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Color) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
        }
    }

    /// Label with a generated color; golden-angle hue stepping keeps
    /// neighboring indexes visually distinct.
    pub fn with_generated_color(id: impl Into<String>, name: impl Into<String>, index: usize) -> Self {
        let hue = (index as f32 * 137.5) % 360.0;
        let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.9);
        Self {
            id: id.into(),
            name: name.into(),
            color: Color::new(r, g, b, 1.0),
        }
    }
}

/// Convert HSV to RGB (h in degrees, s and v in 0-1).
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}
