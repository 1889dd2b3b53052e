//! Scene items: annotations reduced to drawable descriptions.
//!
//! These types are decoupled from the editor's annotation model so backends
//! depend only on geometry and styling, never on store internals.

use crate::{Color, Point};

/// Geometry of one item on the annotation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneShape {
    /// Axis-aligned box, top-left corner and size in media space.
    Rect { x: f64, y: f64, w: f64, h: f64 },
    /// Polygon outline; open while still being drawn.
    Polygon { points: Vec<Point>, closed: bool },
    /// Single point marker.
    Point { x: f64, y: f64 },
    /// Open path; `markers` draws a disc at every vertex (polylines).
    Path { points: Vec<Point>, markers: bool },
    /// One or more round-cap strokes at a fixed width.
    Brush { strokes: Vec<Vec<Point>>, width: f64 },
}

/// One entry on the annotation layer, committed or draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    /// Store id for committed annotations; empty for drafts.
    pub id: String,
    pub label: String,
    pub color: Color,
    pub shape: SceneShape,
    /// Drafts render dimmed, without chips or selection decorations.
    pub draft: bool,
}

impl SceneItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, color: Color, shape: SceneShape) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color,
            shape,
            draft: false,
        }
    }

    /// An in-progress drawing preview.
    pub fn draft(label: impl Into<String>, color: Color, shape: SceneShape) -> Self {
        Self {
            id: String::new(),
            label: label.into(),
            color,
            shape,
            draft: true,
        }
    }
}
