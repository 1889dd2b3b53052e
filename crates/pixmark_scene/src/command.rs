//! Backend-agnostic draw commands and encoded frames.
//!
//! Both renderer backends reduce their state to the same `Frame` of these
//! commands. Comparing frames by value is how tests prove the backends stay
//! interchangeable.

use crate::{Color, HeatmapGrid, LayerKind, MediaFrame, Point, ViewTransform};

/// One drawing primitive, in media-space coordinates.
///
/// The frame's single [`ViewTransform`] scales and positions the whole
/// command stream; stroke widths and radii are media-space values that scale
/// along with the geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Color,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Color,
        width: f64,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    /// Open or closed path; `round_cap` for brush strokes.
    StrokePath {
        points: Vec<Point>,
        color: Color,
        width: f64,
        closed: bool,
        round_cap: bool,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Color,
    },
    StrokeCircle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Color,
        width: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        color: Color,
    },
    /// The media frame at its intrinsic size, top-left at the origin.
    Image { frame: MediaFrame },
    /// Scalar field stretched over the media rect, colorized via
    /// [`HeatmapGrid::color_for`].
    Heatmap { grid: HeatmapGrid, w: f64, h: f64 },
}

/// All commands for one layer, with the layer's display opacity.
///
/// Opacity is applied when compositing the pass, not baked into command
/// colors, so cached command lists stay valid when opacity changes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPass {
    pub layer: LayerKind,
    pub opacity: f32,
    pub commands: Vec<DrawCommand>,
}

/// A fully encoded frame: one scene transform plus passes in compositing
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub transform: ViewTransform,
    pub passes: Vec<LayerPass>,
}

impl Frame {
    /// Total number of commands across all passes.
    pub fn command_count(&self) -> usize {
        self.passes.iter().map(|p| p.commands.len()).sum()
    }

    /// The pass for one layer, if it was emitted this frame.
    pub fn pass(&self, kind: LayerKind) -> Option<&LayerPass> {
        self.passes.iter().find(|p| p.layer == kind)
    }
}
