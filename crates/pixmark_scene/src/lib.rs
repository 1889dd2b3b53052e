//! pixmark_scene - presentation layer for the pixmark annotation core.
//!
//! Viewport math, the fixed-order layer model, backend-agnostic draw
//! commands, and two interchangeable renderer backends (immediate-mode and
//! retained scene graph) that must encode identical frames.

pub mod backend;
pub mod color;
pub mod command;
pub mod immediate;
pub mod item;
pub mod layer;
pub mod media;
pub mod paint;
pub mod point;
pub mod retained;
pub mod viewport;

pub use backend::{create_backend, BackendKind, SceneRenderer};
pub use color::Color;
pub use command::{DrawCommand, Frame, LayerPass};
pub use immediate::ImmediateRenderer;
pub use item::{SceneItem, SceneShape};
pub use layer::{
    Detection, HeatmapGrid, LayerData, LayerKind, LayerSettings, MaskRegion, MlLayers, TrackPath,
};
pub use media::MediaFrame;
pub use point::Point;
pub use retained::RetainedRenderer;
pub use viewport::{
    ViewTransform, Viewport, FIT_MARGIN, FIT_MAX_ZOOM, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP,
};
