//! Layer model: fixed compositing order, per-layer settings, ML payloads.

use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{Color, Point};

/// Compositing layers, bottom to top. The order never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Media,
    Heatmap,
    Mask,
    Detection,
    Tracking,
    Annotation,
}

impl LayerKind {
    /// Bottom-to-top compositing order.
    pub const ORDER: [LayerKind; 6] = [
        LayerKind::Media,
        LayerKind::Heatmap,
        LayerKind::Mask,
        LayerKind::Detection,
        LayerKind::Tracking,
        LayerKind::Annotation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Media => "media",
            LayerKind::Heatmap => "heatmap",
            LayerKind::Mask => "mask",
            LayerKind::Detection => "detection",
            LayerKind::Tracking => "tracking",
            LayerKind::Annotation => "annotation",
        }
    }

    /// Position in [`ORDER`](Self::ORDER).
    pub fn index(self) -> usize {
        match self {
            LayerKind::Media => 0,
            LayerKind::Heatmap => 1,
            LayerKind::Mask => 2,
            LayerKind::Detection => 3,
            LayerKind::Tracking => 4,
            LayerKind::Annotation => 5,
        }
    }

    /// Media and annotations always render; only the ML layers toggle.
    pub fn is_toggleable(&self) -> bool {
        matches!(
            self,
            LayerKind::Heatmap | LayerKind::Mask | LayerKind::Detection | LayerKind::Tracking
        )
    }
}

/// Display settings for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSettings {
    pub visible: bool,
    pub opacity: f32,
}

impl LayerSettings {
    pub fn new(opacity: f32) -> Self {
        Self {
            visible: true,
            opacity,
        }
    }

    /// Opaque and visible; what the media and annotation layers always use.
    pub const OPAQUE: LayerSettings = LayerSettings {
        visible: true,
        opacity: 1.0,
    };
}

// ============================================================================
// ML payloads
// ============================================================================

/// One predicted bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub label: String,
    pub color: Color,
    pub confidence: f32,
}

/// One segmentation region, drawn as a filled polygon with a border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRegion {
    pub points: Vec<Point>,
    pub fill: Color,
    pub border: Color,
    pub label: String,
}

/// One tracked object path across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPath {
    pub points: Vec<Point>,
    pub color: Color,
    pub label: String,
}

/// A width x height scalar field in `[0, 1]`, colorized at render time.
///
/// Rows are y, columns are x: `data[[y, x]]`. The grid is shared behind an
/// `Arc` so cached draw commands stay cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    data: Arc<Array2<f32>>,
}

impl HeatmapGrid {
    pub fn new(data: Array2<f32>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn value_at(&self, x: usize, y: usize) -> f32 {
        self.data[[y, x]]
    }

    /// Shared colormap so every backend colorizes identically:
    /// blue, cyan, yellow, red over `[0, 1]`.
    pub fn color_for(value: f32) -> Color {
        const STOPS: [(f32, (f32, f32, f32)); 4] = [
            (0.0, (0.0, 0.0, 1.0)),
            (1.0 / 3.0, (0.0, 1.0, 1.0)),
            (2.0 / 3.0, (1.0, 1.0, 0.0)),
            (1.0, (1.0, 0.0, 0.0)),
        ];

        let v = value.clamp(0.0, 1.0);
        for pair in STOPS.windows(2) {
            let (lo, (r0, g0, b0)) = pair[0];
            let (hi, (r1, g1, b1)) = pair[1];
            if v <= hi {
                let t = (v - lo) / (hi - lo);
                return Color::new(
                    r0 + (r1 - r0) * t,
                    g0 + (g1 - g0) * t,
                    b0 + (b1 - b0) * t,
                    1.0,
                );
            }
        }
        Color::RED
    }
}

/// Wholesale replacement payload for one ML layer.
///
/// The target layer is derived from the variant, so data can never land on
/// the wrong layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    Heatmap(HeatmapGrid),
    Masks(Vec<MaskRegion>),
    Detections(Vec<Detection>),
    Tracks(Vec<TrackPath>),
}

impl LayerData {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerData::Heatmap(_) => LayerKind::Heatmap,
            LayerData::Masks(_) => LayerKind::Mask,
            LayerData::Detections(_) => LayerKind::Detection,
            LayerData::Tracks(_) => LayerKind::Tracking,
        }
    }
}

// ============================================================================
// ML layer set
// ============================================================================

/// The four ML overlay slots plus their display settings.
///
/// Hosts keep one as the source of truth and backends mirror it, so a
/// backend attached later can be brought up to date.
#[derive(Debug, Clone)]
pub struct MlLayers {
    pub heatmap: Option<HeatmapGrid>,
    pub masks: Option<Vec<MaskRegion>>,
    pub detections: Option<Vec<Detection>>,
    pub tracks: Option<Vec<TrackPath>>,
    settings: [LayerSettings; 4],
}

impl Default for MlLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl MlLayers {
    /// Empty slots with the default opacities (heatmap and masks start
    /// translucent so the media stays legible underneath).
    pub fn new() -> Self {
        Self {
            heatmap: None,
            masks: None,
            detections: None,
            tracks: None,
            settings: [
                LayerSettings::new(0.6), // heatmap
                LayerSettings::new(0.5), // mask
                LayerSettings::new(1.0), // detection
                LayerSettings::new(1.0), // tracking
            ],
        }
    }

    /// Replace one layer's contents wholesale. Returns the layer that
    /// changed.
    pub fn set_data(&mut self, data: LayerData) -> LayerKind {
        let kind = data.kind();
        match data {
            LayerData::Heatmap(grid) => self.heatmap = Some(grid),
            LayerData::Masks(masks) => self.masks = Some(masks),
            LayerData::Detections(dets) => self.detections = Some(dets),
            LayerData::Tracks(tracks) => self.tracks = Some(tracks),
        }
        kind
    }

    /// Drop all payloads (media unload). Settings survive.
    pub fn clear_data(&mut self) {
        self.heatmap = None;
        self.masks = None;
        self.detections = None;
        self.tracks = None;
    }

    pub fn settings(&self, kind: LayerKind) -> LayerSettings {
        match Self::slot(kind) {
            Some(i) => self.settings[i],
            None => LayerSettings::OPAQUE,
        }
    }

    /// Update visibility/opacity for one of the toggleable layers; ignored
    /// for media and annotations, which always render opaque.
    pub fn set_visibility(&mut self, kind: LayerKind, visible: bool, opacity: f32) {
        if let Some(i) = Self::slot(kind) {
            self.settings[i] = LayerSettings {
                visible,
                opacity: opacity.clamp(0.0, 1.0),
            };
        }
    }

    /// True when the layer has a payload to draw.
    pub fn has_data(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Heatmap => self.heatmap.is_some(),
            LayerKind::Mask => self.masks.is_some(),
            LayerKind::Detection => self.detections.is_some(),
            LayerKind::Tracking => self.tracks.is_some(),
            LayerKind::Media | LayerKind::Annotation => false,
        }
    }

    /// Clone out the payload for one layer, if any.
    pub fn data(&self, kind: LayerKind) -> Option<LayerData> {
        match kind {
            LayerKind::Heatmap => self.heatmap.clone().map(LayerData::Heatmap),
            LayerKind::Mask => self.masks.clone().map(LayerData::Masks),
            LayerKind::Detection => self.detections.clone().map(LayerData::Detections),
            LayerKind::Tracking => self.tracks.clone().map(LayerData::Tracks),
            LayerKind::Media | LayerKind::Annotation => None,
        }
    }

    fn slot(kind: LayerKind) -> Option<usize> {
        match kind {
            LayerKind::Heatmap => Some(0),
            LayerKind::Mask => Some(1),
            LayerKind::Detection => Some(2),
            LayerKind::Tracking => Some(3),
            LayerKind::Media | LayerKind::Annotation => None,
        }
    }
}
