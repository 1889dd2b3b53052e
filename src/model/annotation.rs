//! Annotation data model: shapes, hit dispatch, and shape minima.

use pixmark_scene::{Color, Point, SceneShape};
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Unique identifier for an annotation. Process-unique, never reused.
pub type AnnotationId = String;

/// Minimum width and height (exclusive) for a committable bounding box.
pub const MIN_BBOX_SIZE: f64 = 5.0;

/// Minimum number of vertices for a committable polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of vertices for a committable polyline.
pub const MIN_POLYLINE_VERTICES: usize = 2;

/// Minimum number of points for a committable freehand path.
pub const MIN_FREEHAND_POINTS: usize = 4;

/// Minimum number of points per brush stroke.
pub const MIN_BRUSH_STROKE_POINTS: usize = 2;

/// Squared hit radius for point annotations (radius ~14.1 media pixels).
pub const POINT_HIT_RADIUS_SQ: f64 = 200.0;

/// Hit distance for freehand and polyline paths, in media pixels.
pub const PATH_HIT_THRESHOLD: f64 = 10.0;

/// Shape geometry of an annotation, in media coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationShape {
    /// Axis-aligned box, top-left corner and positive size.
    Bbox { x: f64, y: f64, w: f64, h: f64 },
    /// Closed region outline.
    Polygon { points: Vec<Point>, closed: bool },
    /// Single point marker.
    Point { x: f64, y: f64 },
    /// Continuous drag path.
    Freehand { points: Vec<Point> },
    /// Open click-by-click path.
    Polyline { points: Vec<Point> },
    /// One or more painted strokes at a fixed width.
    Brush {
        strokes: Vec<Vec<Point>>,
        brush_size: f64,
    },
}

impl AnnotationShape {
    /// Create a normalized bounding box from two drag corners.
    /// Returns None when either side is at or under the minimum.
    pub fn bbox_from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        let w = (x2 - x1).abs();
        let h = (y2 - y1).abs();
        if w > MIN_BBOX_SIZE && h > MIN_BBOX_SIZE {
            Some(AnnotationShape::Bbox {
                x: x1.min(x2),
                y: y1.min(y2),
                w,
                h,
            })
        } else {
            None
        }
    }

    /// Wire/display name of the shape type.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnnotationShape::Bbox { .. } => "bbox",
            AnnotationShape::Polygon { .. } => "polygon",
            AnnotationShape::Point { .. } => "point",
            AnnotationShape::Freehand { .. } => "freehand",
            AnnotationShape::Polyline { .. } => "polyline",
            AnnotationShape::Brush { .. } => "brush",
        }
    }

    /// Hit test against a media-space point. Each shape type has its own
    /// rule: boxes and polygons by containment, points by squared distance,
    /// paths by distance to their segments, brushes by distance to any
    /// stroke within half the brush width.
    pub fn hit_test(&self, px: f64, py: f64) -> bool {
        match self {
            AnnotationShape::Bbox { x, y, w, h } => geometry::point_in_rect(px, py, *x, *y, *w, *h),
            AnnotationShape::Polygon { points, .. } => geometry::point_in_polygon(px, py, points),
            AnnotationShape::Point { x, y } => {
                let dx = px - x;
                let dy = py - y;
                dx * dx + dy * dy < POINT_HIT_RADIUS_SQ
            }
            AnnotationShape::Freehand { points } | AnnotationShape::Polyline { points } => {
                geometry::near_polyline(px, py, points, PATH_HIT_THRESHOLD)
            }
            AnnotationShape::Brush {
                strokes,
                brush_size,
            } => strokes
                .iter()
                .any(|s| geometry::near_polyline(px, py, s, brush_size / 2.0)),
        }
    }
}

impl From<&AnnotationShape> for SceneShape {
    fn from(shape: &AnnotationShape) -> Self {
        match shape {
            AnnotationShape::Bbox { x, y, w, h } => SceneShape::Rect {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
            },
            AnnotationShape::Polygon { points, closed } => SceneShape::Polygon {
                points: points.clone(),
                closed: *closed,
            },
            AnnotationShape::Point { x, y } => SceneShape::Point { x: *x, y: *y },
            AnnotationShape::Freehand { points } => SceneShape::Path {
                points: points.clone(),
                markers: false,
            },
            AnnotationShape::Polyline { points } => SceneShape::Path {
                points: points.clone(),
                markers: true,
            },
            AnnotationShape::Brush {
                strokes,
                brush_size,
            } => SceneShape::Brush {
                strokes: strokes.clone(),
                width: *brush_size,
            },
        }
    }
}

/// A committed annotation. Geometry is immutable after commit; only
/// undo/redo replay removes and re-inserts whole annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Label name, captured from the active label at commit time.
    pub label: String,
    /// Display color, inherited from the label at commit time and not
    /// re-derived later.
    pub color: Color,
    /// Commit timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    pub shape: AnnotationShape,
}

impl Annotation {
    pub fn new(
        id: AnnotationId,
        label: impl Into<String>,
        color: Color,
        created_at_ms: u64,
        shape: AnnotationShape,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            color,
            created_at_ms,
            shape,
        }
    }

    pub fn hit_test(&self, px: f64, py: f64) -> bool {
        self.shape.hit_test(px, py)
    }
}

/// Media kind, as far as the core cares: stills versus frame sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Descriptive metadata for the loaded media. Pixel payloads travel
/// separately as [`pixmark_scene::MediaFrame`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub width: u32,
    pub height: u32,
}

impl MediaInfo {
    pub fn image(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            media_type: MediaType::Image,
            width,
            height,
        }
    }

    pub fn video(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            media_type: MediaType::Video,
            width,
            height,
        }
    }
}
