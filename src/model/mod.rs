//! Data models for the annotation core.

mod annotation;
mod label;

pub use annotation::{
    Annotation, AnnotationId, AnnotationShape, MediaInfo, MediaType, MIN_BBOX_SIZE,
    MIN_BRUSH_STROKE_POINTS, MIN_FREEHAND_POINTS, MIN_POLYGON_VERTICES, MIN_POLYLINE_VERTICES,
    PATH_HIT_THRESHOLD, POINT_HIT_RADIUS_SQ,
};
pub use label::Label;
