//! Snapshot export/import: the one persisted artifact the core owns.
//!
//! A snapshot is a flat JSON document describing the media, every committed
//! annotation, and the label table. Geometry round-trips losslessly; ids
//! and timestamps are runtime state and are stripped on export and
//! regenerated on import. The `version` field gates imports: any snapshot
//! with the same major version is accepted.

use pixmark_scene::{Color, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    Annotation, AnnotationShape, Label, MediaInfo, MIN_BBOX_SIZE, MIN_BRUSH_STROKE_POINTS,
    MIN_FREEHAND_POINTS, MIN_POLYGON_VERTICES, MIN_POLYLINE_VERTICES,
};

/// Version written into every exported snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Errors from snapshot parsing or validation.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// JSON parsing or serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by an incompatible major version
    #[error("unsupported snapshot version '{found}', expected major version {expected_major}")]
    UnsupportedVersion { found: String, expected_major: u32 },

    /// Geometry the drawing tools could never have committed
    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },
}

impl SnapshotError {
    pub fn unsupported_version(found: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            found: found.into(),
            expected_major: Snapshot::VERSION_MAJOR,
        }
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }
}

/// The exported document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    /// Media description, or `null` when nothing was loaded.
    pub media: Option<MediaInfo>,
    pub annotations: Vec<AnnotationEntry>,
    pub labels: Vec<Label>,
}

impl Snapshot {
    /// Major version this build reads and writes.
    pub const VERSION_MAJOR: u32 = 1;

    /// Capture the current document.
    pub fn capture(media: Option<&MediaInfo>, annotations: &[Annotation], labels: &[Label]) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            media: media.cloned(),
            annotations: annotations.iter().map(AnnotationEntry::from_annotation).collect(),
            labels: labels.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and fully validate. Nothing partially-valid gets through.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the version gate and every entry's geometry without mutating
    /// anything, so a failed import can leave the document untouched.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if !Self::version_compatible(&self.version) {
            return Err(SnapshotError::unsupported_version(&self.version));
        }
        for (i, entry) in self.annotations.iter().enumerate() {
            entry.shape.validate().map_err(|message| {
                SnapshotError::invalid_geometry(format!("annotation {i} ('{}'): {message}", entry.label))
            })?;
        }
        Ok(())
    }

    /// Same major version means compatible; minor versions only add fields.
    fn version_compatible(version: &str) -> bool {
        parse_version(version).is_some_and(|(major, _)| major == Self::VERSION_MAJOR)
    }
}

/// Parse "major.minor" into numbers. A missing minor counts as 0.
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

/// One annotation as persisted: label, color, and geometry. Runtime ids
/// and timestamps never reach the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub label: String,
    pub color: Color,
    #[serde(flatten)]
    pub shape: ShapeEntry,
}

impl AnnotationEntry {
    pub fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            label: annotation.label.clone(),
            color: annotation.color,
            shape: ShapeEntry::from_shape(&annotation.shape),
        }
    }

    pub fn to_shape(&self) -> AnnotationShape {
        self.shape.to_shape()
    }
}

/// Geometry variants, tagged by `type` so entries stay flat JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeEntry {
    Bbox {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    Polygon {
        points: Vec<Point>,
        #[serde(default = "default_closed")]
        closed: bool,
    },
    Point {
        x: f64,
        y: f64,
    },
    Freehand {
        points: Vec<Point>,
    },
    Polyline {
        points: Vec<Point>,
    },
    Brush {
        strokes: Vec<Vec<Point>>,
        #[serde(rename = "brushSize")]
        brush_size: f64,
    },
}

fn default_closed() -> bool {
    true
}

impl ShapeEntry {
    pub fn from_shape(shape: &AnnotationShape) -> Self {
        match shape {
            AnnotationShape::Bbox { x, y, w, h } => ShapeEntry::Bbox {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
            },
            AnnotationShape::Polygon { points, closed } => ShapeEntry::Polygon {
                points: points.clone(),
                closed: *closed,
            },
            AnnotationShape::Point { x, y } => ShapeEntry::Point { x: *x, y: *y },
            AnnotationShape::Freehand { points } => ShapeEntry::Freehand {
                points: points.clone(),
            },
            AnnotationShape::Polyline { points } => ShapeEntry::Polyline {
                points: points.clone(),
            },
            AnnotationShape::Brush { strokes, brush_size } => ShapeEntry::Brush {
                strokes: strokes.clone(),
                brush_size: *brush_size,
            },
        }
    }

    pub fn to_shape(&self) -> AnnotationShape {
        match self {
            ShapeEntry::Bbox { x, y, w, h } => AnnotationShape::Bbox {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
            },
            ShapeEntry::Polygon { points, closed } => AnnotationShape::Polygon {
                points: points.clone(),
                closed: *closed,
            },
            ShapeEntry::Point { x, y } => AnnotationShape::Point { x: *x, y: *y },
            ShapeEntry::Freehand { points } => AnnotationShape::Freehand {
                points: points.clone(),
            },
            ShapeEntry::Polyline { points } => AnnotationShape::Polyline {
                points: points.clone(),
            },
            ShapeEntry::Brush { strokes, brush_size } => AnnotationShape::Brush {
                strokes: strokes.clone(),
                brush_size: *brush_size,
            },
        }
    }

    /// Reject geometry below the commit minima the tools enforce.
    fn validate(&self) -> Result<(), String> {
        match self {
            ShapeEntry::Bbox { w, h, .. } => {
                if *w > MIN_BBOX_SIZE && *h > MIN_BBOX_SIZE {
                    Ok(())
                } else {
                    Err(format!("bbox {w}x{h} is below the minimum size"))
                }
            }
            ShapeEntry::Polygon { points, .. } => {
                if points.len() >= MIN_POLYGON_VERTICES {
                    Ok(())
                } else {
                    Err(format!("polygon with {} vertices", points.len()))
                }
            }
            ShapeEntry::Point { .. } => Ok(()),
            ShapeEntry::Freehand { points } => {
                if points.len() >= MIN_FREEHAND_POINTS {
                    Ok(())
                } else {
                    Err(format!("freehand path with {} points", points.len()))
                }
            }
            ShapeEntry::Polyline { points } => {
                if points.len() >= MIN_POLYLINE_VERTICES {
                    Ok(())
                } else {
                    Err(format!("polyline with {} points", points.len()))
                }
            }
            ShapeEntry::Brush { strokes, brush_size } => {
                if strokes.is_empty() {
                    return Err("brush with no strokes".to_string());
                }
                if let Some(short) = strokes.iter().find(|s| s.len() < MIN_BRUSH_STROKE_POINTS) {
                    return Err(format!("brush stroke with {} point(s)", short.len()));
                }
                if !brush_size.is_finite() || *brush_size <= 0.0 {
                    return Err(format!("brush size {brush_size}"));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(id: &str, shape: AnnotationShape) -> Annotation {
        Annotation::new(id.to_string(), "car", Color::from_rgb8(255, 107, 107), 1_700_000_000_000, shape)
    }

    fn one_of_each() -> Vec<Annotation> {
        vec![
            annotation("a1", AnnotationShape::Bbox { x: 10.25, y: 20.5, w: 100.0, h: 80.125 }),
            annotation(
                "a2",
                AnnotationShape::Polygon {
                    points: vec![
                        Point::new(0.0, 0.0),
                        Point::new(50.5, 10.0),
                        Point::new(25.0, 60.25),
                    ],
                    closed: true,
                },
            ),
            annotation("a3", AnnotationShape::Point { x: 320.0, y: 240.0 }),
            annotation(
                "a4",
                AnnotationShape::Freehand {
                    points: vec![
                        Point::new(1.0, 1.0),
                        Point::new(2.0, 3.0),
                        Point::new(4.0, 5.5),
                        Point::new(6.0, 6.0),
                    ],
                },
            ),
            annotation(
                "a5",
                AnnotationShape::Polyline {
                    points: vec![Point::new(100.0, 100.0), Point::new(200.0, 150.0)],
                },
            ),
            annotation(
                "a6",
                AnnotationShape::Brush {
                    strokes: vec![
                        vec![Point::new(5.0, 5.0), Point::new(6.0, 7.0)],
                        vec![Point::new(30.0, 30.0), Point::new(31.0, 29.0), Point::new(33.0, 28.0)],
                    ],
                    brush_size: 14.5,
                },
            ),
        ]
    }

    #[test]
    fn test_round_trip_preserves_geometry_exactly() {
        let annotations = one_of_each();
        let labels = vec![Label::new("l1", "car", Color::from_rgb8(255, 107, 107))];
        let media = MediaInfo::image("frame.png", 640, 480);

        let snapshot = Snapshot::capture(Some(&media), &annotations, &labels);
        let json = snapshot.to_json().unwrap();
        let parsed = Snapshot::from_json(&json).unwrap();

        assert_eq!(parsed.version, SNAPSHOT_VERSION);
        assert_eq!(parsed.media, Some(media));
        assert_eq!(parsed.labels, labels);
        assert_eq!(parsed.annotations.len(), annotations.len());
        for (entry, original) in parsed.annotations.iter().zip(&annotations) {
            assert_eq!(entry.to_shape(), original.shape);
            assert_eq!(entry.label, original.label);
            assert_eq!(entry.color, original.color);
        }
    }

    #[test]
    fn test_runtime_fields_stripped() {
        let snapshot = Snapshot::capture(None, &one_of_each(), &[]);
        let json = snapshot.to_json().unwrap();

        assert!(!json.contains("\"id\""));
        assert!(!json.contains("created"));
    }

    #[test]
    fn test_entries_are_flat_and_tagged() {
        let annotations = vec![annotation("a1", AnnotationShape::Bbox { x: 1.0, y: 2.0, w: 30.0, h: 40.0 })];
        let snapshot = Snapshot::capture(None, &annotations, &[]);
        let json = snapshot.to_json().unwrap();

        // label, color, and geometry all live on the same object
        assert!(json.contains("\"type\": \"bbox\""));
        assert!(json.contains("\"label\": \"car\""));
        assert!(!json.contains("\"shape\""));
    }

    #[test]
    fn test_brush_size_uses_camel_case_key() {
        let annotations = vec![annotation(
            "a1",
            AnnotationShape::Brush {
                strokes: vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]],
                brush_size: 20.0,
            },
        )];
        let json = Snapshot::capture(None, &annotations, &[]).to_json().unwrap();
        assert!(json.contains("\"brushSize\""));
        assert!(!json.contains("brush_size"));
    }

    #[test]
    fn test_media_null_round_trip() {
        let json = Snapshot::capture(None, &[], &[]).to_json().unwrap();
        assert!(json.contains("\"media\": null"));
        assert_eq!(Snapshot::from_json(&json).unwrap().media, None);
    }

    #[test]
    fn test_version_gate() {
        let mut snapshot = Snapshot::capture(None, &[], &[]);
        snapshot.version = "2.0".to_string();
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion { .. })
        ));

        // Newer minor versions of the same major still load
        let mut snapshot = Snapshot::capture(None, &[], &[]);
        snapshot.version = "1.7".to_string();
        let json = snapshot.to_json().unwrap();
        assert!(Snapshot::from_json(&json).is_ok());

        let mut snapshot = Snapshot::capture(None, &[], &[]);
        snapshot.version = "garbage".to_string();
        let json = snapshot.to_json().unwrap();
        assert!(Snapshot::from_json(&json).is_err());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let json = r##"{
            "version": "1.0",
            "media": null,
            "annotations": [
                {"label": "x", "color": "#ff0000", "type": "bbox", "x": 0, "y": 0, "w": 2, "h": 2}
            ],
            "labels": []
        }"##;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(SnapshotError::InvalidGeometry { .. })
        ));

        let json = r##"{
            "version": "1.0",
            "media": null,
            "annotations": [
                {"label": "x", "color": "#ff0000", "type": "polygon", "points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}], "closed": true}
            ],
            "labels": []
        }"##;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(SnapshotError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_polygon_closed_defaults_true() {
        let json = r##"{
            "version": "1.0",
            "media": null,
            "annotations": [
                {"label": "x", "color": "#00ff00", "type": "polygon",
                 "points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 5, "y": 8}]}
            ],
            "labels": []
        }"##;
        let snapshot = Snapshot::from_json(json).unwrap();
        match snapshot.annotations[0].to_shape() {
            AnnotationShape::Polygon { closed, .. } => assert!(closed),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_bad_color_string_is_a_json_error() {
        // Multi-byte chars can hit the 6-byte hex length while not being
        // hex at all; this must come back as an error, never a panic.
        let json = r##"{
            "version": "1.0",
            "media": null,
            "annotations": [
                {"label": "x", "color": "ああ", "type": "point", "x": 1, "y": 2}
            ],
            "labels": []
        }"##;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(SnapshotError::Json(_))
        ));
    }
}
