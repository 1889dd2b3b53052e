//! Shared command emission: the one place per-type draw rules live.
//!
//! Every backend builds its passes through this module, which is what
//! guarantees interchangeable backends issue identical draw-call sequences
//! for identical scene state.

use crate::backend::SceneState;
use crate::{
    Color, Detection, DrawCommand, HeatmapGrid, LayerKind, MaskRegion, MediaFrame, Point,
    SceneItem, SceneShape, TrackPath,
};

// Style values are media-space units; the frame transform scales them along
// with the geometry.
const STROKE_WIDTH: f64 = 2.0;
const SELECTION_STROKE_WIDTH: f64 = 3.0;
const FILL_ALPHA: f32 = 0.2;
const SELECTION_FILL_ALPHA: f32 = 0.35;
const DRAFT_ALPHA: f32 = 0.7;
const POINT_RADIUS: f64 = 6.0;
const SELECTION_RING_WIDTH: f64 = 2.0;
const VERTEX_RADIUS: f64 = 3.5;
const HANDLE_SIZE: f64 = 8.0;
const BRUSH_ALPHA: f32 = 0.5;
const TRACK_POINT_RADIUS: f64 = 3.0;

const CHIP_TEXT_SIZE: f64 = 12.0;
const CHIP_PADDING: f64 = 4.0;
const CHIP_HEIGHT: f64 = CHIP_TEXT_SIZE + CHIP_PADDING * 2.0;
/// Approximate character width as a ratio of text size, for chip sizing.
const CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Rebuild the command list for one layer from current scene state.
pub(crate) fn layer_commands(state: &SceneState, kind: LayerKind) -> Vec<DrawCommand> {
    match kind {
        LayerKind::Media => state.media.as_ref().map(media_pass).unwrap_or_default(),
        LayerKind::Heatmap => match (&state.layers.heatmap, &state.media) {
            (Some(grid), Some(media)) => {
                heatmap_pass(grid, media.width as f64, media.height as f64)
            }
            _ => Vec::new(),
        },
        LayerKind::Mask => state.layers.masks.as_deref().map(mask_pass).unwrap_or_default(),
        LayerKind::Detection => state
            .layers
            .detections
            .as_deref()
            .map(detection_pass)
            .unwrap_or_default(),
        LayerKind::Tracking => state
            .layers
            .tracks
            .as_deref()
            .map(track_pass)
            .unwrap_or_default(),
        LayerKind::Annotation => annotation_pass(&state.items, state.selected.as_deref()),
    }
}

pub fn media_pass(frame: &MediaFrame) -> Vec<DrawCommand> {
    vec![DrawCommand::Image {
        frame: frame.clone(),
    }]
}

pub fn heatmap_pass(grid: &HeatmapGrid, media_w: f64, media_h: f64) -> Vec<DrawCommand> {
    vec![DrawCommand::Heatmap {
        grid: grid.clone(),
        w: media_w,
        h: media_h,
    }]
}

pub fn mask_pass(masks: &[MaskRegion]) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    for mask in masks {
        if mask.points.len() < 3 {
            continue;
        }
        out.push(DrawCommand::FillPolygon {
            points: mask.points.clone(),
            color: mask.fill,
        });
        out.push(DrawCommand::StrokePath {
            points: mask.points.clone(),
            color: mask.border,
            width: STROKE_WIDTH,
            closed: true,
            round_cap: false,
        });
    }
    out
}

pub fn detection_pass(detections: &[Detection]) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    for det in detections {
        out.push(DrawCommand::StrokeRect {
            x: det.x,
            y: det.y,
            w: det.w,
            h: det.h,
            color: det.color,
            width: STROKE_WIDTH,
        });
        let text = format!("{} {:.0}%", det.label, f64::from(det.confidence) * 100.0);
        label_chip(&text, det.color, det.x, det.y, &mut out);
    }
    out
}

pub fn track_pass(tracks: &[TrackPath]) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    for track in tracks {
        if track.points.len() >= 2 {
            out.push(DrawCommand::StrokePath {
                points: track.points.clone(),
                color: track.color,
                width: STROKE_WIDTH,
                closed: false,
                round_cap: false,
            });
        }
        for p in &track.points {
            out.push(DrawCommand::FillCircle {
                cx: p.x,
                cy: p.y,
                radius: TRACK_POINT_RADIUS,
                color: track.color,
            });
        }
    }
    out
}

/// Commands for the annotation layer: items in list order (list order is
/// render order), each styled by selection and draft status.
pub fn annotation_pass(items: &[SceneItem], selected: Option<&str>) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    for item in items {
        let is_selected = !item.draft && selected == Some(item.id.as_str());
        paint_item(item, is_selected, &mut out);
    }
    out
}

fn paint_item(item: &SceneItem, selected: bool, out: &mut Vec<DrawCommand>) {
    let base_alpha = if item.draft { DRAFT_ALPHA } else { 1.0 };
    let stroke = item.color.scale_alpha(base_alpha);
    let stroke_width = if selected {
        SELECTION_STROKE_WIDTH
    } else {
        STROKE_WIDTH
    };
    let fill_alpha = if selected {
        SELECTION_FILL_ALPHA
    } else {
        FILL_ALPHA
    };
    let fill = item.color.scale_alpha(fill_alpha * base_alpha);

    match &item.shape {
        SceneShape::Rect { x, y, w, h } => {
            out.push(DrawCommand::FillRect {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
                color: fill,
            });
            out.push(DrawCommand::StrokeRect {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
                color: stroke,
                width: stroke_width,
            });
            if !item.draft {
                label_chip(&item.label, item.color, *x, *y, out);
            }
            if selected {
                rect_handles(*x, *y, *w, *h, out);
            }
        }
        SceneShape::Polygon { points, closed } => {
            if *closed && points.len() >= 3 {
                out.push(DrawCommand::FillPolygon {
                    points: points.clone(),
                    color: fill,
                });
            }
            if points.len() >= 2 {
                out.push(DrawCommand::StrokePath {
                    points: points.clone(),
                    color: stroke,
                    width: stroke_width,
                    closed: *closed,
                    round_cap: false,
                });
            }
            if selected {
                for p in points {
                    handle_square(p.x, p.y, out);
                }
            } else {
                for p in points {
                    out.push(DrawCommand::FillCircle {
                        cx: p.x,
                        cy: p.y,
                        radius: VERTEX_RADIUS,
                        color: stroke,
                    });
                }
            }
            if !item.draft {
                if let Some(c) = centroid(points) {
                    label_chip(&item.label, item.color, c.x, c.y, out);
                }
            }
        }
        SceneShape::Point { x, y } => {
            out.push(DrawCommand::FillCircle {
                cx: *x,
                cy: *y,
                radius: POINT_RADIUS,
                color: stroke,
            });
            out.push(DrawCommand::StrokeCircle {
                cx: *x,
                cy: *y,
                radius: POINT_RADIUS,
                color: Color::BLACK.scale_alpha(base_alpha),
                width: 1.0,
            });
            if selected {
                out.push(DrawCommand::StrokeCircle {
                    cx: *x,
                    cy: *y,
                    radius: POINT_RADIUS + 2.0,
                    color: Color::WHITE,
                    width: SELECTION_RING_WIDTH,
                });
            }
        }
        SceneShape::Path { points, markers } => {
            if points.len() >= 2 {
                out.push(DrawCommand::StrokePath {
                    points: points.clone(),
                    color: stroke,
                    width: stroke_width,
                    closed: false,
                    round_cap: false,
                });
            }
            if *markers {
                for p in points {
                    out.push(DrawCommand::FillCircle {
                        cx: p.x,
                        cy: p.y,
                        radius: VERTEX_RADIUS,
                        color: stroke,
                    });
                }
            }
        }
        SceneShape::Brush { strokes, width } => {
            let brush = item.color.scale_alpha(BRUSH_ALPHA * base_alpha);
            for stroke_points in strokes {
                if stroke_points.len() < 2 {
                    continue;
                }
                out.push(DrawCommand::StrokePath {
                    points: stroke_points.clone(),
                    color: brush,
                    width: *width,
                    closed: false,
                    round_cap: true,
                });
            }
            if selected {
                // Thin centerline so selection reads at any brush width
                for stroke_points in strokes {
                    if stroke_points.len() < 2 {
                        continue;
                    }
                    out.push(DrawCommand::StrokePath {
                        points: stroke_points.clone(),
                        color: Color::WHITE,
                        width: 1.0,
                        closed: false,
                        round_cap: true,
                    });
                }
            }
        }
    }
}

/// Label chip anchored above `(x, y)`: filled background plus text.
fn label_chip(label: &str, color: Color, x: f64, y: f64, out: &mut Vec<DrawCommand>) {
    if label.is_empty() {
        return;
    }
    let text_w = label.chars().count() as f64 * CHIP_TEXT_SIZE * CHAR_WIDTH_FACTOR;
    let top = y - CHIP_HEIGHT;
    out.push(DrawCommand::FillRect {
        x,
        y: top,
        w: text_w + CHIP_PADDING * 2.0,
        h: CHIP_HEIGHT,
        color: color.with_alpha(0.9),
    });
    out.push(DrawCommand::Text {
        text: label.to_string(),
        x: x + CHIP_PADDING,
        y: top + CHIP_PADDING,
        size: CHIP_TEXT_SIZE,
        color: Color::WHITE,
    });
}

/// Corner and edge-midpoint handles for a selected box.
fn rect_handles(x: f64, y: f64, w: f64, h: f64, out: &mut Vec<DrawCommand>) {
    let xs = [x, x + w / 2.0, x + w];
    let ys = [y, y + h / 2.0, y + h];
    for (yi, hy) in ys.into_iter().enumerate() {
        for (xi, hx) in xs.into_iter().enumerate() {
            if xi == 1 && yi == 1 {
                continue; // no center handle
            }
            handle_square(hx, hy, out);
        }
    }
}

fn handle_square(cx: f64, cy: f64, out: &mut Vec<DrawCommand>) {
    let half = HANDLE_SIZE / 2.0;
    out.push(DrawCommand::FillRect {
        x: cx - half,
        y: cy - half,
        w: HANDLE_SIZE,
        h: HANDLE_SIZE,
        color: Color::WHITE,
    });
    out.push(DrawCommand::StrokeRect {
        x: cx - half,
        y: cy - half,
        w: HANDLE_SIZE,
        h: HANDLE_SIZE,
        color: Color::BLACK,
        width: 1.0,
    });
}

/// Vertex mean; good enough as a chip anchor for annotation polygons.
fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_item(selected_label: &str) -> SceneItem {
        SceneItem::new(
            "a1",
            selected_label,
            Color::RED,
            SceneShape::Rect {
                x: 10.0,
                y: 20.0,
                w: 30.0,
                h: 40.0,
            },
        )
    }

    #[test]
    fn test_bbox_commands_fill_stroke_chip() {
        let items = [rect_item("car")];
        let cmds = annotation_pass(&items, None);
        // fill + stroke + chip background + chip text
        assert_eq!(cmds.len(), 4);
        assert!(matches!(cmds[0], DrawCommand::FillRect { .. }));
        assert!(matches!(
            cmds[1],
            DrawCommand::StrokeRect { width, .. } if width == STROKE_WIDTH
        ));
    }

    #[test]
    fn test_selected_bbox_gets_handles_and_heavier_stroke() {
        let items = [rect_item("car")];
        let cmds = annotation_pass(&items, Some("a1"));
        assert!(cmds.iter().any(|c| matches!(
            c,
            DrawCommand::StrokeRect { width, .. } if *width == SELECTION_STROKE_WIDTH
        )));
        // 8 handles, two commands each, on top of fill/stroke/chip
        assert_eq!(cmds.len(), 4 + 16);
    }

    #[test]
    fn test_empty_label_skips_chip() {
        let items = [rect_item("")];
        let cmds = annotation_pass(&items, None);
        assert_eq!(cmds.len(), 2);
        assert!(!cmds.iter().any(|c| matches!(c, DrawCommand::Text { .. })));
    }

    #[test]
    fn test_draft_items_render_dimmed_without_chip() {
        let draft = SceneItem::draft(
            "car",
            Color::RED,
            SceneShape::Rect {
                x: 0.0,
                y: 0.0,
                w: 5.0,
                h: 5.0,
            },
        );
        let cmds = annotation_pass(std::slice::from_ref(&draft), None);
        assert_eq!(cmds.len(), 2);
        match &cmds[1] {
            DrawCommand::StrokeRect { color, .. } => assert!((color.a - DRAFT_ALPHA).abs() < 1e-6),
            other => panic!("expected stroke, got {other:?}"),
        }
    }

    #[test]
    fn test_draft_never_selected() {
        // A draft with an empty id must not match an empty selection string
        let draft = SceneItem::draft(
            "x",
            Color::RED,
            SceneShape::Rect {
                x: 0.0,
                y: 0.0,
                w: 5.0,
                h: 5.0,
            },
        );
        let cmds = annotation_pass(std::slice::from_ref(&draft), Some(""));
        assert!(!cmds.iter().any(|c| matches!(c, DrawCommand::FillRect { color, .. } if *color == Color::WHITE)));
    }

    #[test]
    fn test_detection_chip_includes_confidence() {
        let dets = [Detection {
            x: 0.0,
            y: 50.0,
            w: 10.0,
            h: 10.0,
            label: "person".to_string(),
            color: Color::RED,
            confidence: 0.87,
        }];
        let cmds = detection_pass(&dets);
        assert!(cmds.iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if text == "person 87%"
        )));
    }

    #[test]
    fn test_brush_emits_one_path_per_stroke() {
        let item = SceneItem::new(
            "b1",
            "",
            Color::RED,
            SceneShape::Brush {
                strokes: vec![
                    vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
                    vec![Point::new(10.0, 0.0), Point::new(15.0, 5.0)],
                    vec![Point::new(99.0, 99.0)], // degenerate, skipped
                ],
                width: 24.0,
            },
        );
        let cmds = annotation_pass(std::slice::from_ref(&item), None);
        assert_eq!(cmds.len(), 2);
        assert!(cmds.iter().all(|c| matches!(
            c,
            DrawCommand::StrokePath { round_cap: true, width, .. } if *width == 24.0
        )));
    }

    #[test]
    fn test_polygon_centroid_anchor() {
        assert_eq!(
            centroid(&[
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0)
            ]),
            Some(Point::new(5.0, 5.0))
        );
        assert_eq!(centroid(&[]), None);
    }
}
