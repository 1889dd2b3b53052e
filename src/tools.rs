//! Tool state machine: pointer gestures to drafts to committed annotations.
//!
//! The controller receives pointer events already mapped into media space
//! and runs one draft at a time. Commit minima are enforced here: a finish
//! gesture on an under-sized draft either discards it (bbox, freehand) or
//! is a no-op that leaves the draft active (polygon, polyline). Only
//! [`AnnotationStore::commit`] is ever called with finished geometry, so
//! nothing below the minima can enter the document.

use pixmark_scene::{Color, Point, SceneItem, SceneShape};

use crate::constants::DEFAULT_BRUSH_SIZE;
use crate::model::{
    AnnotationId, AnnotationShape, MIN_BRUSH_STROKE_POINTS, MIN_FREEHAND_POINTS,
    MIN_POLYGON_VERTICES, MIN_POLYLINE_VERTICES,
};
use crate::store::AnnotationStore;

/// Annotation tools a host can activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Hit-test and select committed annotations.
    #[default]
    Select,
    /// Drag out an axis-aligned box.
    Bbox,
    /// Single click drops a point marker.
    Point,
    /// Click vertices, double-click or right-click to close.
    Polygon,
    /// Click vertices, double-click or right-click to finish open.
    Polyline,
    /// Hold and drag a continuous path.
    Freehand,
    /// Paint strokes at a fixed width, finish explicitly.
    Brush,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Bbox => "bbox",
            Tool::Point => "point",
            Tool::Polygon => "polygon",
            Tool::Polyline => "polyline",
            Tool::Freehand => "freehand",
            Tool::Brush => "brush",
        }
    }

    /// All tools, in toolbar order.
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Select,
            Tool::Bbox,
            Tool::Point,
            Tool::Polygon,
            Tool::Polyline,
            Tool::Freehand,
            Tool::Brush,
        ]
    }

    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, Tool::Select)
    }
}

/// Geometry accumulated by an in-progress gesture.
#[derive(Debug, Clone, Default)]
pub enum DraftState {
    #[default]
    Idle,
    /// Bbox drag: the anchor corner and the corner under the pointer.
    DraggingBbox { start: Point, current: Point },
    /// Freehand points recorded while the button is held.
    Stroking { points: Vec<Point> },
    /// Polygon or polyline vertices accumulated across clicks.
    Multipoint { points: Vec<Point> },
    /// Brush strokes; the last stroke is open while `stroking` is set.
    Brush {
        strokes: Vec<Vec<Point>>,
        brush_size: f64,
        stroking: bool,
    },
}

impl DraftState {
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DraftState::Idle)
    }
}

/// What a pointer event did, so the host knows what to refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Input consumed without any observable change.
    Ignored,
    /// The draft changed; the annotation layer needs a redraw.
    DraftChanged,
    /// Selection moved or cleared.
    SelectionChanged(Option<AnnotationId>),
    /// A draft was committed as a new annotation.
    Committed(AnnotationId),
    /// An in-progress draft was thrown away.
    DraftDiscarded,
}

/// Per-tool interaction lifecycle. Owns the active tool, the current draft,
/// and the label/color that commits are tagged with.
#[derive(Debug)]
pub struct ToolController {
    tool: Tool,
    draft: DraftState,
    /// Media extent in media pixels; `None` rejects every pointer down.
    media_size: Option<(f64, f64)>,
    label: String,
    color: Color,
    brush_size: f64,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolController {
    pub fn new() -> Self {
        Self {
            tool: Tool::default(),
            draft: DraftState::Idle,
            media_size: None,
            label: String::new(),
            color: Color::WHITE,
            brush_size: DEFAULT_BRUSH_SIZE,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Any in-progress draft is discarded first.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.draft.is_drawing() {
            log::debug!("tool switch discarded an in-progress {} draft", self.tool.name());
            self.draft = DraftState::Idle;
        }
        self.tool = tool;
        log::info!("tool: {}", tool.name());
    }

    /// Record the extent pointer downs are checked against. Changing media
    /// invalidates any draft made on the old one.
    pub fn set_media_size(&mut self, size: Option<(f64, f64)>) {
        self.media_size = size;
        self.draft = DraftState::Idle;
    }

    /// Label and color stamped onto subsequent commits.
    pub fn set_active_label(&mut self, name: impl Into<String>, color: Color) {
        self.label = name.into();
        self.color = color;
    }

    pub fn active_label(&self) -> &str {
        &self.label
    }

    pub fn set_brush_size(&mut self, size: f64) {
        // Non-finite sizes would survive to export and fail re-import
        if size.is_finite() && size > 0.0 {
            self.brush_size = size;
        }
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    pub fn is_drawing(&self) -> bool {
        self.draft.is_drawing()
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    // ------------------------------------------------------------------
    // Pointer events (media coordinates)
    // ------------------------------------------------------------------

    /// Button press. Rejected outside the media extent for every tool.
    pub fn pointer_down(&mut self, store: &mut AnnotationStore, x: f64, y: f64) -> ToolOutcome {
        if !self.in_bounds(x, y) {
            log::trace!("pointer down at ({x:.1}, {y:.1}) outside media, ignored");
            return ToolOutcome::Ignored;
        }
        let tool = self.tool;
        match tool {
            Tool::Select => {
                let hit = store.find_at(x, y).map(|a| a.id.clone());
                store.select(hit.as_deref());
                log::debug!("select at ({x:.1}, {y:.1}): {hit:?}");
                ToolOutcome::SelectionChanged(hit)
            }
            Tool::Bbox => {
                let p = Point::new(x, y);
                self.draft = DraftState::DraggingBbox { start: p, current: p };
                log::debug!("bbox: started at ({x:.1}, {y:.1})");
                ToolOutcome::DraftChanged
            }
            Tool::Point => self.commit(store, AnnotationShape::Point { x, y }),
            Tool::Polygon | Tool::Polyline => {
                match &mut self.draft {
                    DraftState::Multipoint { points } => {
                        points.push(Point::new(x, y));
                        log::debug!("{}: vertex {} at ({x:.1}, {y:.1})", tool.name(), points.len());
                    }
                    _ => {
                        self.draft = DraftState::Multipoint {
                            points: vec![Point::new(x, y)],
                        };
                        log::debug!("{}: started at ({x:.1}, {y:.1})", tool.name());
                    }
                }
                ToolOutcome::DraftChanged
            }
            Tool::Freehand => {
                self.draft = DraftState::Stroking {
                    points: vec![Point::new(x, y)],
                };
                log::debug!("freehand: started at ({x:.1}, {y:.1})");
                ToolOutcome::DraftChanged
            }
            Tool::Brush => {
                match &mut self.draft {
                    DraftState::Brush { strokes, stroking, .. } => {
                        strokes.push(vec![Point::new(x, y)]);
                        *stroking = true;
                        log::debug!("brush: stroke {} started", strokes.len());
                    }
                    _ => {
                        self.draft = DraftState::Brush {
                            strokes: vec![vec![Point::new(x, y)]],
                            brush_size: self.brush_size,
                            stroking: true,
                        };
                        log::debug!("brush: started at ({x:.1}, {y:.1})");
                    }
                }
                ToolOutcome::DraftChanged
            }
        }
    }

    /// Pointer motion. Only feeds an active drag; idle motion is ignored.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> ToolOutcome {
        match &mut self.draft {
            DraftState::DraggingBbox { current, .. } => {
                *current = Point::new(x, y);
                ToolOutcome::DraftChanged
            }
            DraftState::Stroking { points } => {
                points.push(Point::new(x, y));
                ToolOutcome::DraftChanged
            }
            DraftState::Brush { strokes, stroking: true, .. } => {
                if let Some(stroke) = strokes.last_mut() {
                    stroke.push(Point::new(x, y));
                }
                ToolOutcome::DraftChanged
            }
            _ => ToolOutcome::Ignored,
        }
    }

    /// Button release. Resolves bbox and freehand drags; closes the open
    /// brush stroke without finishing the draft.
    pub fn pointer_up(&mut self, store: &mut AnnotationStore, x: f64, y: f64) -> ToolOutcome {
        match &mut self.draft {
            DraftState::DraggingBbox { start, current } => {
                *current = Point::new(x, y);
                let (a, b) = (*start, *current);
                self.draft = DraftState::Idle;
                match AnnotationShape::bbox_from_corners(a.x, a.y, b.x, b.y) {
                    Some(shape) => self.commit(store, shape),
                    None => {
                        log::debug!("bbox: drag below minimum size, discarded");
                        ToolOutcome::DraftDiscarded
                    }
                }
            }
            DraftState::Stroking { points } => {
                let points = std::mem::take(points);
                self.draft = DraftState::Idle;
                if points.len() >= MIN_FREEHAND_POINTS {
                    self.commit(store, AnnotationShape::Freehand { points })
                } else {
                    log::debug!("freehand: only {} points, discarded", points.len());
                    ToolOutcome::DraftDiscarded
                }
            }
            DraftState::Brush { strokes, stroking, .. } => {
                if !*stroking {
                    return ToolOutcome::Ignored;
                }
                *stroking = false;
                // A tap leaves a degenerate single-point stroke; drop it
                if strokes.last().is_some_and(|s| s.len() < MIN_BRUSH_STROKE_POINTS) {
                    strokes.pop();
                    log::debug!("brush: degenerate stroke dropped");
                }
                if strokes.is_empty() {
                    self.draft = DraftState::Idle;
                    return ToolOutcome::DraftDiscarded;
                }
                ToolOutcome::DraftChanged
            }
            _ => ToolOutcome::Ignored,
        }
    }

    /// Double-click finishes multipoint and brush drafts.
    pub fn double_click(&mut self, store: &mut AnnotationStore) -> ToolOutcome {
        self.finish_draft(store)
    }

    /// Right-click means the same thing as a double-click.
    pub fn context_menu(&mut self, store: &mut AnnotationStore) -> ToolOutcome {
        self.finish_draft(store)
    }

    /// Discard any in-progress draft. Safe to call in any state.
    pub fn cancel(&mut self) -> ToolOutcome {
        if self.draft.is_drawing() {
            log::debug!("{} draft cancelled", self.tool.name());
            self.draft = DraftState::Idle;
            ToolOutcome::DraftDiscarded
        } else {
            ToolOutcome::Ignored
        }
    }

    /// The in-progress draft as a renderable scene item, if any. Polygon
    /// drafts render open until the finish gesture closes them.
    pub fn draft_item(&self) -> Option<SceneItem> {
        let shape = match &self.draft {
            DraftState::Idle => return None,
            DraftState::DraggingBbox { start, current } => SceneShape::Rect {
                x: start.x.min(current.x),
                y: start.y.min(current.y),
                w: (current.x - start.x).abs(),
                h: (current.y - start.y).abs(),
            },
            DraftState::Stroking { points } => SceneShape::Path {
                points: points.clone(),
                markers: false,
            },
            DraftState::Multipoint { points } => match self.tool {
                Tool::Polygon => SceneShape::Polygon {
                    points: points.clone(),
                    closed: false,
                },
                _ => SceneShape::Path {
                    points: points.clone(),
                    markers: true,
                },
            },
            DraftState::Brush { strokes, brush_size, .. } => SceneShape::Brush {
                strokes: strokes.clone(),
                width: *brush_size,
            },
        };
        Some(SceneItem::draft(self.label.clone(), self.color, shape))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolve the finish gesture against the active draft. Under-minimum
    /// multipoint drafts stay active so the user can keep adding vertices.
    fn finish_draft(&mut self, store: &mut AnnotationStore) -> ToolOutcome {
        let tool = self.tool;
        match &mut self.draft {
            DraftState::Multipoint { points } => {
                let min = match tool {
                    Tool::Polygon => MIN_POLYGON_VERTICES,
                    _ => MIN_POLYLINE_VERTICES,
                };
                if points.len() < min {
                    log::debug!(
                        "{}: finish with {}/{} points is a no-op",
                        tool.name(),
                        points.len(),
                        min
                    );
                    return ToolOutcome::Ignored;
                }
                let points = std::mem::take(points);
                self.draft = DraftState::Idle;
                let shape = match tool {
                    Tool::Polygon => AnnotationShape::Polygon { points, closed: true },
                    _ => AnnotationShape::Polyline { points },
                };
                self.commit(store, shape)
            }
            DraftState::Brush { strokes, brush_size, .. } => {
                let mut strokes = std::mem::take(strokes);
                let brush_size = *brush_size;
                strokes.retain(|s| s.len() >= MIN_BRUSH_STROKE_POINTS);
                self.draft = DraftState::Idle;
                if strokes.is_empty() {
                    log::debug!("brush: finish with no usable strokes, discarded");
                    return ToolOutcome::DraftDiscarded;
                }
                self.commit(store, AnnotationShape::Brush { strokes, brush_size })
            }
            _ => ToolOutcome::Ignored,
        }
    }

    fn commit(&mut self, store: &mut AnnotationStore, shape: AnnotationShape) -> ToolOutcome {
        let id = store.commit(shape, self.label.clone(), self.color);
        ToolOutcome::Committed(id)
    }

    fn in_bounds(&self, x: f64, y: f64) -> bool {
        match self.media_size {
            Some((w, h)) => x >= 0.0 && x <= w && y >= 0.0 && y <= h,
            None => false,
        }
    }
}
