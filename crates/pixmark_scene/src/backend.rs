//! Renderer backend contract.
//!
//! Hosts drive rendering only through [`SceneRenderer`], so the immediate
//! and retained implementations stay interchangeable. Two backends fed the
//! same call sequence must encode equal [`Frame`]s; anything else is a
//! programming error, not a recoverable condition.

use crate::{
    Frame, ImmediateRenderer, LayerData, LayerKind, MediaFrame, MlLayers, RetainedRenderer,
    SceneItem, ViewTransform,
};

/// The drawing surface abstraction the editor talks to.
pub trait SceneRenderer {
    /// Replace the media frame (`None` clears it).
    fn set_media(&mut self, frame: Option<MediaFrame>);

    /// Scene-level transform applied to the whole composited frame.
    fn apply_transform(&mut self, zoom: f64, pan_x: f64, pan_y: f64);

    /// Replace one ML layer's contents wholesale.
    fn set_layer_data(&mut self, data: LayerData);

    /// Toggle or fade one of the ML layers.
    fn set_layer_visibility(&mut self, kind: LayerKind, visible: bool, opacity: f32);

    /// Drop every ML payload. Called when the media they were computed for
    /// goes away; visibility settings survive.
    fn clear_layers(&mut self);

    /// Replace the annotation layer contents (committed items plus any
    /// draft, in render order) and the selected id.
    fn render_annotations(&mut self, items: &[SceneItem], selected: Option<&str>);

    /// Map a screen point through the current transform. `None` while no
    /// media is loaded.
    fn screen_to_media(&self, sx: f64, sy: f64) -> Option<(f64, f64)>;

    /// Encode the current scene into an ordered frame of draw commands.
    fn encode_frame(&mut self) -> Frame;

    /// Implementation name, for logs.
    fn name(&self) -> &'static str;
}

/// Which backend implementation to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Rebuilds every pass from scratch each frame.
    Immediate,
    /// Caches per-layer command lists and rebuilds only what changed.
    Retained,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Immediate => "immediate",
            BackendKind::Retained => "retained",
        }
    }
}

/// Instantiate a backend by kind.
pub fn create_backend(kind: BackendKind) -> Box<dyn SceneRenderer> {
    log::debug!("creating {} backend", kind.name());
    match kind {
        BackendKind::Immediate => Box::new(ImmediateRenderer::new()),
        BackendKind::Retained => Box::new(RetainedRenderer::new()),
    }
}

// ============================================================================
// Shared backend state
// ============================================================================

/// The scene inputs every backend mirrors, whatever its caching strategy.
#[derive(Debug, Default)]
pub(crate) struct SceneState {
    pub media: Option<MediaFrame>,
    pub transform: ViewTransform,
    pub layers: MlLayers,
    pub items: Vec<SceneItem>,
    pub selected: Option<String>,
}

impl SceneState {
    pub fn set_transform(&mut self, zoom: f64, pan_x: f64, pan_y: f64) {
        debug_assert!(
            zoom.is_finite() && zoom > 0.0,
            "non-positive zoom reached a backend: {zoom}"
        );
        self.transform = ViewTransform { zoom, pan_x, pan_y };
    }

    pub fn screen_to_media(&self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        self.media.as_ref()?;
        let t = &self.transform;
        Some(((sx - t.pan_x) / t.zoom, (sy - t.pan_y) / t.zoom))
    }

    /// Whether a pass for this layer belongs in the encoded frame.
    ///
    /// Media renders when present; the annotation layer always renders; ML
    /// layers render when visible, populated, and overlaying actual media.
    pub fn pass_visible(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Media => self.media.is_some(),
            LayerKind::Annotation => true,
            _ => {
                self.media.is_some()
                    && self.layers.settings(kind).visible
                    && self.layers.has_data(kind)
            }
        }
    }

    pub fn pass_opacity(&self, kind: LayerKind) -> f32 {
        self.layers.settings(kind).opacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Detection, HeatmapGrid, Point, SceneShape, Viewport};
    use ndarray::Array2;

    fn demo_items() -> Vec<SceneItem> {
        vec![
            SceneItem::new(
                "a1",
                "car",
                Color::from_rgb8(255, 107, 107),
                SceneShape::Rect {
                    x: 40.0,
                    y: 30.0,
                    w: 120.0,
                    h: 90.0,
                },
            ),
            SceneItem::new(
                "a2",
                "lane",
                Color::from_rgb8(78, 205, 196),
                SceneShape::Polygon {
                    points: vec![
                        Point::new(10.0, 10.0),
                        Point::new(80.0, 15.0),
                        Point::new(50.0, 70.0),
                    ],
                    closed: true,
                },
            ),
        ]
    }

    fn demo_heatmap() -> HeatmapGrid {
        let mut data = Array2::zeros((4, 6));
        data[[1, 2]] = 0.5;
        data[[3, 5]] = 1.0;
        HeatmapGrid::new(data)
    }

    fn demo_detections() -> Vec<Detection> {
        vec![Detection {
            x: 12.0,
            y: 8.0,
            w: 40.0,
            h: 28.0,
            label: "person".to_string(),
            color: Color::from_rgb8(255, 230, 109),
            confidence: 0.91,
        }]
    }

    /// Drive one scripted editing session against a backend.
    fn run_script(backend: &mut dyn SceneRenderer) -> Vec<Frame> {
        let mut frames = Vec::new();

        backend.set_media(Some(MediaFrame::new(1, 640, 480)));
        backend.apply_transform(1.0, 0.0, 0.0);
        frames.push(backend.encode_frame());

        backend.set_layer_data(LayerData::Heatmap(demo_heatmap()));
        backend.set_layer_data(LayerData::Detections(demo_detections()));
        frames.push(backend.encode_frame());

        backend.render_annotations(&demo_items(), None);
        frames.push(backend.encode_frame());

        backend.render_annotations(&demo_items(), Some("a2"));
        backend.apply_transform(2.5, -120.0, 45.0);
        frames.push(backend.encode_frame());

        backend.set_layer_visibility(LayerKind::Heatmap, false, 0.6);
        frames.push(backend.encode_frame());

        backend.set_layer_visibility(LayerKind::Heatmap, true, 0.25);
        backend.set_layer_data(LayerData::Detections(Vec::new()));
        frames.push(backend.encode_frame());

        // Video-style frame swap, then unload
        backend.set_media(Some(MediaFrame::new(2, 640, 480)));
        frames.push(backend.encode_frame());
        backend.clear_layers();
        frames.push(backend.encode_frame());
        backend.set_media(None);
        frames.push(backend.encode_frame());

        frames
    }

    #[test]
    fn test_backends_encode_identical_frames() {
        let mut immediate = create_backend(BackendKind::Immediate);
        let mut retained = create_backend(BackendKind::Retained);

        let a = run_script(immediate.as_mut());
        let b = run_script(retained.as_mut());

        assert_eq!(a.len(), b.len());
        for (step, (fa, fb)) in a.iter().zip(&b).enumerate() {
            assert_eq!(fa, fb, "frames diverged at step {step}");
        }
    }

    #[test]
    fn test_passes_follow_layer_order() {
        let mut backend = create_backend(BackendKind::Immediate);
        backend.set_media(Some(MediaFrame::new(1, 100, 100)));
        backend.set_layer_data(LayerData::Heatmap(demo_heatmap()));
        backend.set_layer_data(LayerData::Detections(demo_detections()));
        backend.render_annotations(&demo_items(), None);

        let frame = backend.encode_frame();
        let indices: Vec<usize> = frame.passes.iter().map(|p| p.layer.index()).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        assert_eq!(frame.passes.last().map(|p| p.layer), Some(LayerKind::Annotation));
    }

    #[test]
    fn test_hidden_layer_omitted_and_opacity_carried() {
        let mut backend = create_backend(BackendKind::Retained);
        backend.set_media(Some(MediaFrame::new(1, 100, 100)));
        backend.set_layer_data(LayerData::Heatmap(demo_heatmap()));

        let frame = backend.encode_frame();
        let pass = frame.pass(LayerKind::Heatmap).expect("heatmap pass");
        assert_eq!(pass.opacity, 0.6);

        backend.set_layer_visibility(LayerKind::Heatmap, false, 0.6);
        assert!(backend.encode_frame().pass(LayerKind::Heatmap).is_none());

        backend.set_layer_visibility(LayerKind::Heatmap, true, 0.2);
        let frame = backend.encode_frame();
        assert_eq!(frame.pass(LayerKind::Heatmap).map(|p| p.opacity), Some(0.2));
    }

    #[test]
    fn test_annotation_pass_present_even_when_empty() {
        let mut backend = create_backend(BackendKind::Immediate);
        let frame = backend.encode_frame();
        let pass = frame.pass(LayerKind::Annotation).expect("annotation pass");
        assert!(pass.commands.is_empty());
        // No media: nothing else encodes
        assert_eq!(frame.passes.len(), 1);
    }

    #[test]
    fn test_retained_reencode_is_stable() {
        let mut backend = create_backend(BackendKind::Retained);
        backend.set_media(Some(MediaFrame::new(1, 320, 200)));
        backend.render_annotations(&demo_items(), Some("a1"));

        let first = backend.encode_frame();
        let second = backend.encode_frame();
        assert_eq!(first, second);
    }

    #[test]
    fn test_screen_to_media_matches_viewport_math() {
        let mut backend = create_backend(BackendKind::Immediate);
        assert_eq!(backend.screen_to_media(10.0, 10.0), None);

        backend.set_media(Some(MediaFrame::new(1, 640, 480)));
        backend.apply_transform(2.0, 100.0, -50.0);

        let mut viewport = Viewport::new();
        viewport.set_media_size(640.0, 480.0);
        viewport.set_zoom(2.0);
        viewport.pan_by(100.0, -50.0);

        let (bx, by) = backend.screen_to_media(300.0, 200.0).unwrap();
        let p = viewport.screen_to_media(300.0, 200.0);
        assert!((bx - p.x).abs() < 1e-9);
        assert!((by - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_transform_rides_along_in_frame() {
        let mut backend = create_backend(BackendKind::Retained);
        backend.set_media(Some(MediaFrame::new(1, 10, 10)));
        backend.apply_transform(3.0, 7.0, -2.0);
        let frame = backend.encode_frame();
        assert_eq!(
            frame.transform,
            ViewTransform {
                zoom: 3.0,
                pan_x: 7.0,
                pan_y: -2.0
            }
        );
    }
}
