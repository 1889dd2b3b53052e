//! Retained backend: per-layer command caches invalidated by scene edits.
//!
//! Mirrors a scene-graph renderer: each mutator dirties exactly the layers
//! whose commands it can change, and [`encode_frame`] rebuilds only dirty
//! caches before reassembling the passes. Transform, visibility, and opacity
//! changes never touch the caches. Output must stay byte-equal to the
//! immediate backend; both emit through [`paint`].
//!
//! [`encode_frame`]: crate::SceneRenderer::encode_frame

use crate::backend::SceneState;
use crate::{paint, DrawCommand, Frame, LayerData, LayerKind, LayerPass, MediaFrame, SceneItem, SceneRenderer};

#[derive(Debug)]
pub struct RetainedRenderer {
    state: SceneState,
    caches: [Vec<DrawCommand>; 6],
    dirty: [bool; 6],
}

impl Default for RetainedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedRenderer {
    pub fn new() -> Self {
        Self {
            state: SceneState::default(),
            caches: Default::default(),
            dirty: [true; 6],
        }
    }

    fn mark_dirty(&mut self, kind: LayerKind) {
        self.dirty[kind.index()] = true;
    }
}

impl SceneRenderer for RetainedRenderer {
    fn set_media(&mut self, frame: Option<MediaFrame>) {
        self.state.media = frame;
        self.mark_dirty(LayerKind::Media);
        // Heatmap commands stretch over the media rect, so they depend on
        // media dimensions.
        self.mark_dirty(LayerKind::Heatmap);
    }

    fn apply_transform(&mut self, zoom: f64, pan_x: f64, pan_y: f64) {
        // Frame-level; caches stay valid.
        self.state.set_transform(zoom, pan_x, pan_y);
    }

    fn set_layer_data(&mut self, data: LayerData) {
        let kind = self.state.layers.set_data(data);
        self.mark_dirty(kind);
        log::debug!("retained: {} layer invalidated", kind.name());
    }

    fn set_layer_visibility(&mut self, kind: LayerKind, visible: bool, opacity: f32) {
        // Inclusion and opacity are applied at encode time; the cached
        // commands are still correct.
        self.state.layers.set_visibility(kind, visible, opacity);
    }

    fn clear_layers(&mut self) {
        self.state.layers.clear_data();
        for kind in [
            LayerKind::Heatmap,
            LayerKind::Mask,
            LayerKind::Detection,
            LayerKind::Tracking,
        ] {
            self.mark_dirty(kind);
        }
    }

    fn render_annotations(&mut self, items: &[SceneItem], selected: Option<&str>) {
        self.state.items = items.to_vec();
        self.state.selected = selected.map(String::from);
        self.mark_dirty(LayerKind::Annotation);
    }

    fn screen_to_media(&self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        self.state.screen_to_media(sx, sy)
    }

    fn encode_frame(&mut self) -> Frame {
        let mut passes = Vec::new();
        for kind in LayerKind::ORDER {
            if !self.state.pass_visible(kind) {
                continue;
            }
            let i = kind.index();
            if self.dirty[i] {
                self.caches[i] = paint::layer_commands(&self.state, kind);
                self.dirty[i] = false;
                log::trace!(
                    "retained: rebuilt {} layer ({} commands)",
                    kind.name(),
                    self.caches[i].len()
                );
            }
            passes.push(LayerPass {
                layer: kind,
                opacity: self.state.pass_opacity(kind),
                commands: self.caches[i].clone(),
            });
        }
        Frame {
            transform: self.state.transform,
            passes,
        }
    }

    fn name(&self) -> &'static str {
        "retained"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, SceneShape};

    fn items() -> Vec<SceneItem> {
        vec![SceneItem::new(
            "a1",
            "dot",
            Color::RED,
            SceneShape::Point { x: 4.0, y: 5.0 },
        )]
    }

    #[test]
    fn test_caches_survive_transform_changes() {
        let mut r = RetainedRenderer::new();
        r.set_media(Some(MediaFrame::new(1, 64, 64)));
        r.render_annotations(&items(), None);
        let _ = r.encode_frame();
        assert!(!r.dirty[LayerKind::Annotation.index()]);

        r.apply_transform(4.0, 10.0, 10.0);
        assert!(!r.dirty[LayerKind::Annotation.index()]);
        assert!(!r.dirty[LayerKind::Media.index()]);
    }

    #[test]
    fn test_annotation_update_dirties_only_annotations() {
        let mut r = RetainedRenderer::new();
        r.set_media(Some(MediaFrame::new(1, 64, 64)));
        let _ = r.encode_frame();

        r.render_annotations(&items(), Some("a1"));
        assert!(r.dirty[LayerKind::Annotation.index()]);
        assert!(!r.dirty[LayerKind::Media.index()]);
    }

    #[test]
    fn test_media_swap_dirties_heatmap_too() {
        let mut r = RetainedRenderer::new();
        r.set_media(Some(MediaFrame::new(1, 64, 64)));
        let _ = r.encode_frame();

        r.set_media(Some(MediaFrame::new(2, 64, 64)));
        assert!(r.dirty[LayerKind::Media.index()]);
        assert!(r.dirty[LayerKind::Heatmap.index()]);
    }

    #[test]
    fn test_hidden_layer_keeps_stale_cache_until_rebuilt() {
        let mut r = RetainedRenderer::new();
        r.set_media(Some(MediaFrame::new(1, 64, 64)));
        r.render_annotations(&items(), None);
        let before = r.encode_frame();

        // Hide nothing, just re-encode: identical output, no rebuild needed
        let after = r.encode_frame();
        assert_eq!(before, after);
    }
}
