//! Immediate-mode backend: no caches, every frame rebuilt from scratch.
//!
//! The canvas-style reference implementation. It keeps only the current
//! scene inputs and re-emits every pass on each [`encode_frame`], which
//! makes it trivially correct and the baseline the retained backend is
//! compared against.
//!
//! [`encode_frame`]: crate::SceneRenderer::encode_frame

use crate::backend::SceneState;
use crate::{paint, Frame, LayerData, LayerKind, LayerPass, MediaFrame, SceneItem, SceneRenderer};

#[derive(Debug, Default)]
pub struct ImmediateRenderer {
    state: SceneState,
}

impl ImmediateRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneRenderer for ImmediateRenderer {
    fn set_media(&mut self, frame: Option<MediaFrame>) {
        self.state.media = frame;
    }

    fn apply_transform(&mut self, zoom: f64, pan_x: f64, pan_y: f64) {
        self.state.set_transform(zoom, pan_x, pan_y);
    }

    fn set_layer_data(&mut self, data: LayerData) {
        let kind = self.state.layers.set_data(data);
        log::trace!("immediate: {} layer replaced", kind.name());
    }

    fn set_layer_visibility(&mut self, kind: LayerKind, visible: bool, opacity: f32) {
        self.state.layers.set_visibility(kind, visible, opacity);
    }

    fn clear_layers(&mut self) {
        self.state.layers.clear_data();
    }

    fn render_annotations(&mut self, items: &[SceneItem], selected: Option<&str>) {
        self.state.items = items.to_vec();
        self.state.selected = selected.map(String::from);
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
            passes.push(LayerPass {
                layer: kind,
                opacity: self.state.pass_opacity(kind),
                commands: paint::layer_commands(&self.state, kind),
            });
        }
        Frame {
            transform: self.state.transform,
            passes,
        }
    }

    fn name(&self) -> &'static str {
        "immediate"
    }
}
