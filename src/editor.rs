//! Editor shell: one explicit root of state wiring the store, tools,
//! labels, layers, media, and any number of render surfaces together.
//!
//! Every mutation path follows the same order: change the document, push
//! the change to every attached backend, then notify subscribers. Scene
//! content (annotations, draft, layers, media) is shared by all surfaces;
//! each surface owns only its viewport, so zoom and pan on one never leak
//! into another. Everything is single-threaded; subscribers run
//! synchronously on the mutating call.

use pixmark_scene::{
    create_backend, BackendKind, Frame, LayerData, LayerKind, LayerSettings, MediaFrame, MlLayers,
    SceneItem, SceneRenderer, SceneShape, Viewport,
};
use web_time::Instant;

use crate::constants::{DEFAULT_LABEL_ID, DEFAULT_LABEL_NAME, WHEEL_ZOOM_FACTOR};
use crate::model::{Annotation, AnnotationId, Label, MediaInfo, MediaType};
use crate::playback::Playback;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::store::AnnotationStore;
use crate::tools::{Tool, ToolController, ToolOutcome};

/// Identifies one render surface attached to the editor.
pub type SurfaceId = u32;

/// Change notifications delivered to subscribers after each mutation has
/// already been pushed to every backend.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    AnnotationAdded(AnnotationId),
    AnnotationRemoved(AnnotationId),
    SelectionChanged(Option<AnnotationId>),
    HistoryChanged,
    ToolChanged(Tool),
    MediaChanged,
    LayerChanged(LayerKind),
    TransformChanged(SurfaceId),
    FrameAdvanced(u32),
}

type Subscriber = Box<dyn FnMut(&EditorEvent)>;

/// One viewing surface: an independent viewport over the shared scene,
/// rendered by its own backend.
pub struct Surface {
    id: SurfaceId,
    name: String,
    viewport: Viewport,
    backend: Box<dyn SceneRenderer>,
}

impl Surface {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

/// The root of editor state. Hosts translate raw input into the entry
/// points below and draw the frames the backends encode.
pub struct EditorState {
    store: AnnotationStore,
    tools: ToolController,
    labels: Vec<Label>,
    active_label: Option<String>,
    media: Option<MediaInfo>,
    frame: Option<MediaFrame>,
    layers: MlLayers,
    surfaces: Vec<Surface>,
    next_surface_id: SurfaceId,
    /// Ids for frames the editor synthesizes itself (snapshot import).
    next_media_id: u64,
    playback: Playback,
    subscribers: Vec<Subscriber>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    /// Fresh editor: select tool active, one seeded label so commits always
    /// have something to be tagged with, no media, no surfaces.
    pub fn new() -> Self {
        let mut editor = Self {
            store: AnnotationStore::new(),
            tools: ToolController::new(),
            labels: vec![Label::with_generated_color(DEFAULT_LABEL_ID, DEFAULT_LABEL_NAME, 0)],
            active_label: Some(DEFAULT_LABEL_ID.to_string()),
            media: None,
            frame: None,
            layers: MlLayers::new(),
            surfaces: Vec::new(),
            next_surface_id: 1,
            next_media_id: 0,
            playback: Playback::new(),
            subscribers: Vec::new(),
        };
        editor.push_active_label();
        editor
    }

    /// Register a change listener. Subscribers run synchronously, after the
    /// mutation reached every backend.
    pub fn subscribe(&mut self, callback: impl FnMut(&EditorEvent) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Surfaces
    // ------------------------------------------------------------------

    /// Attach a new surface and bring its backend fully up to date with the
    /// current scene. Comparison mode is just two or more of these.
    pub fn add_surface(&mut self, name: impl Into<String>, kind: BackendKind) -> SurfaceId {
        let id = self.next_surface_id;
        self.next_surface_id += 1;

        let mut backend = create_backend(kind);
        backend.set_media(self.frame.clone());
        for k in LayerKind::ORDER {
            if !k.is_toggleable() {
                continue;
            }
            if let Some(data) = self.layers.data(k) {
                backend.set_layer_data(data);
            }
            let s = self.layers.settings(k);
            backend.set_layer_visibility(k, s.visible, s.opacity);
        }
        let items = self.scene_items();
        backend.render_annotations(&items, self.store.selected());

        let mut viewport = Viewport::new();
        if let Some(info) = &self.media {
            viewport.set_media_size(f64::from(info.width), f64::from(info.height));
        }

        let name = name.into();
        log::info!("surface '{name}' (#{id}) added with the {} backend", backend.name());
        let mut surface = Surface { id, name, viewport, backend };
        Self::push_transform(&mut surface);
        self.surfaces.push(surface);
        id
    }

    /// Detach a surface. Returns false for unknown ids.
    pub fn remove_surface(&mut self, id: SurfaceId) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| s.id != id);
        let removed = self.surfaces.len() != before;
        if removed {
            log::info!("surface #{id} removed");
        }
        removed
    }

    /// Record a surface's on-screen size. The transform is untouched; refit
    /// happens on media load or an explicit [`fit_to_view`](Self::fit_to_view).
    pub fn resize_surface(&mut self, surface: SurfaceId, width: f64, height: f64) {
        if let Some(s) = self.surface_mut(surface) {
            s.viewport.set_view_size(width, height);
        }
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Encode one surface's current frame.
    pub fn encode_frame(&mut self, surface: SurfaceId) -> Option<Frame> {
        self.surface_mut(surface).map(|s| s.backend.encode_frame())
    }

    /// Map surface-local screen coordinates into media space. `None` only
    /// for unknown surfaces; bounds are the tool controller's concern.
    pub fn screen_to_media(&self, surface: SurfaceId, sx: f64, sy: f64) -> Option<(f64, f64)> {
        let s = self.surface(surface)?;
        let p = s.viewport.screen_to_media(sx, sy);
        Some((p.x, p.y))
    }

    // ------------------------------------------------------------------
    // Pointer entry points (surface-local screen coordinates)
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        let Some((mx, my)) = self.screen_to_media(surface, sx, sy) else {
            return;
        };
        let outcome = self.tools.pointer_down(&mut self.store, mx, my);
        self.apply_outcome(outcome);
    }

    pub fn pointer_move(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        let Some((mx, my)) = self.screen_to_media(surface, sx, sy) else {
            return;
        };
        let outcome = self.tools.pointer_move(mx, my);
        self.apply_outcome(outcome);
    }

    pub fn pointer_up(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        let Some((mx, my)) = self.screen_to_media(surface, sx, sy) else {
            return;
        };
        let outcome = self.tools.pointer_up(&mut self.store, mx, my);
        self.apply_outcome(outcome);
    }

    pub fn double_click(&mut self, surface: SurfaceId) {
        if self.surface(surface).is_none() {
            return;
        }
        let outcome = self.tools.double_click(&mut self.store);
        self.apply_outcome(outcome);
    }

    pub fn context_menu(&mut self, surface: SurfaceId) {
        if self.surface(surface).is_none() {
            return;
        }
        let outcome = self.tools.context_menu(&mut self.store);
        self.apply_outcome(outcome);
    }

    /// Abort any in-progress draft. Callable from any state.
    pub fn cancel_drawing(&mut self) {
        let outcome = self.tools.cancel();
        self.apply_outcome(outcome);
    }

    // ------------------------------------------------------------------
    // Per-surface transforms
    // ------------------------------------------------------------------

    /// Zoom by wheel notches, anchored at the cursor. Positive steps zoom
    /// in.
    pub fn wheel_zoom(&mut self, surface: SurfaceId, sx: f64, sy: f64, steps: i32) {
        if steps == 0 {
            return;
        }
        let factor = WHEEL_ZOOM_FACTOR.powi(steps);
        self.with_viewport(surface, |v| v.zoom_at(sx, sy, factor));
    }

    pub fn pan_by(&mut self, surface: SurfaceId, dx: f64, dy: f64) {
        self.with_viewport(surface, |v| v.pan_by(dx, dy));
    }

    pub fn zoom_in(&mut self, surface: SurfaceId) {
        self.with_viewport(surface, |v| v.zoom_in());
    }

    pub fn zoom_out(&mut self, surface: SurfaceId) {
        self.with_viewport(surface, |v| v.zoom_out());
    }

    pub fn fit_to_view(&mut self, surface: SurfaceId) {
        self.with_viewport(surface, |v| v.fit_to_view());
    }

    // ------------------------------------------------------------------
    // Document mutations
    // ------------------------------------------------------------------

    pub fn set_tool(&mut self, tool: Tool) {
        let had_draft = self.tools.is_drawing();
        self.tools.set_tool(tool);
        if had_draft {
            self.sync_annotations();
        }
        self.emit(EditorEvent::ToolChanged(tool));
    }

    pub fn tool(&self) -> Tool {
        self.tools.tool()
    }

    pub fn is_drawing(&self) -> bool {
        self.tools.is_drawing()
    }

    /// Delete by id. Returns false for unknown ids.
    pub fn delete(&mut self, id: &str) -> bool {
        let was_selected = self.store.selected() == Some(id);
        if !self.store.delete(id) {
            return false;
        }
        self.sync_annotations();
        self.emit(EditorEvent::AnnotationRemoved(id.to_string()));
        if was_selected {
            self.emit(EditorEvent::SelectionChanged(None));
        }
        self.emit(EditorEvent::HistoryChanged);
        true
    }

    /// Delete the selected annotation, if any. Returns the deleted id.
    pub fn delete_selected(&mut self) -> Option<AnnotationId> {
        let id = self.store.selected().map(String::from)?;
        self.delete(&id).then_some(id)
    }

    pub fn select(&mut self, id: Option<&str>) {
        let before = self.store.selected().map(String::from);
        self.store.select(id);
        let after = self.store.selected().map(String::from);
        if before != after {
            self.sync_annotations();
            self.emit(EditorEvent::SelectionChanged(after));
        }
    }

    pub fn undo(&mut self) -> bool {
        let before = self.store.selected().map(String::from);
        if !self.store.undo() {
            return false;
        }
        self.sync_annotations();
        self.emit(EditorEvent::HistoryChanged);
        let after = self.store.selected().map(String::from);
        if before != after {
            self.emit(EditorEvent::SelectionChanged(after));
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        let before = self.store.selected().map(String::from);
        if !self.store.redo() {
            return false;
        }
        self.sync_annotations();
        self.emit(EditorEvent::HistoryChanged);
        let after = self.store.selected().map(String::from);
        if before != after {
            self.emit(EditorEvent::SelectionChanged(after));
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// All annotations in render order.
    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn selected(&self) -> Option<&str> {
        self.store.selected()
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Replace the label table. The active label is kept when it survives
    /// the replacement, otherwise it falls back to the first entry.
    pub fn set_labels(&mut self, labels: Vec<Label>) {
        self.labels = labels;
        let active_ok = self
            .active_label
            .as_ref()
            .is_some_and(|id| self.labels.iter().any(|l| &l.id == id));
        if !active_ok {
            self.active_label = self.labels.first().map(|l| l.id.clone());
        }
        self.push_active_label();
    }

    /// Pick the label subsequent commits are tagged with. Unknown ids are
    /// refused.
    pub fn set_active_label(&mut self, id: &str) -> bool {
        if !self.labels.iter().any(|l| l.id == id) {
            log::warn!("unknown label id '{id}'");
            return false;
        }
        self.active_label = Some(id.to_string());
        self.push_active_label();
        true
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn active_label(&self) -> Option<&Label> {
        let id = self.active_label.as_deref()?;
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.tools.set_brush_size(size);
    }

    pub fn brush_size(&self) -> f64 {
        self.tools.brush_size()
    }

    // ------------------------------------------------------------------
    // ML layers
    // ------------------------------------------------------------------

    /// Replace one ML layer's payload on the document and on every backend.
    pub fn set_layer_data(&mut self, data: LayerData) {
        let kind = self.layers.set_data(data.clone());
        for surface in &mut self.surfaces {
            surface.backend.set_layer_data(data.clone());
        }
        self.emit(EditorEvent::LayerChanged(kind));
    }

    pub fn set_layer_visibility(&mut self, kind: LayerKind, visible: bool, opacity: f32) {
        self.layers.set_visibility(kind, visible, opacity);
        for surface in &mut self.surfaces {
            surface.backend.set_layer_visibility(kind, visible, opacity);
        }
        self.emit(EditorEvent::LayerChanged(kind));
    }

    pub fn layer_settings(&self, kind: LayerKind) -> LayerSettings {
        self.layers.settings(kind)
    }

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    /// Load new media, replacing the whole document. Annotations, history,
    /// and ML payloads belong to the media they were made on, so they go
    /// with it; surfaces refit to the new dimensions.
    pub fn load_media(&mut self, info: MediaInfo, frame: MediaFrame) {
        debug_assert_eq!(
            (info.width, info.height),
            frame.size(),
            "media info and frame dimensions disagree"
        );
        log::info!("loading media '{}' ({}x{})", info.name, info.width, info.height);
        self.reset_document();
        self.install_media(Some((info, frame)));
        self.sync_annotations();
        self.emit(EditorEvent::MediaChanged);
    }

    /// Swap in a new decoded frame (video playback, or pixels arriving
    /// after a snapshot import). Annotations and layers stay.
    pub fn update_media_frame(&mut self, frame: MediaFrame) {
        let Some(info) = &self.media else {
            log::warn!("frame update with no media loaded, ignored");
            return;
        };
        debug_assert_eq!(
            (info.width, info.height),
            frame.size(),
            "frame dimensions disagree with the loaded media"
        );
        self.frame = Some(frame);
        for surface in &mut self.surfaces {
            surface.backend.set_media(self.frame.clone());
        }
    }

    /// Tear down the loaded media and everything scoped to it.
    pub fn unload_media(&mut self) {
        if self.media.is_none() {
            return;
        }
        log::info!("unloading media");
        self.reset_document();
        self.install_media(None);
        self.sync_annotations();
        self.emit(EditorEvent::MediaChanged);
    }

    pub fn media(&self) -> Option<&MediaInfo> {
        self.media.as_ref()
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Start the frame clock. Only video media plays; the host supplies the
    /// clip length since [`MediaInfo`] only carries dimensions.
    pub fn play(&mut self, fps: f64, frame_count: u32) -> bool {
        match &self.media {
            Some(info) if info.media_type == MediaType::Video => {
                self.playback.play(fps, frame_count, Instant::now())
            }
            Some(_) => {
                log::debug!("play refused: loaded media is not a video");
                false
            }
            None => {
                log::debug!("play refused: no media loaded");
                false
            }
        }
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn current_frame(&self) -> u32 {
        self.playback.frame()
    }

    /// Drive playback from the host's animation ticker. When a frame is
    /// due, returns its index; the host decodes it and calls
    /// [`update_media_frame`](Self::update_media_frame).
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let frame = self.playback.tick(now)?;
        self.emit(EditorEvent::FrameAdvanced(frame));
        Some(frame)
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::capture(self.media.as_ref(), self.store.annotations(), &self.labels)
    }

    pub fn export_json(&self) -> Result<String, SnapshotError> {
        self.export_snapshot().to_json()
    }

    /// Replace the whole document with a snapshot's contents. Validates
    /// everything first, so a failed import leaves the document untouched.
    /// Annotations get fresh ids and timestamps; history is cleared. Pixels
    /// are not part of a snapshot, so the media frame is dimensions-only
    /// until the host re-supplies them. Returns the annotation count.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<usize, SnapshotError> {
        snapshot.validate()?;
        log::info!("importing snapshot: {} annotations", snapshot.annotations.len());

        self.reset_document();
        self.set_labels(snapshot.labels);
        match snapshot.media {
            Some(info) => {
                self.next_media_id += 1;
                let frame = MediaFrame::new(self.next_media_id, info.width, info.height);
                self.install_media(Some((info, frame)));
            }
            None => self.install_media(None),
        }
        for entry in &snapshot.annotations {
            self.store.restore(entry.to_shape(), entry.label.clone(), entry.color);
        }
        self.sync_annotations();
        self.emit(EditorEvent::MediaChanged);
        self.emit(EditorEvent::HistoryChanged);
        Ok(snapshot.annotations.len())
    }

    pub fn import_json(&mut self, json: &str) -> Result<usize, SnapshotError> {
        let snapshot = Snapshot::from_json(json)?;
        self.import_snapshot(snapshot)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|s| s.id == id)
    }

    fn emit(&mut self, event: EditorEvent) {
        log::trace!("event: {event:?}");
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    /// Route a tool outcome: resync backends for anything visible, then
    /// raise the matching events.
    fn apply_outcome(&mut self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::Ignored => {}
            ToolOutcome::DraftChanged | ToolOutcome::DraftDiscarded => {
                self.sync_annotations();
            }
            ToolOutcome::SelectionChanged(id) => {
                self.sync_annotations();
                self.emit(EditorEvent::SelectionChanged(id));
            }
            ToolOutcome::Committed(id) => {
                self.sync_annotations();
                self.emit(EditorEvent::AnnotationAdded(id.clone()));
                self.emit(EditorEvent::SelectionChanged(Some(id)));
                self.emit(EditorEvent::HistoryChanged);
            }
        }
    }

    /// Push the committed annotations plus any draft to every backend.
    /// Runs after each store or draft mutation, before subscribers hear
    /// about it.
    fn sync_annotations(&mut self) {
        let items = self.scene_items();
        let selected = self.store.selected().map(String::from);
        for surface in &mut self.surfaces {
            surface.backend.render_annotations(&items, selected.as_deref());
        }
    }

    fn scene_items(&self) -> Vec<SceneItem> {
        let mut items: Vec<SceneItem> = self
            .store
            .annotations()
            .iter()
            .map(|a| SceneItem::new(a.id.clone(), a.label.clone(), a.color, SceneShape::from(&a.shape)))
            .collect();
        items.extend(self.tools.draft_item());
        items
    }

    fn push_transform(surface: &mut Surface) {
        let t = surface.viewport.transform();
        surface.backend.apply_transform(t.zoom, t.pan_x, t.pan_y);
    }

    fn with_viewport(&mut self, surface: SurfaceId, f: impl FnOnce(&mut Viewport)) {
        let Some(s) = self.surface_mut(surface) else {
            return;
        };
        f(&mut s.viewport);
        Self::push_transform(s);
        self.emit(EditorEvent::TransformChanged(surface));
    }

    fn push_active_label(&mut self) {
        let label = self
            .active_label
            .as_deref()
            .and_then(|id| self.labels.iter().find(|l| l.id == id));
        if let Some(label) = label {
            self.tools.set_active_label(label.name.clone(), label.color);
        }
    }

    /// Drop everything scoped to the current media: draft, playback,
    /// annotations, history, ML payloads.
    fn reset_document(&mut self) {
        self.tools.cancel();
        self.playback.reset();
        self.store.clear();
        self.store.clear_history();
        self.layers.clear_data();
    }

    /// Install (or clear) the media on the document and every surface,
    /// refitting viewports to the new dimensions.
    fn install_media(&mut self, media: Option<(MediaInfo, MediaFrame)>) {
        match media {
            Some((info, frame)) => {
                let mw = f64::from(info.width);
                let mh = f64::from(info.height);
                self.tools.set_media_size(Some((mw, mh)));
                self.media = Some(info);
                self.frame = Some(frame);
                for surface in &mut self.surfaces {
                    surface.viewport.set_media_size(mw, mh);
                    surface.viewport.fit_to_view();
                    surface.backend.set_media(self.frame.clone());
                    surface.backend.clear_layers();
                    Self::push_transform(surface);
                }
            }
            None => {
                self.tools.set_media_size(None);
                self.media = None;
                self.frame = None;
                for surface in &mut self.surfaces {
                    surface.viewport.set_media_size(0.0, 0.0);
                    surface.backend.set_media(None);
                    surface.backend.clear_layers();
                }
            }
        }
    }
}
