//! Annotation store: ordered list, single selection, undo/redo history.
//!
//! The list order is the render order (later entries draw on top). Undo and
//! redo are exact inverses built from two stacks: fresh edits push onto the
//! undo stack and clear the redo stack; undo moves the action across to the
//! redo stack; redo moves it back. Replay itself never counts as a fresh
//! edit.

use pixmark_scene::Color;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::model::{Annotation, AnnotationId, AnnotationShape};

/// An undoable store edit. Each action stores enough to reverse itself
/// exactly, including the list index a deletion happened at.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// An annotation was committed (always appended at the end).
    Add { annotation: Annotation },
    /// An annotation was deleted from `index`.
    Delete { annotation: Annotation, index: usize },
}

impl UndoAction {
    /// Human-readable description of this action.
    pub fn description(&self) -> &'static str {
        match self {
            UndoAction::Add { .. } => "Add annotation",
            UndoAction::Delete { .. } => "Delete annotation",
        }
    }
}

/// Configuration for the undo history.
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of actions to keep in history.
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// The annotation document: ordered annotations, a single optional
/// selection, and the undo/redo stacks.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    selected: Option<AnnotationId>,
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    config: UndoConfig,
    next_seq: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom history limit.
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// All annotations in render order (last draws on top).
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Commit a finished shape as a new annotation. Appends, selects it,
    /// and records the edit for undo.
    pub fn commit(&mut self, shape: AnnotationShape, label: impl Into<String>, color: Color) -> AnnotationId {
        let id = self.next_id();
        let annotation = Annotation::new(id.clone(), label, color, now_ms(), shape);
        log::info!(
            "committed {} annotation {}",
            annotation.shape.kind_name(),
            id
        );
        self.annotations.push(annotation.clone());
        self.selected = Some(id.clone());
        self.push_action(UndoAction::Add { annotation });
        id
    }

    /// Delete by id. Clears the selection when it pointed at the deleted
    /// annotation. Returns false for unknown ids.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.annotations.iter().position(|a| a.id == id) else {
            return false;
        };
        let annotation = self.annotations.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        log::info!("deleted annotation {id}");
        self.push_action(UndoAction::Delete { annotation, index });
        true
    }

    /// Delete the selected annotation, if any.
    pub fn delete_selected(&mut self) -> Option<AnnotationId> {
        let id = self.selected.clone()?;
        self.delete(&id).then_some(id)
    }

    /// Drop every annotation without recording history. Used when a new
    /// document replaces this one.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
    }

    /// Append an annotation rebuilt from persisted data. Assigns a fresh id
    /// and timestamp like a commit, but records no history and leaves the
    /// selection alone. Used by snapshot import.
    pub fn restore(&mut self, shape: AnnotationShape, label: impl Into<String>, color: Color) -> AnnotationId {
        let id = self.next_id();
        self.annotations
            .push(Annotation::new(id.clone(), label, color, now_ms(), shape));
        id
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Set or clear the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<&str>) {
        self.selected = match id {
            Some(id) if self.get(id).is_some() => Some(id.to_string()),
            _ => None,
        };
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Topmost annotation containing the media-space point, i.e. the last
    /// hit in render order.
    pub fn find_at(&self, px: f64, py: f64) -> Option<&Annotation> {
        self.annotations.iter().rev().find(|a| a.hit_test(px, py))
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Reverse the most recent edit. Returns false when there is nothing to
    /// undo. Never restores selection.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        log::debug!("⏪ Undo: '{}'", action.description());
        match &action {
            UndoAction::Add { annotation } => {
                if let Some(i) = self.annotations.iter().position(|a| a.id == annotation.id) {
                    self.annotations.remove(i);
                }
                if self.selected.as_deref() == Some(annotation.id.as_str()) {
                    self.selected = None;
                }
            }
            UndoAction::Delete { annotation, index } => {
                // Index fidelity: back where it was, not appended
                let i = (*index).min(self.annotations.len());
                self.annotations.insert(i, annotation.clone());
            }
        }
        self.redo_stack.push(action);
        true
    }

    /// Replay the most recently undone edit. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("⏩ Redo: '{}'", action.description());
        match &action {
            UndoAction::Add { annotation } => {
                // A commit always appended, so redo re-appends
                self.annotations.push(annotation.clone());
            }
            UndoAction::Delete { annotation, .. } => {
                if let Some(i) = self.annotations.iter().position(|a| a.id == annotation.id) {
                    self.annotations.remove(i);
                }
                if self.selected.as_deref() == Some(annotation.id.as_str()) {
                    self.selected = None;
                }
            }
        }
        // Replay moves the action back without touching the redo stack
        self.undo_stack.push(action);
        true
    }

    /// Forget all history (document replaced wholesale).
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    /// Record a fresh edit: push it and invalidate the redo stack.
    fn push_action(&mut self, action: UndoAction) {
        log::debug!("📝 Undo: pushed '{}'", action.description());
        self.undo_stack.push(action);
        self.redo_stack.clear();

        // Limit history size
        while self.undo_stack.len() > self.config.max_history {
            self.undo_stack.remove(0);
        }
    }

    fn next_id(&mut self) -> AnnotationId {
        self.next_seq += 1;
        format!("a{}-{}", self.next_seq, now_ms())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmark_scene::Point;

    fn point_shape(x: f64, y: f64) -> AnnotationShape {
        AnnotationShape::Point { x, y }
    }

    fn bbox_shape(x: f64, y: f64) -> AnnotationShape {
        AnnotationShape::Bbox {
            x,
            y,
            w: 20.0,
            h: 20.0,
        }
    }

    #[test]
    fn test_commit_appends_and_selects() {
        let mut store = AnnotationStore::new();
        let a = store.commit(point_shape(1.0, 1.0), "car", Color::RED);
        let b = store.commit(point_shape(2.0, 2.0), "car", Color::RED);

        assert_eq!(store.len(), 2);
        assert_eq!(store.annotations()[0].id, a);
        assert_eq!(store.annotations()[1].id, b);
        assert_eq!(store.selected(), Some(b.as_str()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_undo_redo_round_trip_restores_state() {
        let mut store = AnnotationStore::new();
        let mut after_each: Vec<Vec<AnnotationId>> = vec![Vec::new()];

        for i in 0..5 {
            store.commit(point_shape(i as f64, 0.0), "p", Color::RED);
            after_each.push(store.annotations().iter().map(|a| a.id.clone()).collect());
        }
        let final_ids = after_each.last().cloned().unwrap();

        // N undos walk back to the empty document
        for step in (0..5).rev() {
            assert!(store.undo());
            let ids: Vec<_> = store.annotations().iter().map(|a| a.id.clone()).collect();
            assert_eq!(ids, after_each[step]);
        }
        assert!(!store.undo());

        // N redos restore the final state exactly
        for _ in 0..5 {
            assert!(store.redo());
        }
        let ids: Vec<_> = store.annotations().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, final_ids);
        assert!(!store.redo());
    }

    #[test]
    fn test_fresh_edit_clears_redo() {
        let mut store = AnnotationStore::new();
        store.commit(point_shape(0.0, 0.0), "p", Color::RED);
        store.undo();
        assert!(store.can_redo());

        store.commit(point_shape(1.0, 1.0), "p", Color::RED);
        assert!(!store.can_redo());

        // Replay itself must not clear redo
        store.commit(point_shape(2.0, 2.0), "p", Color::RED);
        store.undo();
        store.undo();
        assert_eq!(store.redo_count(), 2);
        store.redo();
        assert_eq!(store.redo_count(), 1);
    }

    #[test]
    fn test_delete_undo_restores_index() {
        let mut store = AnnotationStore::new();
        let a = store.commit(bbox_shape(0.0, 0.0), "a", Color::RED);
        let b = store.commit(bbox_shape(100.0, 0.0), "b", Color::RED);
        let c = store.commit(bbox_shape(200.0, 0.0), "c", Color::RED);

        assert!(store.delete(&b));
        let d = store.commit(bbox_shape(300.0, 0.0), "d", Color::RED);

        // Undo the commit of d, then the deletion of b
        store.undo();
        store.undo();

        let ids: Vec<_> = store.annotations().iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);
        let _ = d;
    }

    #[test]
    fn test_delete_clears_selection_and_undo_does_not_restore_it() {
        let mut store = AnnotationStore::new();
        let id = store.commit(point_shape(5.0, 5.0), "p", Color::RED);
        store.select(Some(&id));

        assert!(store.delete(&id));
        assert_eq!(store.selected(), None);

        store.undo();
        assert!(store.get(&id).is_some());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_undo_of_add_clears_selection_of_that_annotation() {
        let mut store = AnnotationStore::new();
        let id = store.commit(point_shape(5.0, 5.0), "p", Color::RED);
        assert_eq!(store.selected(), Some(id.as_str()));

        store.undo();
        assert_eq!(store.selected(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_redo_add_appends_at_end() {
        let mut store = AnnotationStore::new();
        let a = store.commit(point_shape(0.0, 0.0), "a", Color::RED);
        let b = store.commit(point_shape(1.0, 1.0), "b", Color::RED);

        store.undo();
        store.redo();

        let ids: Vec<_> = store.annotations().iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_history_cap_drops_oldest() {
        let mut store = AnnotationStore::with_config(UndoConfig { max_history: 3 });
        for i in 0..5 {
            store.commit(point_shape(i as f64, 0.0), "p", Color::RED);
        }
        assert_eq!(store.undo_count(), 3);
    }

    #[test]
    fn test_empty_undo_redo_are_noops() {
        let mut store = AnnotationStore::new();
        assert!(!store.undo());
        assert!(!store.redo());
    }

    #[test]
    fn test_find_at_returns_topmost() {
        let mut store = AnnotationStore::new();
        let bottom = store.commit(bbox_shape(0.0, 0.0), "bottom", Color::RED);
        let top = store.commit(
            AnnotationShape::Polygon {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(30.0, 0.0),
                    Point::new(30.0, 30.0),
                    Point::new(0.0, 30.0),
                ],
                closed: true,
            },
            "top",
            Color::RED,
        );

        assert_eq!(store.find_at(10.0, 10.0).map(|a| a.id.as_str()), Some(top.as_str()));
        assert_eq!(store.find_at(10.0, 40.0), None);
        let _ = bottom;
    }

    #[test]
    fn test_restore_records_no_history() {
        let mut store = AnnotationStore::new();
        let id = store.restore(point_shape(3.0, 3.0), "p", Color::RED);

        assert_eq!(store.len(), 1);
        assert_ne!(id, "");
        assert_eq!(store.selected(), None);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_select_unknown_id_clears() {
        let mut store = AnnotationStore::new();
        let id = store.commit(point_shape(0.0, 0.0), "p", Color::RED);
        store.select(Some("no-such-id"));
        assert_eq!(store.selected(), None);
        store.select(Some(&id));
        assert_eq!(store.selected(), Some(id.as_str()));
    }
}
