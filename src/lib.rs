//! pixmark - image and video annotation core
//!
//! Geometry, an annotation document with undo/redo, pointer-driven drawing
//! tools, and an editor shell that drives any number of render surfaces.
//! The presentation layer (viewport math, layer model, draw commands, and
//! the two interchangeable renderer backends) lives in [`pixmark_scene`],
//! re-exported here as [`scene`].
//!
//! Hosts own the window, the input loop, and the actual rasterization;
//! this crate turns pointer input into document edits and documents into
//! backend-agnostic draw command frames.

pub mod constants;
pub mod editor;
pub mod geometry;
pub mod model;
pub mod playback;
pub mod snapshot;
pub mod store;
pub mod tools;

pub use pixmark_scene as scene;

pub use editor::{EditorEvent, EditorState, Surface, SurfaceId};
pub use model::{Annotation, AnnotationId, AnnotationShape, Label, MediaInfo, MediaType};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::AnnotationStore;
pub use tools::{Tool, ToolController, ToolOutcome};
