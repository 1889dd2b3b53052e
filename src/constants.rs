//! Global constants for the pixmark annotation core

/// Default brush stroke width in media pixels
pub const DEFAULT_BRUSH_SIZE: f64 = 20.0;

/// Zoom multiplier applied per wheel notch
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

/// Name of the label a fresh editor seeds so commits always have one
pub const DEFAULT_LABEL_NAME: &str = "object";

/// Id of the seeded default label
pub const DEFAULT_LABEL_ID: &str = "label-0";
