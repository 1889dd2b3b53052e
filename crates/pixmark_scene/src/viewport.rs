//! Viewport transform between screen space and media space.
//!
//! Screen coordinates are surface-local pixels; media coordinates are the
//! intrinsic pixel grid of the loaded image or video frame. The mapping is
//! `media = (screen - pan) / zoom`, and every mutation path clamps zoom so
//! the transform can never divide by zero or escape the legal range.

use crate::Point;

/// Smallest legal zoom factor.
pub const ZOOM_MIN: f64 = 0.05;

/// Largest legal zoom factor.
pub const ZOOM_MAX: f64 = 20.0;

/// Fit-to-view never magnifies small media beyond this.
pub const FIT_MAX_ZOOM: f64 = 3.0;

/// Breathing room subtracted from the available space on each axis when
/// fitting media to the view.
pub const FIT_MARGIN: f64 = 40.0;

/// Step used by the explicit zoom in/out controls.
pub const ZOOM_STEP: f64 = 1.25;

/// The scene-level transform a backend applies to a whole frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Pan/zoom state for one render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
    media_w: f64,
    media_h: f64,
    view_w: f64,
    view_h: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Identity transform (zoom 1, no pan), no media or view size known yet.
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            media_w: 0.0,
            media_h: 0.0,
            view_w: 0.0,
            view_h: 0.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    /// The transform to hand to a backend's `apply_transform`.
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        }
    }

    /// Intrinsic media size, or None while nothing is loaded.
    pub fn media_size(&self) -> Option<(f64, f64)> {
        if self.media_w > 0.0 && self.media_h > 0.0 {
            Some((self.media_w, self.media_h))
        } else {
            None
        }
    }

    /// Record the intrinsic size of the loaded media (0, 0 on unload).
    pub fn set_media_size(&mut self, width: f64, height: f64) {
        self.media_w = width;
        self.media_h = height;
    }

    /// Record the on-screen size of the surface this viewport belongs to.
    pub fn set_view_size(&mut self, width: f64, height: f64) {
        self.view_w = width;
        self.view_h = height;
    }

    /// Map a screen point into media space.
    pub fn screen_to_media(&self, sx: f64, sy: f64) -> Point {
        Point::new((sx - self.pan_x) / self.zoom, (sy - self.pan_y) / self.zoom)
    }

    /// Map a media point into screen space. Exact inverse of
    /// [`screen_to_media`](Self::screen_to_media).
    pub fn media_to_screen(&self, mx: f64, my: f64) -> Point {
        Point::new(mx * self.zoom + self.pan_x, my * self.zoom + self.pan_y)
    }

    /// Multiply zoom by `factor`, keeping the media point under the screen
    /// cursor `(sx, sy)` fixed.
    ///
    /// The algorithm:
    /// 1. Find the media-space point under the cursor
    /// 2. After zooming, recompute pan so that same point stays under cursor
    pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
        let new_zoom = clamp_zoom(self.zoom * factor);

        // Media-space point under cursor (before zoom)
        let mx = (sx - self.pan_x) / self.zoom;
        let my = (sy - self.pan_y) / self.zoom;

        // New pan keeps the media point under the cursor
        self.pan_x = sx - mx * new_zoom;
        self.pan_y = sy - my * new_zoom;
        self.zoom = new_zoom;
    }

    /// Zoom in one step, pan untouched.
    pub fn zoom_in(&mut self) {
        self.zoom = clamp_zoom(self.zoom * ZOOM_STEP);
    }

    /// Zoom out one step, pan untouched.
    pub fn zoom_out(&mut self) {
        self.zoom = clamp_zoom(self.zoom / ZOOM_STEP);
    }

    /// Set zoom directly, clamped, pan untouched.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Apply a raw screen-space pan delta. No bounds clamping; the media may
    /// be panned fully out of view.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Fit the media inside the view and center it.
    ///
    /// No-op while either the media or the view size is unknown, so this can
    /// never produce NaN or infinite transforms.
    pub fn fit_to_view(&mut self) {
        if self.media_w <= 0.0 || self.media_h <= 0.0 || self.view_w <= 0.0 || self.view_h <= 0.0 {
            log::trace!("fit_to_view skipped: media or view size unknown");
            return;
        }

        let fit_x = (self.view_w - FIT_MARGIN) / self.media_w;
        let fit_y = (self.view_h - FIT_MARGIN) / self.media_h;
        self.zoom = clamp_zoom(fit_x.min(fit_y).min(FIT_MAX_ZOOM));

        // Center against the full view rect
        self.pan_x = (self.view_w - self.media_w * self.zoom) / 2.0;
        self.pan_y = (self.view_h - self.media_h * self.zoom) / 2.0;
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(ZOOM_MIN, ZOOM_MAX)
}
