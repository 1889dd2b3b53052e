//! Frame-advance state machine for video media.
//!
//! The host owns the render loop and calls [`Playback::tick`] once per
//! animation frame with the current time; playback decides whether a frame
//! interval elapsed and which frame index the host should decode next.
//! Decoding and pixel upload stay on the host side. Late ticks catch up by
//! skipping frames, and the index wraps around at the end of the clip.

use web_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Stopped,
    Playing { fps: f64, last_advance: Instant },
}

/// Looping frame clock driven by host ticks.
#[derive(Debug, Clone)]
pub struct Playback {
    state: State,
    frame: u32,
    frame_count: u32,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    pub fn new() -> Self {
        Self {
            state: State::Stopped,
            frame: 0,
            frame_count: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, State::Playing { .. })
    }

    /// Current frame index.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Start advancing `frame_count` frames at `fps`, measured from `now`.
    /// Refuses non-positive rates and empty clips.
    pub fn play(&mut self, fps: f64, frame_count: u32, now: Instant) -> bool {
        if !fps.is_finite() || fps <= 0.0 || frame_count == 0 {
            log::warn!("playback refused: fps={fps}, frames={frame_count}");
            return false;
        }
        if Duration::from_secs_f64(1.0 / fps).is_zero() {
            log::warn!("playback refused: {fps} fps is beyond timer resolution");
            return false;
        }
        self.frame_count = frame_count;
        if self.frame >= frame_count {
            self.frame = 0;
        }
        self.state = State::Playing { fps, last_advance: now };
        log::info!("playback started: {fps} fps over {frame_count} frames");
        true
    }

    /// Halt playback. A stopped clock never reports another advance, even
    /// from a tick that was already queued.
    pub fn stop(&mut self) {
        if self.is_playing() {
            log::info!("playback stopped at frame {}", self.frame);
        }
        self.state = State::Stopped;
    }

    /// Stop and forget the clip (media unloaded).
    pub fn reset(&mut self) {
        self.state = State::Stopped;
        self.frame = 0;
        self.frame_count = 0;
    }

    /// Advance if at least one frame interval elapsed since the last
    /// advance. Returns the new frame index when it moved, `None` otherwise.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let State::Playing { fps, last_advance } = &mut self.state else {
            return None;
        };
        let interval = Duration::from_secs_f64(1.0 / *fps);
        let elapsed = now.saturating_duration_since(*last_advance);
        if elapsed < interval {
            return None;
        }

        // Catch up on late ticks rather than drifting behind real time.
        // Integer nanos: exact multiples must count as full steps.
        let steps = (elapsed.as_nanos() / interval.as_nanos()) as u32;
        *last_advance += interval * steps;
        self.frame = ((u64::from(self.frame) + u64::from(steps)) % u64::from(self.frame_count)) as u32;
        log::trace!("playback advanced {} step(s) to frame {}", steps, self.frame);
        Some(self.frame)
    }
}
