//! Media frame payloads handed to renderer backends.

use std::sync::Arc;

use image::RgbaImage;

/// One decoded media frame: a still image, or a single frame of a video.
///
/// Pixels are optional so headless hosts and tests can describe a frame by
/// its dimensions alone; backends only need dimensions to place the media
/// pass and answer coordinate queries. A new `id` marks new pixel content,
/// which is also what frame equality is based on.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Option<Arc<RgbaImage>>,
}

impl MediaFrame {
    /// Frame described by dimensions only.
    pub fn new(id: u64, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            pixels: None,
        }
    }

    /// Frame carrying decoded pixels; dimensions come from the buffer.
    pub fn with_pixels(id: u64, pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            id,
            width,
            height,
            pixels: Some(Arc::new(pixels)),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl PartialEq for MediaFrame {
    // Pixel content is identified by id; two frames with the same id and
    // dimensions are the same frame.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.width == other.width && self.height == other.height
    }
}
