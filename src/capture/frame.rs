//! Frame type representing a captured RGBA image with metadata.

use std::time::Instant;

/// Bytes per RGBA pixel.
pub const RGBA_CHANNELS: usize = 4;

/// A single captured frame from the camera.
///
/// Pixels are tightly packed RGBA, row-major, which is the layout
/// the frame decoder expects.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGBA pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Builds an RGBA frame from packed RGB data (as delivered by most webcams).
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32, sequence: u64) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * RGBA_CHANNELS);
        for px in rgb.chunks_exact(3) {
            pixels.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
        }
        Self::new(pixels, width, height, sequence)
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * RGBA_CHANNELS
    }

    /// Copies the frame at half its width and height.
    ///
    /// Each output pixel is the average of a 2x2 block; an odd trailing
    /// row or column is dropped. Returns `None` when the frame is malformed
    /// or too small to halve.
    pub fn downscale_half(&self) -> Option<Frame> {
        if !self.is_valid() {
            return None;
        }

        let out_w = (self.width / 2) as usize;
        let out_h = (self.height / 2) as usize;
        if out_w == 0 || out_h == 0 {
            return None;
        }

        let stride = self.width as usize * RGBA_CHANNELS;
        let mut out = Vec::with_capacity(out_w * out_h * RGBA_CHANNELS);

        for y in 0..out_h {
            let top = 2 * y * stride;
            let bottom = top + stride;
            for x in 0..out_w {
                let left = 2 * x * RGBA_CHANNELS;
                let right = left + RGBA_CHANNELS;
                for c in 0..RGBA_CHANNELS {
                    let sum = self.pixels[top + left + c] as u16
                        + self.pixels[top + right + c] as u16
                        + self.pixels[bottom + left + c] as u16
                        + self.pixels[bottom + right + c] as u16;
                    out.push(((sum + 2) / 4) as u8);
                }
            }
        }

        Some(Frame {
            pixels: out,
            width: out_w as u32,
            height: out_h as u32,
            timestamp: self.timestamp,
            sequence: self.sequence,
        })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
