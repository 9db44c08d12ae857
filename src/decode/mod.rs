//! QR decoding of captured frames.
//!
//! The scan loop treats the decoder as a pure function from an RGBA
//! buffer to an optional payload. Decoders are shared across blocking
//! tasks, so they must be `Send + Sync` and hold no per-call state.

mod luma;
mod qr;

pub use luma::rgba_to_luma;
pub use qr::RqrrDecoder;

/// Locates and decodes a single QR code in a frame.
pub trait FrameDecoder: Send + Sync {
    /// Returns the decoded text, or `None` when no code is found.
    ///
    /// `rgba` holds `width * height` tightly packed RGBA pixels.
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<String>;
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for std::sync::Arc<D> {
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<String> {
        (**self).decode(rgba, width, height)
    }
}
