//! QR decoder backed by `rqrr`.

use super::{rgba_to_luma, FrameDecoder};
use crate::capture::RGBA_CHANNELS;

/// Pure-Rust QR decoder.
///
/// Converts the frame to greyscale, detects candidate grids and returns
/// the payload of the first grid that decodes cleanly.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for RqrrDecoder {
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || rgba.len() < w * h * RGBA_CHANNELS {
            tracing::debug!(
                width,
                height,
                bytes = rgba.len(),
                "Frame buffer does not match dimensions"
            );
            return None;
        }

        let luma = rgba_to_luma(&rgba[..w * h * RGBA_CHANNELS]);
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);

        let grids = prepared.detect_grids();
        tracing::trace!(candidates = grids.len(), "Detected QR grids");

        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => return Some(content),
                Err(e) => tracing::debug!("QR grid decode failed: {:?}", e),
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use qrcode::{Color, QrCode};

    const CODE: &str = "snuggest-drink-qr";
    const QUIET_ZONE: usize = 4;

    /// Draws `text` as black-on-white RGBA, `module_px` pixels per module.
    fn qr_frame(text: &str, module_px: usize) -> Frame {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let side = (modules + 2 * QUIET_ZONE) * module_px;

        let mut pixels = vec![255u8; side * side * RGBA_CHANNELS];
        for y in 0..side {
            for x in 0..side {
                let (mx, my) = (x / module_px, y / module_px);
                let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
                    && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
                if inside && colors[(my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)] == Color::Dark {
                    let i = (y * side + x) * RGBA_CHANNELS;
                    pixels[i..i + 3].copy_from_slice(&[0, 0, 0]);
                }
            }
        }
        Frame::new(pixels, side as u32, side as u32, 1)
    }

    #[test]
    fn test_decodes_loyalty_code_after_downscale() {
        let decoder = RqrrDecoder::new();

        for module_px in [4, 6, 8] {
            let half = qr_frame(CODE, module_px).downscale_half().unwrap();
            assert_eq!(
                decoder.decode(half.pixels(), half.width(), half.height()),
                Some(CODE.to_string()),
                "module size {module_px}px ({}x{} after halving)",
                half.width(),
                half.height()
            );
        }
    }

    #[test]
    fn test_decodes_other_payloads_verbatim() {
        let decoder = RqrrDecoder::new();
        let half = qr_frame("https://example.com/menu", 6).downscale_half().unwrap();

        assert_eq!(
            decoder.decode(half.pixels(), half.width(), half.height()),
            Some("https://example.com/menu".to_string())
        );
    }

    #[test]
    fn test_code_too_small_after_downscale_is_a_miss() {
        let decoder = RqrrDecoder::new();
        let half = qr_frame(CODE, 1).downscale_half().unwrap();

        assert_eq!(decoder.decode(half.pixels(), half.width(), half.height()), None);
    }

    #[test]
    fn test_blank_frame_has_no_code() {
        let decoder = RqrrDecoder::new();
        let frame = vec![255u8; 64 * 64 * 4];
        assert_eq!(decoder.decode(&frame, 64, 64), None);
    }

    #[test]
    fn test_short_buffer_is_a_miss() {
        let decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&[0u8; 16], 64, 64), None);
    }

    #[test]
    fn test_zero_dimensions_is_a_miss() {
        let decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&[], 0, 0), None);
    }
}
