//! RGBA to greyscale conversion.

use crate::capture::RGBA_CHANNELS;

/// Converts packed RGBA to 8-bit luminance.
///
/// Uses the Rec. 601 weights (Y = 0.299 R + 0.587 G + 0.114 B).
/// Alpha is ignored. A trailing partial pixel is dropped.
pub fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(RGBA_CHANNELS)
        .map(|px| {
            let y = (px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000;
            y as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let luma = rgba_to_luma(&[0, 0, 0, 255, 255, 255, 255, 0]);
        assert_eq!(luma, vec![0, 255]);
    }

    #[test]
    fn test_green_dominates() {
        let luma = rgba_to_luma(&[255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255]);
        assert_eq!(luma, vec![76, 149, 29]);
    }

    #[test]
    fn test_partial_pixel_dropped() {
        assert_eq!(rgba_to_luma(&[10, 10, 10]).len(), 0);
    }
}
