//! Coordinate reconciliation between rendered templates and the detector.
//!
//! The cross-obscuration renderings were authored with rows and columns
//! swapped relative to detector readout. Every mask derived from them passes
//! through [`template_to_detector`] exactly once before it is exposed.

use crate::mask::RegionMask;

/// Maps a template-frame pixel `(x, y)` to its detector-frame position.
#[inline]
pub fn template_pixel_to_detector(x: usize, y: usize) -> (usize, usize) {
    (y, x)
}

/// Re-expresses a template-frame mask in the detector frame.
///
/// This is an axis swap, so it is not idempotent: applying it twice returns
/// the template-frame mask.
pub fn template_to_detector(mask: &RegionMask) -> RegionMask {
    mask.transposed()
}

#[cfg(test)]
mod tests {
    use super::{template_pixel_to_detector, template_to_detector};
    use crate::mask::RegionMask;

    #[test]
    fn single_application_moves_pixels_to_swapped_position() {
        let mask = RegionMask::from_fn(5, 3, |x, y| (x, y) == (4, 1)).unwrap();
        let det = template_to_detector(&mask);
        assert_eq!(det.shape(), (3, 5));
        let (dx, dy) = template_pixel_to_detector(4, 1);
        assert!(det.is_set(dx, dy));
        assert_eq!(det.count(), 1);
    }

    #[test]
    fn transform_is_not_idempotent() {
        let mask = RegionMask::from_fn(4, 4, |x, y| x > y).unwrap();
        let once = template_to_detector(&mask);
        let twice = template_to_detector(&once);
        assert_ne!(once, mask);
        assert_ne!(twice, once);
        assert_eq!(twice, mask);
    }
}
