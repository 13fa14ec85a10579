//! ZNCC scan kernels.
//!
//! A kernel scores template placements against an `f64` frame. Placements
//! are addressed by the template's top-left corner; a frame of width `W`
//! admits placements `0..=W - template_width` along each row.

use crate::candidate::topk::Peak;
use crate::util::MaskResult;
use crate::ImageView;

/// Limits applied while scanning.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Peaks retained by the scan, best first.
    pub topk: usize,
    /// Windows whose weighted variance is at or below this are skipped.
    pub min_var_i: f64,
    /// Scores below this are discarded.
    pub min_score: f64,
}

/// Placement scorer over a precomputed template plan.
pub trait Kernel {
    type Plan;

    /// Score at one placement, or `f64::NEG_INFINITY` when it cannot be scored.
    fn score_at(
        image: ImageView<'_, f64>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        min_var_i: f64,
    ) -> f64;

    /// Every valid placement in the frame.
    fn scan_full(
        image: ImageView<'_, f64>,
        plan: &Self::Plan,
        params: ScanParams,
    ) -> MaskResult<Vec<Peak>>;
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;
