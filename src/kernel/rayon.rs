//! Rayon-parallel ZNCC scan (feature-gated).
//!
//! Parallelizes a full-frame scan over placement rows; each row collects
//! its own candidates, which are merged into a single top-K afterwards.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::scalar::{placement_limits, window_score};
use crate::kernel::ScanParams;
use crate::templates::CorrelationPlan;
use crate::util::MaskResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel full scan; returns the same peaks as the scalar kernel.
pub fn zncc_scan_full_par(
    image: ImageView<'_, f64>,
    plan: &CorrelationPlan,
    params: ScanParams,
) -> MaskResult<Vec<Peak>> {
    zncc_scan_par_where(image, plan, params, |_, _| true)
}

/// Row-parallel counterpart of [`ZnccScalar::scan_where`](crate::ZnccScalar::scan_where).
pub fn zncc_scan_par_where<F>(
    image: ImageView<'_, f64>,
    plan: &CorrelationPlan,
    params: ScanParams,
    accept: F,
) -> MaskResult<Vec<Peak>>
where
    F: Fn(usize, usize) -> bool + Sync,
{
    let (max_x, max_y) = placement_limits(image, plan)?;
    if params.topk == 0 {
        return Ok(Vec::new());
    }

    let row_results: Vec<Vec<Peak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| {
            (0..=max_x)
                .filter(|&x| accept(x, y))
                .filter_map(|x| {
                    window_score(image, plan, x, y, params.min_var_i)
                        .filter(|&score| score >= params.min_score)
                        .map(|score| Peak { x, y, score })
                })
                .collect()
        })
        .collect();

    let mut topk = TopK::new(params.topk);
    for peak in row_results.into_iter().flatten() {
        topk.push(peak);
    }
    Ok(topk.into_sorted_desc())
}
