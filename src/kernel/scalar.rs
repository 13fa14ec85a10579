//! Scalar reference ZNCC kernel.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::{Kernel, ScanParams};
use crate::templates::CorrelationPlan;
use crate::util::{MaskError, MaskResult};
use crate::ImageView;

/// Scalar ZNCC kernel honoring the plan's pixel weights.
pub struct ZnccScalar;

/// Scores one placement; `None` when the window is flat, out of range or
/// contains non-finite pixels.
pub(crate) fn window_score(
    image: ImageView<'_, f64>,
    plan: &CorrelationPlan,
    x: usize,
    y: usize,
    min_var_i: f64,
) -> Option<f64> {
    let tpl_width = plan.width();
    let t_prime = plan.t_prime();
    let weights = plan.weights();

    let mut dot = 0.0f64;
    let mut sum_i = 0.0f64;
    let mut sum_i2 = 0.0f64;
    for ty in 0..plan.height() {
        let img_row = image.row(y + ty)?.get(x..x + tpl_width)?;
        let base = ty * tpl_width;
        for (tx, &value) in img_row.iter().enumerate() {
            let idx = base + tx;
            if weights[idx] == 0 {
                continue;
            }
            dot += t_prime[idx] * value;
            sum_i += value;
            sum_i2 += value * value;
        }
    }

    let var_i = sum_i2 - (sum_i * sum_i) / plan.sum_w();
    if var_i.is_nan() || var_i <= min_var_i {
        return None;
    }
    let score = dot / (plan.var_t() * var_i).sqrt();
    score.is_finite().then_some(score)
}

/// Largest valid top-left placement, or an error when the template does not fit.
pub(crate) fn placement_limits(
    image: ImageView<'_, f64>,
    plan: &CorrelationPlan,
) -> MaskResult<(usize, usize)> {
    let (img_width, img_height) = image.shape();
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    if img_width < tpl_width || img_height < tpl_height {
        return Err(MaskError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: tpl_width,
            height: tpl_height,
            img_width,
            img_height,
        });
    }
    Ok((img_width - tpl_width, img_height - tpl_height))
}

impl ZnccScalar {
    /// Scans every valid placement for which `accept(x, y)` holds.
    pub fn scan_where<F>(
        image: ImageView<'_, f64>,
        plan: &CorrelationPlan,
        params: ScanParams,
        accept: F,
    ) -> MaskResult<Vec<Peak>>
    where
        F: Fn(usize, usize) -> bool,
    {
        let (max_x, max_y) = placement_limits(image, plan)?;
        if params.topk == 0 {
            return Ok(Vec::new());
        }

        let mut topk = TopK::new(params.topk);
        for y in 0..=max_y {
            for x in (0..=max_x).filter(|&x| accept(x, y)) {
                if let Some(score) = window_score(image, plan, x, y, params.min_var_i) {
                    if score >= params.min_score {
                        topk.push(Peak { x, y, score });
                    }
                }
            }
        }

        Ok(topk.into_sorted_desc())
    }
}

impl Kernel for ZnccScalar {
    type Plan = CorrelationPlan;

    fn score_at(
        image: ImageView<'_, f64>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        min_var_i: f64,
    ) -> f64 {
        window_score(image, plan, x, y, min_var_i).unwrap_or(f64::NEG_INFINITY)
    }

    fn scan_full(
        image: ImageView<'_, f64>,
        plan: &Self::Plan,
        params: ScanParams,
    ) -> MaskResult<Vec<Peak>> {
        Self::scan_where(image, plan, params, |_, _| true)
    }
}
