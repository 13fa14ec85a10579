//! Correlation plan precomputation for ZNCC scans.

use crate::image::ImageView;
use crate::mask::RegionMask;
use crate::util::{MaskError, MaskResult};

/// Zero-mean, optionally masked template ready for ZNCC scoring.
///
/// Pixels outside the mask carry zero weight: they contribute neither to
/// the template statistics nor to the image window statistics at scan time.
#[derive(Clone, Debug)]
pub struct CorrelationPlan {
    width: usize,
    height: usize,
    weights: Vec<u8>,
    sum_w: f64,
    mean: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl CorrelationPlan {
    /// Builds an unmasked plan from a template view.
    pub fn from_view(tpl: ImageView<'_, f64>) -> MaskResult<Self> {
        let weights = vec![1u8; tpl.width() * tpl.height()];
        Self::build(tpl, weights)
    }

    /// Builds a plan restricted to the transmissive pixels of `mask`.
    pub fn from_masked(tpl: ImageView<'_, f64>, mask: &RegionMask) -> MaskResult<Self> {
        if mask.shape() != tpl.shape() {
            return Err(MaskError::ShapeMismatch {
                expected: tpl.shape(),
                got: mask.shape(),
            });
        }
        Self::build(tpl, mask.as_slice().to_vec())
    }

    fn build(tpl: ImageView<'_, f64>, weights: Vec<u8>) -> MaskResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let values = tpl.to_grid()?.into_vec();

        let mut sum_w = 0.0f64;
        let mut sum = 0.0f64;
        for (&v, &w) in values.iter().zip(&weights) {
            if w != 0 {
                if !v.is_finite() {
                    return Err(MaskError::DegenerateTemplate {
                        reason: "non-finite value",
                    });
                }
                sum_w += 1.0;
                sum += v;
            }
        }
        if sum_w == 0.0 {
            return Err(MaskError::DegenerateTemplate {
                reason: "empty mask",
            });
        }

        let mean = sum / sum_w;
        let mut var_t = 0.0f64;
        let t_prime: Vec<f64> = values
            .iter()
            .zip(&weights)
            .map(|(&v, &w)| {
                if w == 0 {
                    return 0.0;
                }
                let d = v - mean;
                var_t += d * d;
                d
            })
            .collect();
        if var_t <= 1e-12 {
            return Err(MaskError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            weights,
            sum_w,
            mean,
            var_t,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Mean of the weighted template pixels.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Number of pixels with nonzero weight.
    pub fn sum_w(&self) -> f64 {
        self.sum_w
    }

    /// Sum of squared deviations over weighted pixels.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Zero-mean template, zero outside the mask, row-major.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }

    /// Per-pixel `0`/`1` weights, row-major.
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }
}
