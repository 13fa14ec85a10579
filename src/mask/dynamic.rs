//! Per-source trace masks built at extraction time.
//!
//! Both builders allocate a fresh square mask per call and read nothing but
//! their arguments, so independent calls can run on any thread.

use crate::mask::RegionMask;
use crate::telemetry::trace_event;
use crate::util::math::{clamp_span, tilt_correction};
use crate::util::{MaskError, MaskResult};
use serde::{Deserialize, Serialize};

/// Trace description produced by an external trace finder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceFit {
    /// Fitted centerline row for every column of the cutout.
    pub rows: Vec<f64>,
    /// Trace tilt in degrees.
    pub angle_deg: f64,
}

impl TraceFit {
    pub fn new(rows: Vec<f64>, angle_deg: f64) -> Self {
        Self { rows, angle_deg }
    }

    /// Builds the fit-driven mask; see [`trace_mask_from_fit`].
    pub fn mask(&self, width: f64) -> MaskResult<RegionMask> {
        trace_mask_from_fit(&self.rows, width, self.angle_deg)
    }
}

/// Square mask holding a band around the anti-diagonal.
///
/// Row `i` marks the inclusive column span
/// `[c - width / 2, c - width / 2 + width]` with `c = size - 1 - i`, clamped
/// to the grid. The band runs from bottom-left to top-right, so at most
/// `width + 1` columns are marked per row and the span moves one column left
/// per row.
pub fn diagonal_mask(size: usize, width: usize) -> MaskResult<RegionMask> {
    if size == 0 {
        return Err(MaskError::InvalidParameter {
            name: "size",
            reason: "must be positive",
        });
    }
    if width == 0 {
        return Err(MaskError::InvalidParameter {
            name: "width",
            reason: "must be positive",
        });
    }

    let mut mask = RegionMask::zeros(size, size)?;
    let half = (width / 2) as i64;
    for y in 0..size {
        let center = (size - 1 - y) as i64;
        let lo = center - half;
        if let Some((x0, x1)) = clamp_span(lo, lo + width as i64, size) {
            mask.set_row_span(y, x0, x1);
        }
    }
    Ok(mask)
}

/// Square mask of side `fit.len()` hugging a measured trace centerline.
///
/// The half-width is widened by `1 / cos(angle_deg)` to account for the tilt.
/// Column `j` then marks rows `floor(fit[j] - w)..=floor(fit[j] + w)`, clamped
/// to the grid. A column whose band falls entirely outside the grid, or whose
/// fit value is not finite, stays empty.
pub fn trace_mask_from_fit(fit: &[f64], width: f64, angle_deg: f64) -> MaskResult<RegionMask> {
    if fit.is_empty() {
        return Err(MaskError::InvalidParameter {
            name: "fit",
            reason: "must contain at least one column",
        });
    }
    if !width.is_finite() || width <= 0.0 {
        return Err(MaskError::InvalidParameter {
            name: "width",
            reason: "must be finite and positive",
        });
    }
    let factor = tilt_correction(angle_deg).ok_or(MaskError::InvalidParameter {
        name: "angle",
        reason: "tilt must satisfy cos(angle) > 0",
    })?;
    let half = width * factor;

    let size = fit.len();
    let mut mask = RegionMask::zeros(size, size)?;
    let mut empty_columns = 0usize;
    for (x, &center) in fit.iter().enumerate() {
        let span = center
            .is_finite()
            .then(|| {
                let lo = (center - half).floor() as i64;
                let hi = (center + half).floor() as i64;
                clamp_span(lo, hi, size)
            })
            .flatten();
        match span {
            Some((y0, y1)) => mask.set_column_span(x, y0, y1),
            None => empty_columns += 1,
        }
    }
    trace_event!("trace_mask_from_fit", size = size, empty_columns = empty_columns);
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::{diagonal_mask, trace_mask_from_fit, TraceFit};
    use crate::util::MaskError;

    #[test]
    fn diagonal_rows_for_size_ten_width_two() {
        let mask = diagonal_mask(10, 2).unwrap();
        assert_eq!(mask.columns_in_row(0), vec![8, 9]);
        assert_eq!(mask.columns_in_row(1), vec![7, 8, 9]);
        assert_eq!(mask.columns_in_row(5), vec![3, 4, 5]);
        assert_eq!(mask.columns_in_row(9), vec![0, 1]);
    }

    #[test]
    fn diagonal_rejects_zero_inputs() {
        assert_eq!(
            diagonal_mask(0, 3).unwrap_err(),
            MaskError::InvalidParameter {
                name: "size",
                reason: "must be positive"
            }
        );
        assert_eq!(
            diagonal_mask(5, 0).unwrap_err(),
            MaskError::InvalidParameter {
                name: "width",
                reason: "must be positive"
            }
        );
    }

    #[test]
    fn fit_mask_at_zero_angle_is_symmetric_band() {
        let fit = vec![5.0; 12];
        let mask = trace_mask_from_fit(&fit, 2.0, 0.0).unwrap();
        for x in 0..12 {
            assert_eq!(mask.rows_in_column(x), vec![3, 4, 5, 6, 7]);
        }
    }

    #[test]
    fn fit_mask_clamps_and_leaves_outside_columns_empty() {
        let fit = vec![0.0, 11.0, -10.0, f64::NAN];
        let mask = trace_mask_from_fit(&fit, 1.0, 0.0).unwrap();
        assert_eq!(mask.rows_in_column(0), vec![0, 1]);
        assert_eq!(mask.rows_in_column(1), Vec::<usize>::new());
        assert_eq!(mask.rows_in_column(2), Vec::<usize>::new());
        assert_eq!(mask.rows_in_column(3), Vec::<usize>::new());
    }

    #[test]
    fn fit_mask_widens_with_tilt() {
        let fit = TraceFit::new(vec![10.5; 21], 60.0);
        let mask = fit.mask(2.0).unwrap();
        assert_eq!(mask.rows_in_column(4), (6..=14).collect::<Vec<_>>());
    }

    #[test]
    fn fit_mask_rejects_bad_parameters() {
        assert!(matches!(
            trace_mask_from_fit(&[], 1.0, 0.0),
            Err(MaskError::InvalidParameter { name: "fit", .. })
        ));
        assert!(matches!(
            trace_mask_from_fit(&[1.0], -1.0, 0.0),
            Err(MaskError::InvalidParameter { name: "width", .. })
        ));
        assert!(matches!(
            trace_mask_from_fit(&[1.0], 1.0, 90.0),
            Err(MaskError::InvalidParameter { name: "angle", .. })
        ));
    }
}
