//! Correlation-based localization of sources and traces.
//!
//! A [`Locator`] slides a [`CorrelationPlan`] over a frame, keeps the best
//! placements, suppresses neighbours of stronger peaks and refines each
//! survivor to subpixel precision. Reported positions are template centers
//! in frame coordinates.

use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{Kernel, ScanParams};
use crate::mask::RegionMask;
use crate::refine::refine_subpixel_2d;
use crate::telemetry::{trace_event, trace_span};
use crate::templates::CorrelationPlan;
use crate::util::{MaskError, MaskResult};
use crate::ImageView;

/// Search settings for a [`Locator`].
#[derive(Clone, Copy, Debug)]
pub struct LocateConfig {
    /// Maximum number of locations to report.
    pub topk: usize,
    /// Chebyshev radius, in placements, within which weaker peaks are dropped.
    pub nms_radius: usize,
    /// Minimum window variance; flatter windows are skipped.
    pub min_var_i: f64,
    /// Minimum ZNCC score to report.
    pub min_score: f64,
    /// Use the row-parallel scan when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            topk: 1,
            nms_radius: 8,
            min_var_i: 1e-9,
            min_score: f64::NEG_INFINITY,
            parallel: false,
        }
    }
}

/// A localized template center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    /// Subpixel column of the template center.
    pub x: f64,
    /// Subpixel row of the template center.
    pub y: f64,
    /// ZNCC score at the integer placement.
    pub score: f64,
    /// Integer top-left placement the location was refined from.
    pub peak: Peak,
}

/// Template localizer over `f64` frames.
#[derive(Clone, Debug)]
pub struct Locator {
    plan: CorrelationPlan,
    cfg: LocateConfig,
}

impl Locator {
    pub fn new(plan: CorrelationPlan) -> Self {
        Self {
            plan,
            cfg: LocateConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: LocateConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn plan(&self) -> &CorrelationPlan {
        &self.plan
    }

    pub fn config(&self) -> &LocateConfig {
        &self.cfg
    }

    /// Subpixel template centers, best first.
    pub fn locate(&self, image: ImageView<'_, f64>) -> MaskResult<Vec<Location>> {
        locate_with(&self.plan, &self.cfg, image)
    }
}

/// Subpixel template centers of `plan` in `image`, best first.
pub fn locate_with(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
) -> MaskResult<Vec<Location>> {
    let peaks = find_peaks(plan, cfg, image, None)?;
    Ok(refine_all(plan, cfg, image, peaks))
}

/// Like [`locate_with`], but only placements whose template center falls on
/// a transmissive pixel of `footprint` are considered.
///
/// `footprint` must have the shape of `image`.
pub fn locate_within(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
    footprint: &RegionMask,
) -> MaskResult<Vec<Location>> {
    if footprint.shape() != image.shape() {
        return Err(MaskError::ShapeMismatch {
            expected: image.shape(),
            got: footprint.shape(),
        });
    }
    let peaks = find_peaks(plan, cfg, image, Some(footprint))?;
    Ok(refine_all(plan, cfg, image, peaks))
}

/// Scan capacity that keeps `topk` survivors of NMS with radius `nms_radius`.
fn candidate_capacity(topk: usize, nms_radius: usize) -> usize {
    let window = nms_radius.saturating_mul(2).saturating_add(1);
    topk.saturating_mul(window.saturating_mul(window))
}

fn find_peaks(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
    footprint: Option<&RegionMask>,
) -> MaskResult<Vec<Peak>> {
    let _span = trace_span!("locate_scan", width = image.width(), height = image.height()).entered();
    if cfg.topk == 0 {
        return Ok(Vec::new());
    }

    let params = ScanParams {
        topk: candidate_capacity(cfg.topk, cfg.nms_radius),
        min_var_i: cfg.min_var_i,
        min_score: cfg.min_score,
    };
    let (cx, cy) = ((plan.width() - 1) / 2, (plan.height() - 1) / 2);
    let accept = |x: usize, y: usize| footprint.map_or(true, |fp| fp.is_set(x + cx, y + cy));
    let mut candidates = scan(plan, cfg, image, params, accept)?;
    let mut kept = nms_2d(&mut candidates, cfg.nms_radius);
    kept.truncate(cfg.topk);

    trace_event!(
        "locate_peaks",
        candidates = candidates.len(),
        kept = kept.len(),
        best = kept.first().map_or(f64::NAN, |p| p.score),
    );
    Ok(kept)
}

fn scan<F>(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
    params: ScanParams,
    accept: F,
) -> MaskResult<Vec<Peak>>
where
    F: Fn(usize, usize) -> bool + Sync,
{
    #[cfg(feature = "rayon")]
    if cfg.parallel {
        return crate::kernel::rayon::zncc_scan_par_where(image, plan, params, accept);
    }
    #[cfg(not(feature = "rayon"))]
    let _ = cfg.parallel;
    ZnccScalar::scan_where(image, plan, params, accept)
}

fn refine_all(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
    peaks: Vec<Peak>,
) -> Vec<Location> {
    peaks
        .into_iter()
        .map(|peak| refine(plan, cfg, image, peak))
        .collect()
}

fn refine(
    plan: &CorrelationPlan,
    cfg: &LocateConfig,
    image: ImageView<'_, f64>,
    peak: Peak,
) -> Location {
    let mut s = [[f64::NEG_INFINITY; 3]; 3];
    for (dy, row) in s.iter_mut().enumerate() {
        for (dx, value) in row.iter_mut().enumerate() {
            let (Some(x), Some(y)) = ((peak.x + dx).checked_sub(1), (peak.y + dy).checked_sub(1))
            else {
                continue;
            };
            *value = ZnccScalar::score_at(image, plan, x, y, cfg.min_var_i);
        }
    }
    s[1][1] = peak.score;
    let (x, y) = refine_subpixel_2d(peak.x, peak.y, s);
    Location {
        x: x + (plan.width() as f64 - 1.0) * 0.5,
        y: y + (plan.height() as f64 - 1.0) * 0.5,
        score: peak.score,
        peak,
    }
}

#[cfg(test)]
mod tests {
    use super::{candidate_capacity, locate_within, LocateConfig, Locator};
    use crate::image::Grid;
    use crate::mask::RegionMask;
    use crate::templates::CorrelationPlan;
    use crate::util::MaskError;

    fn blob(size: usize, cx: f64, cy: f64) -> Grid<f64> {
        Grid::from_fn(size, size, |x, y| {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            (-(dx * dx + dy * dy) / 4.0).exp()
        })
        .unwrap()
    }

    #[test]
    fn finds_two_separated_blobs() {
        let tpl = blob(9, 4.0, 4.0);
        let mut frame = vec![0.0f64; 60 * 40];
        for (cx, cy) in [(12usize, 10usize), (45, 28)] {
            for y in 0..9 {
                for x in 0..9 {
                    frame[(cy - 4 + y) * 60 + (cx - 4 + x)] += tpl.get(x, y).copied().unwrap();
                }
            }
        }
        let frame = Grid::new(frame, 60, 40).unwrap();
        let locator = Locator::new(CorrelationPlan::from_view(tpl.view()).unwrap()).with_config(
            LocateConfig {
                topk: 2,
                nms_radius: 4,
                ..LocateConfig::default()
            },
        );
        let mut found = locator.locate(frame.view()).unwrap();
        assert_eq!(found.len(), 2);
        found.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert!((found[0].x - 12.0).abs() < 0.1 && (found[0].y - 10.0).abs() < 0.1);
        assert!((found[1].x - 45.0).abs() < 0.1 && (found[1].y - 28.0).abs() < 0.1);
        assert!(found.iter().all(|l| l.score > 0.99));
    }

    fn two_blob_frame(tpl: &Grid<f64>) -> Grid<f64> {
        let mut frame = vec![0.0f64; 60 * 40];
        // The second source is broader, so it never ties the exact copy.
        for (cx, cy, power) in [(12usize, 10usize, 1.0), (45, 28, 0.8)] {
            for y in 0..9 {
                for x in 0..9 {
                    frame[(cy - 4 + y) * 60 + (cx - 4 + x)] +=
                        tpl.get(x, y).copied().unwrap().powf(power);
                }
            }
        }
        Grid::new(frame, 60, 40).unwrap()
    }

    #[test]
    fn oversized_nms_radius_saturates() {
        assert_eq!(candidate_capacity(1, 4), 81);
        assert_eq!(candidate_capacity(1, usize::MAX / 4), usize::MAX);
        assert_eq!(candidate_capacity(usize::MAX / 2, 8), usize::MAX);

        let tpl = blob(9, 4.0, 4.0);
        let frame = two_blob_frame(&tpl);
        let locator = Locator::new(CorrelationPlan::from_view(tpl.view()).unwrap()).with_config(
            LocateConfig {
                topk: 1,
                nms_radius: usize::MAX / 4,
                ..LocateConfig::default()
            },
        );
        let found = locator.locate(frame.view()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].peak.x, found[0].peak.y), (8, 6));
    }

    #[test]
    fn footprint_hides_sources_on_blocked_pixels() {
        let tpl = blob(9, 4.0, 4.0);
        let frame = two_blob_frame(&tpl);
        let plan = CorrelationPlan::from_view(tpl.view()).unwrap();
        let cfg = LocateConfig {
            topk: 1,
            nms_radius: 4,
            ..LocateConfig::default()
        };

        let open = RegionMask::ones(60, 40).unwrap();
        let best = locate_within(&plan, &cfg, frame.view(), &open).unwrap();
        assert!((best[0].x - 12.0).abs() < 0.1 && (best[0].y - 10.0).abs() < 0.1);

        // A vertical bar over the brighter source.
        let barred = RegionMask::from_fn(60, 40, |x, _| !(6..=18).contains(&x)).unwrap();
        let best = locate_within(&plan, &cfg, frame.view(), &barred).unwrap();
        assert_eq!(best.len(), 1);
        assert!((best[0].x - 45.0).abs() < 0.1 && (best[0].y - 28.0).abs() < 0.1);
        assert!(best[0].score > 0.9);

        let wrong = RegionMask::ones(40, 60).unwrap();
        assert_eq!(
            locate_within(&plan, &cfg, frame.view(), &wrong).unwrap_err(),
            MaskError::ShapeMismatch {
                expected: (60, 40),
                got: (40, 60)
            }
        );
    }
}
