//! Static instrument masks, built once at startup.
//!
//! The library owns every full-field mask derived from the instrument
//! constants and the cross-obscuration rasters. Callers receive shared
//! references; a caller that needs to edit one clones it first.

use crate::config::{
    resolve, CornerRefinement, CrossMaskConfig, InstrumentConstants, ObscurationLevel,
    ObscurationThresholds,
};
use crate::image::io::load_gray_image;
use crate::image::Grid;
use crate::mask::frame::template_to_detector;
use crate::mask::geometry::{circular_region, radial_field, square_region, Inclusion};
use crate::mask::RegionMask;
use crate::telemetry::{trace_event, trace_span};
use crate::util::MaskResult;
use std::path::Path;

/// A rendered cross-obscuration raster paired with its calibrated cuts.
#[derive(Clone, Debug)]
pub struct CrossRaster {
    pub pixels: Grid<u8>,
    pub thresholds: ObscurationThresholds,
}

/// Immutable set of full-field masks.
#[derive(Clone, Debug)]
pub struct MaskLibrary {
    fov_size: usize,
    square: RegionMask,
    square_slit: RegionMask,
    cross: [RegionMask; 3],
    cross_refined: RegionMask,
}

impl MaskLibrary {
    /// Builds every mask from in-memory rasters.
    pub fn build(
        constants: &InstrumentConstants,
        layers: &[CrossRaster; 2],
        refinement: &CornerRefinement,
    ) -> MaskResult<Self> {
        constants.validate()?;
        refinement.validate()?;
        let _span = trace_span!("mask_library_build", fov_size = constants.fov_size).entered();

        let fov = constants.fov_size;
        let square = square_mask(constants)?;
        let square_slit = square_mask_with_slit(constants)?;

        let template_frame = [
            cross_mask(layers, ObscurationLevel::Low, fov)?,
            cross_mask(layers, ObscurationLevel::Medium, fov)?,
            cross_mask(layers, ObscurationLevel::High, fov)?,
        ];
        let refined = refine_corners(
            &template_frame[ObscurationLevel::Medium.index()],
            refinement,
            fov,
        )?;
        let cross = template_frame.map(|mask| template_to_detector(&mask));
        let cross_refined = template_to_detector(&refined);

        trace_event!(
            "mask_library_ready",
            square = square.count(),
            square_slit = square_slit.count(),
            cross_medium = cross[1].count(),
            cross_refined = cross_refined.count(),
        );

        Ok(Self {
            fov_size: fov,
            square,
            square_slit,
            cross,
            cross_refined,
        })
    }

    /// Loads the cross rasters named in `cross` (relative to `root`) and builds the library.
    pub fn load(
        constants: &InstrumentConstants,
        cross: &CrossMaskConfig,
        root: &Path,
    ) -> MaskResult<Self> {
        let load_layer = |idx: usize| -> MaskResult<CrossRaster> {
            let layer = &cross.layers[idx];
            Ok(CrossRaster {
                pixels: load_gray_image(resolve(root, &layer.path))?,
                thresholds: layer.thresholds,
            })
        };
        let layers = [load_layer(0)?, load_layer(1)?];
        Self::build(constants, &layers, &cross.refinement)
    }

    /// Side of the field-of-view grid every mask is defined on.
    pub fn fov_size(&self) -> usize {
        self.fov_size
    }

    /// Unvignetted direct-image footprint.
    pub fn square(&self) -> &RegionMask {
        &self.square
    }

    /// Footprint with the central slit band removed along both axes.
    pub fn square_with_slit(&self) -> &RegionMask {
        &self.square_slit
    }

    /// Spider cross at the given binarization level, detector frame.
    pub fn cross(&self, level: ObscurationLevel) -> &RegionMask {
        &self.cross[level.index()]
    }

    /// Medium-level cross with corner refinement, detector frame.
    pub fn cross_refined(&self) -> &RegionMask {
        &self.cross_refined
    }
}

/// Centered square of half-width `fov_size / 2 - 2 * spider_thickness`.
pub fn square_mask(constants: &InstrumentConstants) -> MaskResult<RegionMask> {
    square_region(constants.fov_size, constants.square_inset())
}

/// Full-field mask blocking a central band `slit_width` pixels wide along both axes.
pub fn slit_band_mask(constants: &InstrumentConstants) -> MaskResult<RegionMask> {
    let fov = constants.fov_size;
    let lo = (fov / 2).saturating_sub(constants.slit_width / 2);
    let hi = lo + constants.slit_width;
    let in_band = |v: usize| (lo..hi).contains(&v);
    RegionMask::from_fn(fov, fov, |x, y| !in_band(x) && !in_band(y))
}

/// Square footprint with the slit band excluded.
pub fn square_mask_with_slit(constants: &InstrumentConstants) -> MaskResult<RegionMask> {
    square_mask(constants)?.intersection(&slit_band_mask(constants)?)
}

/// Resamples a raster onto the `fov x fov` grid and keeps pixels at or above `threshold`.
pub fn binarize(raster: &Grid<u8>, threshold: u8, fov: usize) -> MaskResult<RegionMask> {
    let (src_w, src_h) = raster.shape();
    let data = raster.data();
    RegionMask::from_fn(fov, fov, |x, y| {
        let sx = x * src_w / fov;
        let sy = y * src_h / fov;
        data[sy * src_w + sx] >= threshold
    })
}

/// Cross mask in the template frame: a pixel is blocked when either layer
/// shadows it at `level`.
pub fn cross_mask(
    layers: &[CrossRaster; 2],
    level: ObscurationLevel,
    fov: usize,
) -> MaskResult<RegionMask> {
    let a = binarize(&layers[0].pixels, layers[0].thresholds.get(level), fov)?;
    let b = binarize(&layers[1].pixels, layers[1].thresholds.get(level), fov)?;
    a.intersection(&b)
}

/// Blocks the refinement annulus on top of a template-frame cross mask.
///
/// The bands are evaluated on a half-resolution grid: a pixel joins the
/// obscuration set when it lies within the outer radius and beyond the middle
/// one. The inner disk is never blocked; with ordered radii it sits inside the
/// middle disk, so moving `inner` within `[0, middle]` leaves the result
/// unchanged.
pub fn refine_corners(
    cross: &RegionMask,
    refinement: &CornerRefinement,
    fov: usize,
) -> MaskResult<RegionMask> {
    let half = (fov / 2).max(1);
    let field = radial_field(half)?;
    let square = |r: f64| r * r;
    let band = circular_region(&field, square(refinement.outer), Inclusion::Within)
        .intersection(&circular_region(
            &field,
            square(refinement.middle),
            Inclusion::Beyond,
        ))?
        .intersection(&circular_region(
            &field,
            square(refinement.inner),
            Inclusion::Beyond,
        ))?;
    let clear = RegionMask::from_fn(fov, fov, |x, y| {
        !band.is_set(x * half / fov, y * half / fov)
    })?;
    cross.intersection(&clear)
}

#[cfg(test)]
mod tests {
    use super::{
        binarize, cross_mask, refine_corners, slit_band_mask, square_mask_with_slit, CrossRaster,
        MaskLibrary,
    };
    use crate::config::{
        CornerRefinement, InstrumentConstants, ObscurationLevel, ObscurationThresholds,
    };
    use crate::image::Grid;
    use crate::mask::RegionMask;

    fn thresholds(low: u8, medium: u8, high: u8) -> ObscurationThresholds {
        ObscurationThresholds { low, medium, high }
    }

    #[test]
    fn binarize_excludes_values_strictly_below_threshold() {
        let raster = Grid::new(vec![9u8, 10, 11, 200], 2, 2).unwrap();
        let mask = binarize(&raster, 10, 2).unwrap();
        assert_eq!(mask.as_slice(), &[0, 1, 1, 1]);
    }

    #[test]
    fn binarize_upsamples_nearest_neighbour() {
        let raster = Grid::new(vec![0u8, 255, 255, 255], 2, 2).unwrap();
        let mask = binarize(&raster, 128, 4).unwrap();
        assert_eq!(mask.columns_in_row(0), vec![2, 3]);
        assert_eq!(mask.columns_in_row(1), vec![2, 3]);
        assert_eq!(mask.columns_in_row(2), vec![0, 1, 2, 3]);
    }

    #[test]
    fn cross_mask_unions_shadows_of_both_layers() {
        let a = CrossRaster {
            pixels: Grid::new(vec![0u8, 255, 255, 255], 2, 2).unwrap(),
            thresholds: thresholds(1, 128, 254),
        };
        let b = CrossRaster {
            pixels: Grid::new(vec![255u8, 255, 255, 0], 2, 2).unwrap(),
            thresholds: thresholds(1, 128, 254),
        };
        let mask = cross_mask(&[a, b], ObscurationLevel::Medium, 2).unwrap();
        assert_eq!(mask.as_slice(), &[0, 1, 1, 0]);
    }

    #[test]
    fn slit_band_blocks_centered_rows_and_columns() {
        let constants = InstrumentConstants::new(10, 1, 2).unwrap();
        let band = slit_band_mask(&constants).unwrap();
        assert!(!band.is_set(4, 0));
        assert!(!band.is_set(5, 0));
        assert!(!band.is_set(0, 4));
        assert!(band.is_set(3, 3));
        assert!(band.is_set(6, 6));
        assert_eq!(band.count(), 8 * 8);

        let square_slit = square_mask_with_slit(&constants).unwrap();
        assert_eq!(square_slit.count(), 6 * 6 - 2 * 6 * 2 + 4);
    }

    #[test]
    fn refinement_blocks_annulus_only() {
        let cross = RegionMask::ones(16, 16).unwrap();
        let refinement = CornerRefinement {
            inner: 0.5,
            middle: 1.0,
            outer: 2.0,
        };
        let refined = refine_corners(&cross, &refinement, 16).unwrap();
        assert!(refined.is_set(7, 7));
        assert!(refined.is_set(0, 0));
        assert!(!refined.is_set(4, 8));
        assert!(refined.count() < cross.count());
    }

    #[test]
    fn inner_radius_below_middle_does_not_change_the_band() {
        let cross = RegionMask::ones(32, 32).unwrap();
        let with_inner = |inner: f64| {
            let refinement = CornerRefinement {
                inner,
                middle: 3.0,
                outer: 6.0,
            };
            refine_corners(&cross, &refinement, 32).unwrap()
        };
        let reference = with_inner(0.0);
        assert!(reference.count() < cross.count());
        for inner in [0.5, 1.5, 2.999, 3.0] {
            assert_eq!(with_inner(inner), reference, "inner = {inner}");
        }
    }

    #[test]
    fn library_rejects_inner_radius_past_middle() {
        let layer = CrossRaster {
            pixels: Grid::new(vec![255u8; 8 * 8], 8, 8).unwrap(),
            thresholds: thresholds(50, 100, 150),
        };
        let constants = InstrumentConstants::new(8, 1, 2).unwrap();
        let refinement = CornerRefinement {
            inner: 2.0,
            middle: 1.0,
            outer: 3.0,
        };
        let err = MaskLibrary::build(&constants, &[layer.clone(), layer], &refinement).unwrap_err();
        assert!(matches!(
            err,
            crate::util::MaskError::InvalidParameter {
                name: "refinement",
                ..
            }
        ));
    }

    #[test]
    fn library_cross_is_in_detector_frame() {
        let mut pixels = vec![255u8; 8 * 8];
        for x in 0..8 {
            pixels[x] = 0;
        }
        let layer = CrossRaster {
            pixels: Grid::new(pixels, 8, 8).unwrap(),
            thresholds: thresholds(50, 100, 150),
        };
        let constants = InstrumentConstants::new(8, 1, 2).unwrap();
        let refinement = CornerRefinement {
            inner: 0.0,
            middle: 0.0,
            outer: 0.0,
        };
        let library = MaskLibrary::build(&constants, &[layer.clone(), layer], &refinement).unwrap();
        let cross = library.cross(ObscurationLevel::High);
        assert_eq!(cross.rows_in_column(0), Vec::<usize>::new());
        assert_eq!(cross.columns_in_row(0), (1..8).collect::<Vec<_>>());
        assert_eq!(library.square().count(), 4 * 4);
    }
}
