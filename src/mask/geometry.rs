//! Elementary region builders over a square grid.
//!
//! Grid centers sit at `((n - 1) / 2, (n - 1) / 2)` so that fields and
//! regions are symmetric under both axis flips.

use crate::image::Grid;
use crate::mask::RegionMask;
use crate::util::MaskResult;

/// Which side of a radius a [`circular_region`] keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inclusion {
    /// Keep pixels whose squared distance is strictly greater than the radius squared.
    Beyond,
    /// Keep pixels whose squared distance is at most the radius squared.
    Within,
}

/// Mask with a transmissive square of side `grid_size - 2 * inset`, centered.
///
/// An inset of half the grid or more yields an all-blocked mask.
pub fn square_region(grid_size: usize, inset: usize) -> MaskResult<RegionMask> {
    let hi = grid_size.saturating_sub(inset);
    RegionMask::from_fn(grid_size, grid_size, |x, y| {
        (inset..hi).contains(&x) && (inset..hi).contains(&y)
    })
}

/// Squared Euclidean distance of every pixel from the grid center.
pub fn radial_field(grid_size: usize) -> MaskResult<Grid<f64>> {
    let c = (grid_size as f64 - 1.0) * 0.5;
    Grid::from_fn(grid_size, grid_size, |x, y| {
        let dx = x as f64 - c;
        let dy = y as f64 - c;
        dx * dx + dy * dy
    })
}

/// Thresholds a radial field at `radius_squared` on the requested side.
pub fn circular_region(field: &Grid<f64>, radius_squared: f64, keep: Inclusion) -> RegionMask {
    RegionMask::from_grid(field.map(|&r2| {
        let inside = match keep {
            Inclusion::Beyond => r2 > radius_squared,
            Inclusion::Within => r2 <= radius_squared,
        };
        u8::from(inside)
    }))
}
