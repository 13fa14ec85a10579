//! Binary region masks over the field-of-view grid and their builders.
//!
//! A [`RegionMask`] stores one byte per pixel, `1` for transmissive and `0`
//! for blocked. Every constructor normalizes to those two values, so set
//! algebra and pixel counts can rely on them.

use crate::image::{Grid, ImageView};
use crate::util::{MaskError, MaskResult};

pub mod dynamic;
pub mod frame;
pub mod geometry;
pub mod library;

/// Binary 2D mask; `1` marks included pixels, `0` excluded ones.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionMask {
    grid: Grid<u8>,
}

impl RegionMask {
    /// Creates a fully blocked mask.
    pub fn zeros(width: usize, height: usize) -> MaskResult<Self> {
        Ok(Self {
            grid: Grid::filled(0, width, height)?,
        })
    }

    /// Creates a fully transmissive mask.
    pub fn ones(width: usize, height: usize) -> MaskResult<Self> {
        Ok(Self {
            grid: Grid::filled(1, width, height)?,
        })
    }

    /// Builds a mask by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> MaskResult<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        Ok(Self {
            grid: Grid::from_fn(width, height, |x, y| u8::from(f(x, y)))?,
        })
    }

    /// Wraps a byte grid; any nonzero value becomes `1`.
    pub fn from_grid(grid: Grid<u8>) -> Self {
        let mut grid = grid;
        for v in grid.data_mut() {
            *v = u8::from(*v != 0);
        }
        Self { grid }
    }

    /// Returns the mask width in pixels.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Returns the mask height in pixels.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    /// Returns the row-major `0`/`1` buffer.
    pub fn as_slice(&self) -> &[u8] {
        self.grid.data()
    }

    /// Returns the underlying byte grid.
    pub fn grid(&self) -> &Grid<u8> {
        &self.grid
    }

    /// Returns a borrowed view of the mask bytes.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.grid.view()
    }

    /// Returns row `y` as `0`/`1` bytes.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.grid.row(y)
    }

    /// Returns true when `(x, y)` is in bounds and transmissive.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y).is_some_and(|&v| v != 0)
    }

    /// Number of transmissive pixels.
    pub fn count(&self) -> usize {
        self.grid.data().iter().filter(|&&v| v != 0).count()
    }

    /// Column indices marked in row `y`, ascending.
    pub fn columns_in_row(&self, y: usize) -> Vec<usize> {
        self.row(y)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(x, &v)| (v != 0).then_some(x))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Row indices marked in column `x`, ascending.
    pub fn rows_in_column(&self, x: usize) -> Vec<usize> {
        (0..self.height()).filter(|&y| self.is_set(x, y)).collect()
    }

    /// Pixel-wise OR; both masks must share a shape.
    pub fn union(&self, other: &RegionMask) -> MaskResult<RegionMask> {
        self.combine(other, |a, b| a | b)
    }

    /// Pixel-wise AND; both masks must share a shape.
    pub fn intersection(&self, other: &RegionMask) -> MaskResult<RegionMask> {
        self.combine(other, |a, b| a & b)
    }

    /// Swaps included and excluded pixels.
    pub fn complement(&self) -> RegionMask {
        let mut out = self.clone();
        for v in out.grid.data_mut() {
            *v ^= 1;
        }
        out
    }

    /// Plain axis transpose, `(x, y) -> (y, x)`.
    pub fn transposed(&self) -> RegionMask {
        Self {
            grid: self.grid.transposed(),
        }
    }

    /// Returns a copy of `image` with every excluded pixel set to zero.
    pub fn apply(&self, image: ImageView<'_, f64>) -> MaskResult<Grid<f64>> {
        self.check_shape(image.shape())?;
        let mut out = image.to_grid()?;
        for (value, &keep) in out.data_mut().iter_mut().zip(self.grid.data()) {
            if keep == 0 {
                *value = 0.0;
            }
        }
        Ok(out)
    }

    /// Marks `x0..=x1` in row `y`; indices must already be clamped.
    pub(crate) fn set_row_span(&mut self, y: usize, x0: usize, x1: usize) {
        if let Some(row) = self.grid.row_mut(y) {
            for v in &mut row[x0..=x1] {
                *v = 1;
            }
        }
    }

    /// Marks `y0..=y1` in column `x`; indices must already be clamped.
    pub(crate) fn set_column_span(&mut self, x: usize, y0: usize, y1: usize) {
        let width = self.width();
        let data = self.grid.data_mut();
        for y in y0..=y1 {
            data[y * width + x] = 1;
        }
    }

    fn check_shape(&self, got: (usize, usize)) -> MaskResult<()> {
        if self.shape() != got {
            return Err(MaskError::ShapeMismatch {
                expected: self.shape(),
                got,
            });
        }
        Ok(())
    }

    fn combine<F>(&self, other: &RegionMask, op: F) -> MaskResult<RegionMask>
    where
        F: Fn(u8, u8) -> u8,
    {
        self.check_shape(other.shape())?;
        let data = self
            .grid
            .data()
            .iter()
            .zip(other.grid.data())
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(Self {
            grid: Grid::new(data, self.width(), self.height())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RegionMask;
    use crate::image::Grid;
    use crate::util::MaskError;

    #[test]
    fn from_grid_normalizes_to_binary() {
        let grid = Grid::new(vec![0u8, 7, 255, 1], 2, 2).unwrap();
        let mask = RegionMask::from_grid(grid);
        assert_eq!(mask.as_slice(), &[0, 1, 1, 1]);
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn set_algebra_matches_truth_tables() {
        let a = RegionMask::from_fn(2, 2, |x, _| x == 0).unwrap();
        let b = RegionMask::from_fn(2, 2, |_, y| y == 0).unwrap();
        assert_eq!(a.union(&b).unwrap().as_slice(), &[1, 1, 1, 0]);
        assert_eq!(a.intersection(&b).unwrap().as_slice(), &[1, 0, 0, 0]);
        assert_eq!(a.complement().as_slice(), &[0, 1, 0, 1]);
    }

    #[test]
    fn union_rejects_mismatched_shapes() {
        let a = RegionMask::zeros(3, 2).unwrap();
        let b = RegionMask::zeros(2, 3).unwrap();
        assert_eq!(
            a.union(&b).unwrap_err(),
            MaskError::ShapeMismatch {
                expected: (3, 2),
                got: (2, 3)
            }
        );
    }

    #[test]
    fn apply_zeroes_excluded_pixels() {
        let mask = RegionMask::from_fn(3, 1, |x, _| x != 1).unwrap();
        let image = [4.0f64, 5.0, 6.0];
        let view = crate::ImageView::from_slice(&image, 3, 1).unwrap();
        let out = mask.apply(view).unwrap();
        assert_eq!(out.data(), &[4.0, 0.0, 6.0]);
    }
}
