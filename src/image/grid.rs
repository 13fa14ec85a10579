//! Owned contiguous row-major 2D arrays.

use crate::image::ImageView;
use crate::util::{MaskError, MaskResult};

/// Owned contiguous 2D buffer in row-major order.
///
/// Used for radial distance fields, loaded template planes and any frame the
/// crate hands back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Grid<T> {
    /// Wraps a row-major buffer whose length must equal `width * height`.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> MaskResult<Self> {
        if width == 0 || height == 0 {
            return Err(MaskError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(MaskError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(MaskError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(MaskError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a grid by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> MaskResult<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        let needed = width
            .checked_mul(height)
            .ok_or(MaskError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(needed);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(data, width, height)
    }

    /// Returns the grid width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the row-major backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid and returns its buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> Option<&mut [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get_mut(start..start + self.width)
    }

    /// Applies `f` to every element, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            data: self.data.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Returns a borrowed view of the grid.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every element set to `value`.
    pub fn filled(value: T, width: usize, height: usize) -> MaskResult<Self> {
        let needed = width
            .checked_mul(height)
            .ok_or(MaskError::InvalidDimensions { width, height })?;
        Self::new(vec![value; needed], width, height)
    }

    /// Returns the transpose: element `(x, y)` moves to `(y, x)`.
    pub fn transposed(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for x in 0..self.width {
            for y in 0..self.height {
                data.push(self.data[y * self.width + x].clone());
            }
        }
        Self {
            data,
            width: self.height,
            height: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Grid;
    use crate::util::MaskError;

    #[test]
    fn new_rejects_wrong_length() {
        let err = Grid::new(vec![0u8; 5], 2, 3).unwrap_err();
        assert_eq!(err, MaskError::BufferTooSmall { needed: 6, got: 5 });
        let err = Grid::new(vec![0u8; 7], 2, 3).unwrap_err();
        assert_eq!(
            err,
            MaskError::InvalidDimensions {
                width: 2,
                height: 3
            }
        );
    }

    #[test]
    fn transposed_swaps_axes() {
        let grid = Grid::from_fn(3, 2, |x, y| (x, y)).unwrap();
        let t = grid.transposed();
        assert_eq!(t.shape(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(t.get(y, x), Some(&(x, y)));
            }
        }
    }

    #[test]
    fn view_roi_reads_through_stride() {
        let grid = Grid::from_fn(4, 4, |x, y| (y * 4 + x) as u8).unwrap();
        let roi = grid.view().roi(1, 2, 2, 2).unwrap();
        assert_eq!(roi.row(0).unwrap(), &[9u8, 10]);
        assert_eq!(roi.row(1).unwrap(), &[13u8, 14]);
        let copy = roi.to_grid().unwrap();
        assert_eq!(copy.data(), &[9u8, 10, 13, 14]);
    }
}
