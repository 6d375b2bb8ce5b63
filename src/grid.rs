use ndarray::{Array2, ArrayView2};
use ndarray_stats::QuantileExt;

#[cfg(feature = "python")]
use numpy::PyReadonlyArray2;

use crate::error::{ShadeError, ShadeResult};

/// Row-major elevation raster. Row index `i` runs along x (east), column
/// index `j` along z (south); elevations are the y (up) coordinate.
#[derive(Debug, Clone)]
pub struct HeightGrid {
    heights: Array2<f32>,
    ground: f32,
}

impl HeightGrid {
    pub fn new(heights: Array2<f32>) -> ShadeResult<Self> {
        let (rows, cols) = heights.dim();
        if rows < 2 || cols < 2 {
            return Err(ShadeError::GridTooSmall { rows, cols });
        }
        if let Some(((row, col), &value)) = heights.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ShadeError::NonFiniteElevation { row, col, value });
        }
        // All values are finite, so the ordering is total.
        let ground = *heights
            .min()
            .map_err(|_| ShadeError::GridTooSmall { rows, cols })?;
        Ok(Self { heights, ground })
    }

    pub fn from_view(view: ArrayView2<f32>) -> ShadeResult<Self> {
        Self::new(view.to_owned())
    }

    /// A grid where every cell sits at `elevation`.
    pub fn flat(rows: usize, cols: usize, elevation: f32) -> ShadeResult<Self> {
        Self::new(Array2::from_elem((rows, cols), elevation))
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.heights.dim()
    }

    /// Global minimum elevation.
    #[inline]
    pub fn ground(&self) -> f32 {
        self.ground
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.heights.view()
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.heights[[row, col]]
    }

    /// Elevation at a signed index, `None` outside the grid.
    #[inline]
    pub fn get(&self, row: isize, col: isize) -> Option<f32> {
        if row < 0 || col < 0 {
            return None;
        }
        self.heights.get([row as usize, col as usize]).copied()
    }

    /// Number of cells that carry facets (all but the last row and column).
    #[inline]
    pub fn cell_dim(&self) -> (usize, usize) {
        let (rows, cols) = self.dim();
        (rows - 1, cols - 1)
    }
}

#[cfg(feature = "python")]
impl<'py> TryFrom<PyReadonlyArray2<'py, f32>> for HeightGrid {
    type Error = ShadeError;

    fn try_from(array: PyReadonlyArray2<'py, f32>) -> ShadeResult<Self> {
        Self::from_view(array.as_array())
    }
}
