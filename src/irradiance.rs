//! Direct and diffuse irradiance accumulated over the hours of a day.
//!
//! Each hour contributes a partial grid: `max(0, direct · normal)` on every
//! facet of an unshaded cell, plus a uniform diffuse term on every facet.
//! Partial grids are independent and are summed at the end; the sum is then
//! stretched linearly to [0, 1].

use ndarray::{Array3, ArrayView3, Axis, Zip};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray3, PyReadonlyArray2};
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::error::{ShadeError, ShadeResult};
use crate::shadowing::ShadowMask;
use crate::sun::irradiance_scale;
use crate::surface::NormalGrid;

/// Relative weight of the direct and diffuse terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrradianceWeights {
    pub direct: f64,
    pub diffuse: f64,
}

impl Default for IrradianceWeights {
    fn default() -> Self {
        Self {
            direct: 0.85,
            diffuse: 0.15,
        }
    }
}

/// Everything one hour contributes: when it is, where the sun is, and what it lights.
#[derive(Debug, Clone)]
pub struct HourlyIllumination {
    pub hour: f64,
    /// Unit vector towards the sun.
    pub direction: [f64; 3],
    pub mask: ShadowMask,
}

/// Per-facet shade values, shape `(rows - 1, cols - 1, facets)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadeGrid {
    shade: Array3<f64>,
}

impl ShadeGrid {
    pub fn zeros(cell_dim: (usize, usize), facets: usize) -> Self {
        Self {
            shade: Array3::zeros((cell_dim.0, cell_dim.1, facets)),
        }
    }

    pub fn from_array(shade: Array3<f64>) -> Self {
        Self { shade }
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.shade.view()
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.shade.dim()
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize, facet: usize) -> f64 {
        self.shade[[row, col, facet]]
    }

    pub fn into_array(self) -> Array3<f64> {
        self.shade
    }

    /// Smallest and largest value.
    pub fn extent(&self) -> ShadeResult<(f64, f64)> {
        let min = *self
            .shade
            .min()
            .map_err(|_| ShadeError::UndefinedExtent)?;
        let max = *self
            .shade
            .max()
            .map_err(|_| ShadeError::UndefinedExtent)?;
        Ok((min, max))
    }

    /// Stretches the values in place so the minimum becomes 0 and the maximum 1.
    ///
    /// A field with a single value cannot be stretched and is reported as
    /// [`ShadeError::DegenerateInput`]; the grid is left untouched.
    pub fn normalize(&mut self) -> ShadeResult<()> {
        let (min, max) = self.extent()?;
        if max == min {
            return Err(ShadeError::DegenerateInput { value: min });
        }
        let span = max - min;
        self.shade.par_mapv_inplace(|v| (v - min) / span);
        Ok(())
    }
}

#[inline]
fn dot(v: [f64; 3], n: ndarray::ArrayView1<f32>) -> f64 {
    v[0] * n[0] as f64 + v[1] * n[1] as f64 + v[2] * n[2] as f64
}

#[inline]
fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn check_mask(normals: &NormalGrid, mask: &ShadowMask) -> ShadeResult<()> {
    let (rows, cols) = normals.cell_dim();
    let expected = (rows + 1, cols + 1);
    if mask.dim() != expected {
        return Err(ShadeError::ShapeMismatch {
            expected,
            actual: mask.dim(),
        });
    }
    Ok(())
}

/// Raw `max(0, sun · normal)` per facet, ignoring occlusion.
pub fn shade_single_hour(normals: &NormalGrid, sun: [f64; 3]) -> ShadeGrid {
    let (rows, cols) = normals.cell_dim();
    let mut shade = Array3::<f64>::zeros((rows, cols, normals.facets()));
    Zip::indexed(shade.lanes_mut(Axis(2))).par_for_each(|(i, j), mut cell| {
        for (facet, value) in cell.iter_mut().enumerate() {
            *value = dot(sun, normals.normal(i, j, facet)).max(0.0);
        }
    });
    ShadeGrid { shade }
}

/// Partial grid for one hour. The mask must already match the normal grid.
fn hour_contribution(
    normals: &NormalGrid,
    weights: IrradianceWeights,
    hour: &HourlyIllumination,
) -> Array3<f64> {
    let scaled = irradiance_scale(hour.direction, hour.hour);
    let direct = scaled.map(|c| weights.direct * c);
    let diffuse = weights.diffuse * norm(scaled);

    let (rows, cols) = normals.cell_dim();
    let mut partial = Array3::<f64>::from_elem((rows, cols, normals.facets()), diffuse);
    Zip::indexed(partial.lanes_mut(Axis(2))).par_for_each(|(i, j), mut cell| {
        if !hour.mask.is_lit(i, j) {
            return;
        }
        for (facet, value) in cell.iter_mut().enumerate() {
            *value += dot(direct, normals.normal(i, j, facet)).max(0.0);
        }
    });
    partial
}

/// Sole owner of a running shade total while hours are folded in one at a time.
pub struct IrradianceAccumulator<'a> {
    normals: &'a NormalGrid,
    weights: IrradianceWeights,
    shade: ShadeGrid,
    hours: usize,
}

impl<'a> IrradianceAccumulator<'a> {
    pub fn new(normals: &'a NormalGrid, weights: IrradianceWeights) -> Self {
        Self {
            normals,
            weights,
            shade: ShadeGrid::zeros(normals.cell_dim(), normals.facets()),
            hours: 0,
        }
    }

    pub fn add_hour(&mut self, hour: &HourlyIllumination) -> ShadeResult<()> {
        check_mask(self.normals, &hour.mask)?;
        let partial = hour_contribution(self.normals, self.weights, hour);
        self.shade.shade += &partial;
        self.hours += 1;
        Ok(())
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    /// The raw, un-normalized total.
    pub fn finish(self) -> ShadeGrid {
        self.shade
    }
}

/// Builds the hourly partial grids in parallel and sums them in hour order,
/// so repeated runs give bit-identical totals. The result is not normalized.
pub fn accumulate(
    normals: &NormalGrid,
    hours: &[HourlyIllumination],
    weights: IrradianceWeights,
) -> ShadeResult<ShadeGrid> {
    for hour in hours {
        check_mask(normals, &hour.mask)?;
    }
    let partials: Vec<Array3<f64>> = hours
        .par_iter()
        .map(|hour| hour_contribution(normals, weights, hour))
        .collect();

    let mut shade = ShadeGrid::zeros(normals.cell_dim(), normals.facets());
    for partial in &partials {
        shade.shade += partial;
    }
    Ok(shade)
}

/// [`accumulate`] followed by [`ShadeGrid::normalize`].
pub fn accumulate_normalized(
    normals: &NormalGrid,
    hours: &[HourlyIllumination],
    weights: IrradianceWeights,
) -> ShadeResult<ShadeGrid> {
    let mut shade = accumulate(normals, hours, weights)?;
    shade.normalize()?;
    Ok(shade)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (heights, sun_vector, refined=true))]
/// Un-occluded `max(0, sun · normal)` per facet for one sun vector (Python wrapper).
pub fn single_hour_shade(
    py: Python,
    heights: PyReadonlyArray2<f32>,
    sun_vector: [f64; 3],
    refined: bool,
) -> PyResult<Py<PyArray3<f64>>> {
    let grid = crate::grid::HeightGrid::try_from(heights)?;
    let scheme = if refined {
        crate::surface::NormalScheme::Refined
    } else {
        crate::surface::NormalScheme::Coarse
    };
    let normals = crate::surface::compute_normals(&grid, scheme);
    Ok(shade_single_hour(&normals, sun_vector)
        .into_array()
        .into_pyarray(py)
        .unbind())
}
