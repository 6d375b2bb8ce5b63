//! Per-cell facet normals derived from the height raster.
//!
//! Every cell `(i, j)` between vertices `(i, j)` and `(i + 1, j + 1)` is covered
//! by planar triangles. The coarse scheme splits the quad once; the refined
//! scheme first subdivides it into a 3x3 sub-raster (corners, edge midpoints,
//! centre) and splits each of the four sub-quads. Facet index is
//! `2 * sub_quad + triangle` with sub-quads ordered row-major.

use ndarray::parallel::prelude::*;
use ndarray::{Array4, ArrayView1, ArrayView4, Axis};

#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray4, PyReadonlyArray2};
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::grid::HeightGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalScheme {
    /// Two triangles per cell built from the integer corners.
    Coarse,
    /// Eight triangles per cell built from the subdivided 3x3 sub-raster.
    #[default]
    Refined,
}

impl NormalScheme {
    /// Triangles per cell.
    pub const fn facets(self) -> usize {
        match self {
            NormalScheme::Coarse => 2,
            NormalScheme::Refined => 8,
        }
    }

    /// Sub-quads along each cell edge.
    const fn divisions(self) -> usize {
        match self {
            NormalScheme::Coarse => 1,
            NormalScheme::Refined => 2,
        }
    }
}

/// Unit facet normals, shape `(rows - 1, cols - 1, facets, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalGrid {
    scheme: NormalScheme,
    normals: Array4<f32>,
}

impl NormalGrid {
    pub fn scheme(&self) -> NormalScheme {
        self.scheme
    }

    /// Cell dimensions `(rows - 1, cols - 1)`.
    pub fn cell_dim(&self) -> (usize, usize) {
        let shape = self.normals.shape();
        (shape[0], shape[1])
    }

    pub fn facets(&self) -> usize {
        self.scheme.facets()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.normals.view()
    }

    pub fn normal(&self, row: usize, col: usize, facet: usize) -> ArrayView1<'_, f32> {
        self.normals.slice(ndarray::s![row, col, facet, ..])
    }

    pub fn into_array(self) -> Array4<f32> {
        self.normals
    }
}

type Vec3 = [f64; 3];

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Area vector of triangle `(p0, p1, p2)`: its magnitude is the planar area
/// and, for the winding used by [`quad_normals`], it points up (+y).
#[inline]
pub(crate) fn area_vector(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    let n = cross(sub(p2, p0), sub(p1, p0));
    [0.5 * n[0], 0.5 * n[1], 0.5 * n[2]]
}

#[inline]
fn unit(v: Vec3) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [(v[0] / len) as f32, (v[1] / len) as f32, (v[2] / len) as f32]
}

/// Normals of the two triangles splitting the quad with corners
/// `a = (r, c)`, `b = (r + 1, c)`, `c = (r, c + 1)`, `d = (r + 1, c + 1)`.
/// Triangles are `(a, b, c)` and `(b, d, c)`.
fn quad_normals(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> [[f32; 3]; 2] {
    [unit(area_vector(a, b, c)), unit(area_vector(b, d, c))]
}

/// Heights of the `(divisions + 1)^2` sub-raster of cell `(i, j)`.
fn sub_raster(grid: &HeightGrid, i: usize, j: usize, divisions: usize) -> [[f64; 3]; 3] {
    let h00 = grid.at(i, j) as f64;
    let h10 = grid.at(i + 1, j) as f64;
    let h01 = grid.at(i, j + 1) as f64;
    let h11 = grid.at(i + 1, j + 1) as f64;
    let mut raster = [[0.0; 3]; 3];
    if divisions == 1 {
        raster[0][0] = h00;
        raster[1][0] = h10;
        raster[0][1] = h01;
        raster[1][1] = h11;
        return raster;
    }
    raster[0][0] = h00;
    raster[2][0] = h10;
    raster[0][2] = h01;
    raster[2][2] = h11;
    raster[1][0] = 0.5 * (h00 + h10);
    raster[0][1] = 0.5 * (h00 + h01);
    raster[2][1] = 0.5 * (h10 + h11);
    raster[1][2] = 0.5 * (h01 + h11);
    raster[1][1] = 0.25 * (h00 + h10 + h01 + h11);
    raster
}

/// Facet normals for one cell, written into `out` (shape `(facets, 3)`).
fn cell_normals(
    grid: &HeightGrid,
    i: usize,
    j: usize,
    scheme: NormalScheme,
    mut out: ndarray::ArrayViewMut2<f32>,
) {
    let divisions = scheme.divisions();
    let spacing = 1.0 / divisions as f64;
    let raster = sub_raster(grid, i, j, divisions);
    let vertex = |r: usize, c: usize| -> Vec3 {
        [
            i as f64 + r as f64 * spacing,
            raster[r][c],
            j as f64 + c as f64 * spacing,
        ]
    };

    let mut facet = 0;
    for r in 0..divisions {
        for c in 0..divisions {
            let pair = quad_normals(
                vertex(r, c),
                vertex(r + 1, c),
                vertex(r, c + 1),
                vertex(r + 1, c + 1),
            );
            for n in pair {
                out.row_mut(facet).assign(&ArrayView1::from(&n));
                facet += 1;
            }
        }
    }
}

/// Computes the facet normals of every interior cell.
///
/// Rows are processed in parallel; each cell only reads its own four corners,
/// so the result is identical between runs.
pub fn compute_normals(grid: &HeightGrid, scheme: NormalScheme) -> NormalGrid {
    let (cell_rows, cell_cols) = grid.cell_dim();
    let mut normals = Array4::<f32>::zeros((cell_rows, cell_cols, scheme.facets(), 3));

    normals
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            for (j, cell) in row.axis_iter_mut(Axis(0)).enumerate() {
                cell_normals(grid, i, j, scheme, cell);
            }
        });

    NormalGrid { scheme, normals }
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (heights, refined=true))]
/// Facet normals for a height grid (Python wrapper).
///
/// Returns an array of shape `(rows - 1, cols - 1, facets, 3)` where `facets`
/// is 8 for the refined scheme and 2 for the coarse scheme.
pub fn facet_normals(
    py: Python,
    heights: PyReadonlyArray2<f32>,
    refined: bool,
) -> PyResult<Py<PyArray4<f32>>> {
    let grid = HeightGrid::try_from(heights)?;
    let scheme = if refined {
        NormalScheme::Refined
    } else {
        NormalScheme::Coarse
    };
    Ok(compute_normals(&grid, scheme)
        .into_array()
        .into_pyarray(py)
        .unbind())
}
