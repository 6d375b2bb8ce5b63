//! Piecewise-linear blue → cyan → green → yellow → red colormap.

use ndarray::{Array4, Axis, Zip};

#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray4, PyReadonlyArray3};
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::irradiance::ShadeGrid;

pub type Rgb = [f32; 3];

pub const BLUE: Rgb = [0.0, 0.0, 1.0];
pub const RED: Rgb = [1.0, 0.0, 0.0];

/// Distinct stops; the table repeats the last one.
const STOP_COUNT: usize = 5;

/// Red is repeated so `lower + 1` stays in range at the top stop.
const STOPS: [Rgb; STOP_COUNT + 1] = [
    BLUE,
    [0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    RED,
    RED,
];

/// Colour for a value in [0, 1]. Values outside the range (and NaN) are
/// clamped to the nearest end with a warning.
pub fn color_of(value: f64) -> Rgb {
    if value == 1.0 {
        return RED;
    }
    if value > 1.0 {
        log::warn!("shade value {value} above 1, clamped to red");
        return RED;
    }
    if value < 0.0 || value.is_nan() {
        log::warn!("shade value {value} below 0, clamped to blue");
        return BLUE;
    }

    let idx = value * (STOP_COUNT - 1) as f64;
    let lower = idx.floor() as usize;
    let f = (idx - lower as f64) as f32;
    let (a, b) = (STOPS[lower], STOPS[lower + 1]);
    [
        a[0] + (b[0] - a[0]) * f,
        a[1] + (b[1] - a[1]) * f,
        a[2] + (b[2] - a[2]) * f,
    ]
}

/// Colour of every facet, shape `(rows - 1, cols - 1, facets, 3)`.
pub fn colorize(shade: &ShadeGrid) -> Array4<f32> {
    let (rows, cols, facets) = shade.dim();
    let mut colors = Array4::<f32>::zeros((rows, cols, facets, 3));
    Zip::from(colors.lanes_mut(Axis(3)))
        .and(&shade.view())
        .par_for_each(|mut rgb, &value| {
            rgb.assign(&ndarray::ArrayView1::from(&color_of(value)));
        });
    colors
}

#[cfg(feature = "python")]
#[pyfunction]
/// RGB triple per facet for a normalized shade array (Python wrapper).
pub fn shade_colors(py: Python, shade: PyReadonlyArray3<f64>) -> Py<PyArray4<f32>> {
    let shade = ShadeGrid::from_array(shade.as_array().to_owned());
    colorize(&shade).into_pyarray(py).unbind()
}
