//! Full-day shading run.
//!
//! Orchestrates: normals → per-hour sun position and shadow mask → irradiance
//! accumulation → normalization. Masks are drawn one hour after another from
//! the same sampler so a seeded run is reproducible; the ray tracing inside
//! each hour and the hourly partial sums run in parallel.

use ndarray::Array4;

#[cfg(feature = "python")]
use ndarray::{Array3, ArrayView2, Axis};
#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray3, PyArray4, PyReadonlyArray2};
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::colormap::colorize;
use crate::config::SimulationConfig;
use crate::error::ShadeResult;
use crate::grid::HeightGrid;
use crate::irradiance::{accumulate_normalized, HourlyIllumination, ShadeGrid};
use crate::sampling::{CellSampler, UniformSampler};
use crate::shadowing::cast_shadows;
use crate::sun::{fractional_hour, to_vector, Ephemeris, SolarDirectionProvider};
use crate::surface::{compute_normals, NormalGrid};

/// Output of [`simulate_day`].
#[derive(Debug, Clone)]
pub struct ShadingResult {
    pub normals: NormalGrid,
    /// Normalized to [0, 1].
    pub shade: ShadeGrid,
    /// Sun vector and shadow mask of every simulated hour, in order.
    pub hours: Vec<HourlyIllumination>,
}

impl ShadingResult {
    pub fn colors(&self) -> Array4<f32> {
        colorize(&self.shade)
    }
}

/// Sun direction and shadow mask for each timestamp.
pub fn hourly_illumination<E: Ephemeris, S: CellSampler + ?Sized>(
    grid: &HeightGrid,
    provider: &SolarDirectionProvider<E>,
    timestamps: &[chrono::NaiveDateTime],
    sample_count: usize,
    sampler: &mut S,
) -> Vec<HourlyIllumination> {
    timestamps
        .iter()
        .map(|&timestamp| {
            let position = provider.position_at(timestamp);
            let mask = cast_shadows(grid, position, sample_count, sampler);
            log::debug!(
                "{timestamp}: azimuth {:.3} rad, altitude {:.3} rad, {:.1}% shaded",
                position.azimuth,
                position.altitude,
                100.0 * mask.shaded_fraction()
            );
            HourlyIllumination {
                hour: fractional_hour(timestamp),
                direction: to_vector(position.azimuth, position.altitude),
                mask,
            }
        })
        .collect()
}

/// Simulates the configured day over `grid`.
///
/// Fails with [`crate::ShadeError::DegenerateInput`] when every facet ends up
/// with the same total, e.g. on perfectly flat ground.
pub fn simulate_day<E: Ephemeris, S: CellSampler + ?Sized>(
    grid: &HeightGrid,
    config: &SimulationConfig,
    ephemeris: E,
    sampler: &mut S,
) -> ShadeResult<ShadingResult> {
    config.validate()?;
    let (rows, cols) = grid.dim();
    log::info!(
        "simulating {} hours over {}x{} grid ({:?} facets, {} rays per hour)",
        config.hours.len(),
        rows,
        cols,
        config.scheme(),
        config.sample_count
    );

    let normals = compute_normals(grid, config.scheme());
    let provider = SolarDirectionProvider::new(config.latitude_deg, config.longitude_deg, ephemeris);
    let timestamps = config.timestamps()?;
    let hours = hourly_illumination(grid, &provider, &timestamps, config.sample_count, sampler);
    let shade = accumulate_normalized(&normals, &hours, config.weights())?;

    log::info!("shading complete");
    Ok(ShadingResult {
        normals,
        shade,
        hours,
    })
}

/// [`simulate_day`] with a uniform sampler seeded from `config.seed`.
pub fn simulate_day_seeded<E: Ephemeris>(
    grid: &HeightGrid,
    config: &SimulationConfig,
    ephemeris: E,
) -> ShadeResult<ShadingResult> {
    let mut sampler = UniformSampler::new(config.seed);
    simulate_day(grid, config, ephemeris, &mut sampler)
}

#[cfg(feature = "python")]
#[pyclass]
/// Arrays produced by a full-day run (Python version).
pub struct DayShadingResult {
    #[pyo3(get)]
    /// Facet normals, shape (rows - 1, cols - 1, facets, 3).
    pub normals: Py<PyArray4<f32>>,
    #[pyo3(get)]
    /// Normalized shade, shape (rows - 1, cols - 1, facets).
    pub shade: Py<PyArray3<f64>>,
    #[pyo3(get)]
    /// RGB per facet, shape (rows - 1, cols - 1, facets, 3).
    pub colors: Py<PyArray4<f32>>,
    #[pyo3(get)]
    /// Shadow masks, shape (hours, rows, cols).
    pub masks: Py<PyArray3<u8>>,
}

#[cfg(feature = "python")]
#[pyfunction]
/// Runs the full-day simulation with the built-in ephemeris (Python wrapper).
pub fn simulate(
    py: Python,
    heights: PyReadonlyArray2<f32>,
    config: SimulationConfig,
) -> PyResult<DayShadingResult> {
    let grid = HeightGrid::try_from(heights)?;
    let result = py.allow_threads(|| {
        simulate_day_seeded(&grid, &config, crate::sun::LowPrecisionEphemeris)
    })?;

    let colors = result.colors();
    let views: Vec<ArrayView2<u8>> = result.hours.iter().map(|h| h.mask.view()).collect();
    let masks: Array3<u8> = ndarray::stack(Axis(0), &views)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;

    Ok(DayShadingResult {
        normals: result.normals.into_array().into_pyarray(py).unbind(),
        shade: result.shade.into_array().into_pyarray(py).unbind(),
        colors: colors.into_pyarray(py).unbind(),
        masks: masks.into_pyarray(py).unbind(),
    })
}
