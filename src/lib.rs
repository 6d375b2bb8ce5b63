#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod colormap;
pub mod config;
pub mod error;
pub mod grid;
pub mod irradiance;
pub mod pipeline;
pub mod sampling;
pub mod shadowing;
pub mod sun;
pub mod surface;

pub use colormap::{color_of, colorize, Rgb};
pub use config::SimulationConfig;
pub use error::{ShadeError, ShadeResult};
pub use grid::HeightGrid;
pub use irradiance::{
    accumulate, accumulate_normalized, shade_single_hour, HourlyIllumination,
    IrradianceAccumulator, IrradianceWeights, ShadeGrid,
};
pub use pipeline::{simulate_day, simulate_day_seeded, ShadingResult};
pub use sampling::{CellSampler, SequenceSampler, UniformSampler};
pub use shadowing::{cast_shadows, cast_shadows_at, ShadowMask, StepDirection};
pub use sun::{
    Ephemeris, FixedEphemeris, LowPrecisionEphemeris, SolarDirectionProvider, SolarPosition,
};
pub use surface::{compute_normals, NormalGrid, NormalScheme};

#[cfg(feature = "python")]
#[pymodule]
fn sunshade(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    py_module.add_class::<config::SimulationConfig>()?;

    register_surface_module(py_module)?;
    register_sun_module(py_module)?;
    register_shadowing_module(py_module)?;
    register_irradiance_module(py_module)?;
    register_colormap_module(py_module)?;
    register_pipeline_module(py_module)?;

    py_module.add(
        "__doc__",
        "Daily sun and shadow shading of elevation grids implemented in Rust.",
    )?;

    Ok(())
}

#[cfg(feature = "python")]
fn register_surface_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "surface")?;
    submodule.add("__doc__", "Facet normals of a height grid.")?;
    submodule.add_function(wrap_pyfunction!(surface::facet_normals, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_sun_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "sun")?;
    submodule.add("__doc__", "Solar position and direction.")?;
    submodule.add_function(wrap_pyfunction!(sun::sun_position, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_shadowing_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "shadowing")?;
    submodule.add("__doc__", "Monte Carlo shadow masks.")?;
    submodule.add_function(wrap_pyfunction!(shadowing::shadow_mask, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_irradiance_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "irradiance")?;
    submodule.add("__doc__", "Facet irradiance.")?;
    submodule.add_function(wrap_pyfunction!(irradiance::single_hour_shade, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_colormap_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "colormap")?;
    submodule.add("__doc__", "Shade to RGB mapping.")?;
    submodule.add_function(wrap_pyfunction!(colormap::shade_colors, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_pipeline_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "pipeline")?;
    submodule.add("__doc__", "Full-day shading run.")?;
    submodule.add_class::<pipeline::DayShadingResult>()?;
    submodule.add_function(wrap_pyfunction!(pipeline::simulate, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}
