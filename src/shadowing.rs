//! Monte Carlo shadow casting over a height grid.
//!
//! Random cells are drawn from the grid and a ray is marched from each one
//! along the anti-solar direction, losing `tan(altitude)` of height per step.
//! Every cell the ray passes above is marked as shaded. A mask entry is 1
//! when the cell is unshaded and 0 when something stands between it and the
//! sun.

use ndarray::{Array2, ArrayView2, Zip};
use rayon::prelude::*;

#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
#[cfg(feature = "python")]
use pyo3::prelude::*;

use chrono::NaiveDateTime;

use crate::grid::HeightGrid;
use crate::sampling::CellSampler;
use crate::sun::{Ephemeris, SolarDirectionProvider, SolarPosition};

const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;

/// Binary occlusion state of every grid cell for one sun position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowMask {
    mask: Array2<u8>,
}

impl ShadowMask {
    pub fn all_shadow(dim: (usize, usize)) -> Self {
        Self {
            mask: Array2::zeros(dim),
        }
    }

    pub fn all_lit(dim: (usize, usize)) -> Self {
        Self {
            mask: Array2::ones(dim),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.mask.dim()
    }

    #[inline]
    pub fn is_lit(&self, row: usize, col: usize) -> bool {
        self.mask[[row, col]] == 1
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.mask.view()
    }

    pub fn shaded_count(&self) -> usize {
        self.mask.iter().filter(|&&v| v == 0).count()
    }

    pub fn shaded_fraction(&self) -> f64 {
        self.shaded_count() as f64 / self.mask.len() as f64
    }

    /// Mask scaled to 0/255 grey levels for previews.
    pub fn to_image_levels(&self) -> Array2<u8> {
        self.mask.mapv(|v| v * u8::MAX)
    }

    pub fn into_array(self) -> Array2<u8> {
        self.mask
    }
}

/// Per-step horizontal displacement in `(row, col)` grid units.
///
/// The anti-solar direction is `(-sin az, cos az)`. The dominant axis always
/// advances by exactly one cell; the minor axis by the ratio of components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDirection {
    pub di: f64,
    pub dj: f64,
}

impl StepDirection {
    pub fn from_azimuth(azimuth: f64) -> Self {
        let (sin_az, cos_az) = azimuth.sin_cos();
        let (di, dj) = match (
            sin_az == 0.0,
            cos_az == 0.0,
            sin_az.abs() >= cos_az.abs(),
        ) {
            // Sun due north or south.
            (true, _, _) => (0.0, cos_az.signum()),
            // Sun due east or west.
            (false, true, _) => (-sin_az.signum(), 0.0),
            // Rows dominate.
            (false, false, true) => (-sin_az.signum(), cos_az / sin_az.abs()),
            // Columns dominate.
            (false, false, false) => (-sin_az / cos_az.abs(), cos_az.signum()),
        };
        Self { di, dj }
    }
}

/// Marches one shadow ray from `origin`, clearing mask entries it passes above.
fn trace_ray(
    grid: &HeightGrid,
    origin: (usize, usize),
    step: StepDirection,
    alt_step: f64,
    mask: &mut Array2<u8>,
) {
    let ground = grid.ground() as f64;
    let mut height = grid.at(origin.0, origin.1) as f64;
    let mut x = origin.0 as f64;
    let mut y = origin.1 as f64;

    while height > ground {
        height -= alt_step;
        x += step.di;
        y += step.dj;
        let (row, col) = (x.round() as isize, y.round() as isize);
        match grid.get(row, col) {
            Some(cell_height) => {
                if height > ground && height > cell_height as f64 {
                    mask[[row as usize, col as usize]] = 0;
                }
            }
            // The step is constant, so a ray that has left the grid never re-enters it.
            None => break,
        }
    }
}

fn merge_min(mut a: Array2<u8>, b: Array2<u8>) -> Array2<u8> {
    Zip::from(&mut a).and(&b).for_each(|x, &y| *x = (*x).min(y));
    a
}

/// Shadow mask for a sun position from `sample_count` random rays.
///
/// A sun at or below the horizon shades everything; a sun at the zenith
/// shades nothing. Neither case draws from `sampler`.
pub fn cast_shadows<S: CellSampler + ?Sized>(
    grid: &HeightGrid,
    position: SolarPosition,
    sample_count: usize,
    sampler: &mut S,
) -> ShadowMask {
    let dim = grid.dim();
    if !position.is_above_horizon() {
        log::debug!(
            "sun below horizon (altitude {:.4} rad), whole grid shaded",
            position.altitude
        );
        return ShadowMask::all_shadow(dim);
    }
    if position.altitude >= FRAC_PI_2 {
        log::debug!("sun at zenith, no lateral shadows");
        return ShadowMask::all_lit(dim);
    }

    let step = StepDirection::from_azimuth(position.azimuth);
    let alt_step = position.altitude.tan();
    let samples = sampler.draw(dim.0, dim.1, sample_count);

    let mask = samples
        .par_iter()
        .fold(
            || Array2::<u8>::ones(dim),
            |mut mask, &origin| {
                trace_ray(grid, origin, step, alt_step, &mut mask);
                mask
            },
        )
        .reduce(|| Array2::<u8>::ones(dim), merge_min);

    ShadowMask { mask }
}

/// [`cast_shadows`] for the sun position at `timestamp`.
pub fn cast_shadows_at<E: Ephemeris, S: CellSampler + ?Sized>(
    grid: &HeightGrid,
    provider: &SolarDirectionProvider<E>,
    timestamp: NaiveDateTime,
    sample_count: usize,
    sampler: &mut S,
) -> ShadowMask {
    cast_shadows(grid, provider.position_at(timestamp), sample_count, sampler)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (heights, azimuth, altitude, sample_count, seed=None))]
/// Shadow mask (1 = unshaded, 0 = shaded) for a sun position in radians (Python wrapper).
pub fn shadow_mask(
    py: Python,
    heights: PyReadonlyArray2<f32>,
    azimuth: f64,
    altitude: f64,
    sample_count: usize,
    seed: Option<u64>,
) -> PyResult<Py<PyArray2<u8>>> {
    let grid = HeightGrid::try_from(heights)?;
    let mut sampler = crate::sampling::UniformSampler::new(seed);
    let mask = py.allow_threads(|| {
        cast_shadows(
            &grid,
            SolarPosition { azimuth, altitude },
            sample_count,
            &mut sampler,
        )
    });
    Ok(mask.into_array().into_pyarray(py).unbind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{SequenceSampler, UniformSampler};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn east(altitude: f64) -> SolarPosition {
        SolarPosition {
            azimuth: FRAC_PI_2,
            altitude,
        }
    }

    /// 10x10 ground with a wall of height 2.5 along row 7.
    fn wall_grid() -> HeightGrid {
        HeightGrid::new(Array2::from_shape_fn((10, 10), |(i, _)| {
            if i == 7 {
                2.5
            } else {
                0.0
            }
        }))
        .unwrap()
    }

    fn rugged_grid() -> HeightGrid {
        HeightGrid::new(Array2::from_shape_fn((30, 30), |(i, j)| {
            ((i * 7 + j * 13) % 11) as f32 + if (10..14).contains(&i) && (10..14).contains(&j) {
                25.0
            } else {
                0.0
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_step_table_cardinals() {
        assert_eq!(
            StepDirection::from_azimuth(0.0),
            StepDirection { di: 0.0, dj: 1.0 }
        );
        let e = StepDirection::from_azimuth(FRAC_PI_2);
        assert_eq!(e.di, -1.0);
        assert!(e.dj.abs() < 1e-12);
        let s = StepDirection::from_azimuth(PI);
        assert_eq!(s.dj, -1.0);
        assert!(s.di.abs() < 1e-12);
        let w = StepDirection::from_azimuth(3.0 * FRAC_PI_2);
        assert_eq!(w.di, 1.0);
        assert!(w.dj.abs() < 1e-12);
    }

    #[test]
    fn test_step_table_dominant_axis_is_unit() {
        for k in 0..64 {
            let step = StepDirection::from_azimuth(k as f64 * 0.1);
            let major = step.di.abs().max(step.dj.abs());
            assert!((major - 1.0).abs() < 1e-12, "azimuth {}", k as f64 * 0.1);
            assert!(step.di.abs().min(step.dj.abs()) <= 1.0);
        }
    }

    #[test]
    fn test_step_points_away_from_sun() {
        // Sun in the south-east: shadows fall north-west (-i, -j).
        let step = StepDirection::from_azimuth(3.0 * FRAC_PI_4);
        assert!((step.di + 1.0).abs() < 1e-12);
        assert!((step.dj + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sub_horizon_is_all_shadow_without_sampling() {
        let grid = rugged_grid();
        let mut sampler = SequenceSampler::new(vec![(0, 0)]);
        for altitude in [0.0, -0.3] {
            let mask = cast_shadows(&grid, east(altitude), 500, &mut sampler);
            assert!(mask.view().iter().all(|&v| v == 0));
        }
        assert_eq!(sampler.drawn(), 0);
    }

    #[test]
    fn test_zenith_is_all_lit() {
        let grid = rugged_grid();
        let mut sampler = SequenceSampler::new(vec![(0, 0)]);
        let mask = cast_shadows(&grid, east(FRAC_PI_2), 500, &mut sampler);
        assert_eq!(mask.shaded_count(), 0);
        assert_eq!(sampler.drawn(), 0);
    }

    #[test]
    fn test_wall_shadow_is_exact() {
        let grid = wall_grid();
        let mut sampler = SequenceSampler::exhaustive(10, 10);
        let mask = cast_shadows(&grid, east(FRAC_PI_4), 100, &mut sampler);
        for ((i, _), &v) in mask.view().indexed_iter() {
            let expected = if i == 5 || i == 6 { 0 } else { 1 };
            assert_eq!(v, expected, "row {i}");
        }
    }

    #[test]
    fn test_flat_grid_casts_nothing() {
        let grid = HeightGrid::flat(20, 20, 4.0).unwrap();
        let mut sampler = SequenceSampler::exhaustive(20, 20);
        let mask = cast_shadows(&grid, east(0.05), 400, &mut sampler);
        assert_eq!(mask.shaded_count(), 0);
    }

    #[test]
    fn test_mask_is_binary() {
        let grid = rugged_grid();
        let mut sampler = UniformSampler::seeded(11);
        let position = SolarPosition {
            azimuth: 2.1,
            altitude: 0.35,
        };
        let mask = cast_shadows(&grid, position, 2000, &mut sampler);
        assert!(mask.view().iter().all(|&v| v == 0 || v == 1));
        assert!(mask.shaded_count() > 0);
    }

    #[test]
    fn test_random_mask_within_exhaustive_mask() {
        let grid = rugged_grid();
        let position = SolarPosition {
            azimuth: 4.0,
            altitude: 0.4,
        };
        let full = cast_shadows(&grid, position, 900, &mut SequenceSampler::exhaustive(30, 30));
        let few = cast_shadows(&grid, position, 300, &mut UniformSampler::seeded(5));
        let more = cast_shadows(&grid, position, 3000, &mut UniformSampler::seeded(5));
        assert!(few.shaded_count() <= more.shaded_count());
        Zip::from(&few.view())
            .and(&more.view())
            .and(&full.view())
            .for_each(|&a, &b, &c| {
                assert!(a >= b);
                assert!(b >= c);
            });
    }

    #[test]
    fn test_seeded_cast_is_reproducible() {
        let grid = rugged_grid();
        let position = SolarPosition {
            azimuth: 1.0,
            altitude: 0.25,
        };
        let a = cast_shadows(&grid, position, 1500, &mut UniformSampler::seeded(99));
        let b = cast_shadows(&grid, position, 1500, &mut UniformSampler::seeded(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_image_levels() {
        let grid = wall_grid();
        let mask = cast_shadows(
            &grid,
            east(FRAC_PI_4),
            100,
            &mut SequenceSampler::exhaustive(10, 10),
        );
        let levels = mask.to_image_levels();
        assert_eq!(levels[[6, 3]], 0);
        assert_eq!(levels[[0, 0]], 255);
        assert!((mask.shaded_fraction() - 0.2).abs() < 1e-12);
    }
}
