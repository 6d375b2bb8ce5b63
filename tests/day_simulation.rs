use ndarray::Array2;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use sunshade::pipeline::hourly_illumination;
use sunshade::{
    cast_shadows, color_of, simulate_day, FixedEphemeris, HeightGrid, LowPrecisionEphemeris,
    SequenceSampler, ShadeError, SimulationConfig, SolarDirectionProvider, SolarPosition,
};

fn spike(size: usize, height: f32) -> HeightGrid {
    let centre = size / 2;
    HeightGrid::new(Array2::from_shape_fn((size, size), |(i, j)| {
        if i == centre && j == centre {
            height
        } else {
            0.0
        }
    }))
    .unwrap()
}

fn shaded_cells(mask: &sunshade::ShadowMask) -> Vec<(usize, usize)> {
    mask.view()
        .indexed_iter()
        .filter(|(_, &v)| v == 0)
        .map(|(ix, _)| ix)
        .collect()
}

#[test]
fn flat_ground_casts_no_shadow_and_is_degenerate() {
    let grid = HeightGrid::flat(30, 30, 7.0).unwrap();
    let config = SimulationConfig {
        sample_count: 900,
        seed: Some(1),
        ..Default::default()
    };
    let provider =
        SolarDirectionProvider::new(config.latitude_deg, config.longitude_deg, LowPrecisionEphemeris);
    let hours = hourly_illumination(
        &grid,
        &provider,
        &config.timestamps().unwrap(),
        config.sample_count,
        &mut SequenceSampler::exhaustive(30, 30),
    );
    for (timestamp, hour) in config.timestamps().unwrap().iter().zip(&hours) {
        if provider.position_at(*timestamp).is_above_horizon() {
            assert_eq!(hour.mask.shaded_count(), 0, "{timestamp}");
        }
    }

    let err = simulate_day(
        &grid,
        &config,
        LowPrecisionEphemeris,
        &mut SequenceSampler::exhaustive(30, 30),
    )
    .unwrap_err();
    assert!(matches!(err, ShadeError::DegenerateInput { .. }));
}

#[test]
fn overhead_sun_lights_everything_and_block_top_dominates() {
    // 3x3 raised block in the middle of 20x20 ground.
    let grid = HeightGrid::new(Array2::from_shape_fn((20, 20), |(i, j)| {
        if (9..=11).contains(&i) && (9..=11).contains(&j) {
            6.0
        } else {
            0.0
        }
    }))
    .unwrap();
    let config = SimulationConfig {
        hours: vec![12],
        sample_count: 400,
        ..Default::default()
    };
    let overhead = FixedEphemeris(SolarPosition {
        azimuth: 0.0,
        altitude: FRAC_PI_2,
    });
    let result = simulate_day(
        &grid,
        &config,
        overhead,
        &mut SequenceSampler::exhaustive(20, 20),
    )
    .unwrap();

    assert_eq!(result.hours[0].mask.shaded_count(), 0);
    for (i, j) in [(9, 9), (9, 10), (10, 9), (10, 10)] {
        for facet in 0..8 {
            assert!((result.shade.at(i, j, facet) - 1.0).abs() < 1e-12);
        }
    }
    // Flank cells between the ground and the block top lean sideways.
    for facet in 0..8 {
        assert!(result.shade.at(8, 9, facet) < 1.0);
        assert!(result.shade.at(10, 11, facet) < 1.0);
    }
}

#[test]
fn low_sun_casts_long_trail_behind_spike() {
    let grid = spike(100, 10.0);
    let altitude = 0.5f64.atan();
    let position = SolarPosition {
        azimuth: FRAC_PI_2,
        altitude,
    };
    let mask = cast_shadows(&grid, position, 1, &mut SequenceSampler::new(vec![(50, 50)]));
    let cells = shaded_cells(&mask);

    // Sun in the east: the trail runs west (decreasing row) along column 50.
    let expected = 10.0 / altitude.tan();
    assert!((cells.len() as f64 - expected).abs() <= 1.0, "{} cells", cells.len());
    for &(i, j) in &cells {
        assert_eq!(j, 50);
        assert!((30..50).contains(&i), "row {i}");
    }
    assert!(mask.is_lit(50, 50));
    assert!(mask.is_lit(51, 50));
}

#[test]
fn exhaustive_sampling_reproduces_single_spike_trail() {
    let grid = spike(100, 10.0);
    let position = SolarPosition {
        azimuth: FRAC_PI_2,
        altitude: 0.5f64.atan(),
    };
    let single = cast_shadows(&grid, position, 1, &mut SequenceSampler::new(vec![(50, 50)]));
    let all = cast_shadows(
        &grid,
        position,
        10_000,
        &mut SequenceSampler::exhaustive(100, 100),
    );
    assert_eq!(single, all);
}

#[test]
fn south_east_sun_casts_diagonal_trail() {
    let grid = spike(60, 8.0);
    let position = SolarPosition {
        azimuth: 3.0 * FRAC_PI_4,
        altitude: 0.5f64.atan(),
    };
    let mask = cast_shadows(&grid, position, 1, &mut SequenceSampler::new(vec![(30, 30)]));
    let cells = shaded_cells(&mask);
    assert!(cells.len() >= 15);
    for (i, j) in cells {
        assert_eq!(i, j);
        assert!(i < 30);
    }
}

#[test]
fn midpoint_colour_is_green_stop() {
    assert_eq!(color_of(0.5), [0.0, 1.0, 0.0]);
    assert_eq!(color_of(0.0), [0.0, 0.0, 1.0]);
    assert_eq!(color_of(1.0), [1.0, 0.0, 0.0]);
}
