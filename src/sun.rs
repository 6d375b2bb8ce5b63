//! Solar position and sun direction vectors.
//!
//! Angles are radians: azimuth clockwise from north, altitude above the
//! horizon. Direction vectors use x = east, y = up, z = south, matching the
//! vertex layout of [`crate::surface`].

use chrono::{NaiveDateTime, Timelike};

#[cfg(feature = "python")]
use pyo3::prelude::*;

const TAU: f64 = std::f64::consts::TAU;
const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

impl SolarPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }
}

/// Source of apparent solar positions for an observer.
pub trait Ephemeris: Send + Sync {
    /// Latitude/longitude in degrees (north and east positive), timestamp in UTC.
    fn solar_position(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        timestamp: NaiveDateTime,
    ) -> SolarPosition;
}

/// Analytic low-precision solar ephemeris (mean elements referred to J2000).
///
/// Good to a few hundredths of a degree between 1950 and 2050, which is far
/// below the resolution of an hourly shading run. No refraction correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowPrecisionEphemeris;

impl Ephemeris for LowPrecisionEphemeris {
    fn solar_position(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        timestamp: NaiveDateTime,
    ) -> SolarPosition {
        let utc = timestamp.and_utc();
        let unix_seconds =
            utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 * 1e-9;
        let n = unix_seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD - J2000_JD;

        let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
        let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
        let ecliptic_longitude = (mean_longitude
            + 1.915 * mean_anomaly.sin()
            + 0.020 * (2.0 * mean_anomaly).sin())
        .to_radians();
        let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

        let right_ascension = (obliquity.cos() * ecliptic_longitude.sin())
            .atan2(ecliptic_longitude.cos());
        let declination = (obliquity.sin() * ecliptic_longitude.sin()).asin();

        let gmst = (280.460_618_37 + 360.985_647_366_29 * n).rem_euclid(360.0);
        let hour_angle = (gmst + longitude_deg).to_radians() - right_ascension;

        let lat = latitude_deg.to_radians();
        let sin_alt =
            lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
        let altitude = sin_alt.clamp(-1.0, 1.0).asin();

        let azimuth = (-declination.cos() * hour_angle.sin())
            .atan2(declination.sin() * lat.cos() - declination.cos() * hour_angle.cos() * lat.sin())
            .rem_euclid(TAU);

        SolarPosition { azimuth, altitude }
    }
}

/// Ephemeris that always reports the same position. Useful for replaying
/// measured sun angles or for pinning the sun in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedEphemeris(pub SolarPosition);

impl Ephemeris for FixedEphemeris {
    fn solar_position(&self, _: f64, _: f64, _: NaiveDateTime) -> SolarPosition {
        self.0
    }
}

/// Sun directions for one observer location.
#[derive(Debug, Clone)]
pub struct SolarDirectionProvider<E> {
    latitude_deg: f64,
    longitude_deg: f64,
    ephemeris: E,
}

impl<E: Ephemeris> SolarDirectionProvider<E> {
    pub fn new(latitude_deg: f64, longitude_deg: f64, ephemeris: E) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            ephemeris,
        }
    }

    pub fn position_at(&self, timestamp: NaiveDateTime) -> SolarPosition {
        self.ephemeris
            .solar_position(self.latitude_deg, self.longitude_deg, timestamp)
    }

    /// Unit vector pointing at the sun.
    pub fn direction_at(&self, timestamp: NaiveDateTime) -> [f64; 3] {
        let position = self.position_at(timestamp);
        to_vector(position.azimuth, position.altitude)
    }

    /// Sun direction scaled by the daily envelope for the timestamp's hour.
    pub fn irradiance_at(&self, timestamp: NaiveDateTime) -> [f64; 3] {
        irradiance_scale(self.direction_at(timestamp), fractional_hour(timestamp))
    }
}

pub fn to_vector(azimuth: f64, altitude: f64) -> [f64; 3] {
    let (sin_az, cos_az) = azimuth.sin_cos();
    let (sin_alt, cos_alt) = altitude.sin_cos();
    [cos_alt * sin_az, sin_alt, -cos_alt * cos_az]
}

/// Heuristic intensity over the day: 0 at midnight, 1 at noon.
pub fn daily_envelope(hour: f64) -> f64 {
    0.5 * (1.0 - (TAU * hour / 24.0).cos())
}

pub fn irradiance_scale(vector: [f64; 3], hour: f64) -> [f64; 3] {
    let k = daily_envelope(hour);
    [vector[0] * k, vector[1] * k, vector[2] * k]
}

pub fn fractional_hour(timestamp: NaiveDateTime) -> f64 {
    timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0 + timestamp.second() as f64 / 3600.0
}

pub(crate) fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
}

#[cfg(feature = "python")]
#[pyfunction]
/// Sun azimuth, altitude (radians) and unit direction for a UTC timestamp
/// formatted as `YYYY-MM-DDTHH:MM:SS`, using the built-in ephemeris.
pub fn sun_position(
    latitude_deg: f64,
    longitude_deg: f64,
    timestamp: &str,
) -> PyResult<(f64, f64, [f64; 3])> {
    let timestamp = parse_timestamp(timestamp)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
    let provider = SolarDirectionProvider::new(latitude_deg, longitude_deg, LowPrecisionEphemeris);
    let position = provider.position_at(timestamp);
    Ok((
        position.azimuth,
        position.altitude,
        to_vector(position.azimuth, position.altitude),
    ))
}
