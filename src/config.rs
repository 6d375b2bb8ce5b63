use chrono::{NaiveDate, NaiveDateTime};

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::error::{ShadeError, ShadeResult};
use crate::irradiance::IrradianceWeights;
use crate::surface::NormalScheme;

/// Settings for one simulated day (constant across hours).
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Observer latitude, degrees north.
    pub latitude_deg: f64,
    /// Observer longitude, degrees east.
    pub longitude_deg: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// UTC hours sampled over the day.
    pub hours: Vec<u32>,
    /// Shadow rays per hour.
    pub sample_count: usize,
    pub seed: Option<u64>,
    /// Eight facets per cell when set, two otherwise.
    pub refined: bool,
    pub direct_weight: f64,
    pub diffuse_weight: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latitude_deg: 51.75,
            longitude_deg: -1.25,
            year: 2014,
            month: 3,
            day: 8,
            hours: (0..24).collect(),
            sample_count: 9999,
            seed: None,
            refined: true,
            direct_weight: 0.85,
            diffuse_weight: 0.15,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> ShadeResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(ShadeError::invalid_config(format!(
                "latitude {} outside [-90, 90]",
                self.latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude_deg) {
            return Err(ShadeError::invalid_config(format!(
                "longitude {} outside [-180, 180]",
                self.longitude_deg
            )));
        }
        self.date()?;
        if self.hours.is_empty() {
            return Err(ShadeError::invalid_config("no hours to simulate"));
        }
        if let Some(hour) = self.hours.iter().find(|&&h| h >= 24) {
            return Err(ShadeError::invalid_config(format!("hour {hour} outside 0..24")));
        }
        if self.sample_count == 0 {
            return Err(ShadeError::invalid_config("sample_count must be positive"));
        }
        for (name, weight) in [
            ("direct_weight", self.direct_weight),
            ("diffuse_weight", self.diffuse_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ShadeError::invalid_config(format!(
                    "{name} must be finite and non-negative, got {weight}"
                )));
            }
        }
        Ok(())
    }

    pub fn date(&self) -> ShadeResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            ShadeError::invalid_config(format!(
                "{}-{:02}-{:02} is not a calendar date",
                self.year, self.month, self.day
            ))
        })
    }

    /// One UTC timestamp per configured hour, on the hour.
    pub fn timestamps(&self) -> ShadeResult<Vec<NaiveDateTime>> {
        let date = self.date()?;
        self.hours
            .iter()
            .map(|&hour| {
                date.and_hms_opt(hour, 0, 0)
                    .ok_or_else(|| ShadeError::invalid_config(format!("hour {hour} outside 0..24")))
            })
            .collect()
    }

    pub fn scheme(&self) -> NormalScheme {
        if self.refined {
            NormalScheme::Refined
        } else {
            NormalScheme::Coarse
        }
    }

    pub fn weights(&self) -> IrradianceWeights {
        IrradianceWeights {
            direct: self.direct_weight,
            diffuse: self.diffuse_weight,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl SimulationConfig {
    #[new]
    pub fn py_new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timestamps().unwrap().len(), 24);
        assert_eq!(config.scheme(), NormalScheme::Refined);
        assert_eq!(config.weights(), IrradianceWeights::default());
    }

    #[test]
    fn test_rejects_bad_date() {
        let config = SimulationConfig {
            month: 2,
            day: 30,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShadeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            SimulationConfig {
                latitude_deg: 91.0,
                ..Default::default()
            },
            SimulationConfig {
                longitude_deg: f64::NAN,
                ..Default::default()
            },
            SimulationConfig {
                hours: vec![3, 24],
                ..Default::default()
            },
            SimulationConfig {
                hours: vec![],
                ..Default::default()
            },
            SimulationConfig {
                sample_count: 0,
                ..Default::default()
            },
            SimulationConfig {
                diffuse_weight: -0.1,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_timestamps_follow_hours() {
        let config = SimulationConfig {
            hours: vec![6, 12, 18],
            ..Default::default()
        };
        let stamps = config.timestamps().unwrap();
        assert_eq!(stamps[1].to_string(), "2014-03-08 12:00:00");
    }
}
