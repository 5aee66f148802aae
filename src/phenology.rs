//! Chill and heat accumulation models.
//!
//! Everything here is pure: a temperature (or a day's extremes) goes in and a
//! contribution comes out. Daily bucketing lives in `aggregate`.

use serde::Serialize;

/// Lower bound of the chill-hours threshold band, °C (inclusive)
pub const CHILL_BAND_MIN_C: f64 = 0.0;
/// Upper bound of the chill-hours threshold band, °C (inclusive)
pub const CHILL_BAND_MAX_C: f64 = 7.2;

pub const MAX_DAILY_CHILL_HOURS: f64 = 24.0;

/// Utah model bands: (upper bound exclusive, chill units per hour)
const UTAH_BANDS: [(f64, f64); 6] = [
    (1.4, 0.0),
    (2.4, 0.5),
    (9.1, 1.0),
    (12.4, 0.5),
    (15.9, 0.0),
    (18.0, -0.5),
];
const UTAH_ABOVE_MAX: f64 = -1.0;

/// One decimal, the precision every surfaced number uses. Never `-0.0`.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn in_chill_band(temp_c: f64) -> bool {
    (CHILL_BAND_MIN_C..=CHILL_BAND_MAX_C).contains(&temp_c)
}

/// Instantaneous Utah chill units per hour for a temperature.
pub fn utah_unit_rate(temp_c: f64) -> f64 {
    UTAH_BANDS
        .iter()
        .find(|(upper, _)| temp_c < *upper)
        .map(|(_, rate)| *rate)
        .unwrap_or(UTAH_ABOVE_MAX)
}

/// Average-of-extremes degree days for one day, never negative.
pub fn gdd_from_extremes(tmin: f64, tmax: f64, base_temp: f64) -> f64 {
    round1(((tmin + tmax) / 2.0 - base_temp).max(0.0))
}

/// Chill accumulation model with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChillModel {
    /// Every in-band reading counts as `sample_minutes` of chill
    Fixed { sample_minutes: f64 },
    /// In-band readings count the real time since the previous reading,
    /// capped at `max_gap_minutes`
    Delta { max_gap_minutes: f64 },
    /// Utah chill units, `sample_minutes` per reading
    Utah {
        sample_minutes: f64,
        allow_negative: bool,
    },
}

impl ChillModel {
    pub fn id(&self) -> &'static str {
        match self {
            ChillModel::Fixed { .. } => "chill_hours_0_7.2_fixed",
            ChillModel::Delta { .. } => "chill_hours_0_7.2_delta",
            ChillModel::Utah { .. } => "utah_chill_units",
        }
    }

    /// Hours for the threshold models, units for Utah.
    pub fn is_units(&self) -> bool {
        matches!(self, ChillModel::Utah { .. })
    }

    pub fn sampling(&self) -> Sampling {
        match *self {
            ChillModel::Fixed { sample_minutes } => Sampling {
                mode: "fixed",
                sample_minutes: Some(sample_minutes),
                max_gap_minutes: None,
                note: format!(
                    "Each reading in [{}, {}] °C counts {} min",
                    CHILL_BAND_MIN_C, CHILL_BAND_MAX_C, sample_minutes
                ),
            },
            ChillModel::Delta { max_gap_minutes } => Sampling {
                mode: "delta",
                sample_minutes: None,
                max_gap_minutes: Some(max_gap_minutes),
                note: format!(
                    "Elapsed time since the previous reading, capped at {} min per reading",
                    max_gap_minutes
                ),
            },
            ChillModel::Utah {
                sample_minutes,
                allow_negative,
            } => Sampling {
                mode: "utah",
                sample_minutes: Some(sample_minutes),
                max_gap_minutes: None,
                note: if allow_negative {
                    format!("Utah units, {} min per reading, negative days kept", sample_minutes)
                } else {
                    format!("Utah units, {} min per reading, negative days clamped to 0", sample_minutes)
                },
            },
        }
    }
}

/// How readings were turned into time, reported alongside the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampling {
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gap_minutes: Option<f64>,
    pub note: String,
}
