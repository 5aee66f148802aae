use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::phenology::{
    gdd_from_extremes, in_chill_band, round1, utah_unit_rate, ChillModel, MAX_DAILY_CHILL_HOURS,
};
use crate::source::Reading;

/// Sparse day → value mapping for one sensor. `BTreeMap` keeps days ascending.
pub type DailySeries = BTreeMap<NaiveDate, f64>;

/// Daily GDD for one sensor. Days without any temperature are absent.
pub fn daily_gdd(readings: &[Reading], base_temp: f64) -> DailySeries {
    let mut extremes: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for reading in readings {
        let Some(temp) = reading.temperature else {
            continue;
        };
        extremes
            .entry(reading.timestamp.date())
            .and_modify(|(tmin, tmax)| {
                *tmin = tmin.min(temp);
                *tmax = tmax.max(temp);
            })
            .or_insert((temp, temp));
    }

    extremes
        .into_iter()
        .map(|(day, (tmin, tmax))| (day, gdd_from_extremes(tmin, tmax, base_temp)))
        .collect()
}

/// Daily chill for one sensor under `model`.
pub fn daily_chill(readings: &[Reading], model: &ChillModel) -> DailySeries {
    match *model {
        ChillModel::Fixed { sample_minutes } => {
            let per_reading_hours = sample_minutes / 60.0;
            per_day(readings, |temp| {
                if in_chill_band(temp) {
                    per_reading_hours
                } else {
                    0.0
                }
            })
            .into_iter()
            .map(|(day, hours)| (day, round1(hours)))
            .collect()
        }
        ChillModel::Delta { max_gap_minutes } => delta_chill(readings, max_gap_minutes * 60.0),
        ChillModel::Utah {
            sample_minutes,
            allow_negative,
        } => {
            let per_reading_hours = sample_minutes / 60.0;
            per_day(readings, |temp| utah_unit_rate(temp) * per_reading_hours)
                .into_iter()
                .map(|(day, units)| {
                    let units = if allow_negative { units } else { units.max(0.0) };
                    (day, round1(units))
                })
                .collect()
        }
    }
}

/// Sum a per-reading contribution into days.
fn per_day<F>(readings: &[Reading], contribution: F) -> BTreeMap<NaiveDate, f64>
where
    F: Fn(f64) -> f64,
{
    let mut days = BTreeMap::new();
    for reading in readings {
        if let Some(temp) = reading.temperature {
            *days.entry(reading.timestamp.date()).or_insert(0.0) += contribution(temp);
        }
    }
    days
}

fn delta_chill(readings: &[Reading], max_gap_seconds: f64) -> DailySeries {
    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    let mut seconds: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut previous: Option<&Reading> = None;

    for reading in ordered {
        if let Some(temp) = reading.temperature {
            let credited = match previous {
                Some(prev) if in_chill_band(temp) => {
                    let delta = (reading.timestamp - prev.timestamp).num_seconds() as f64;
                    delta.max(0.0).min(max_gap_seconds)
                }
                _ => 0.0,
            };
            *seconds.entry(reading.timestamp.date()).or_insert(0.0) += credited;
        }
        previous = Some(reading);
    }

    seconds
        .into_iter()
        .map(|(day, secs)| {
            let hours = (secs / 3600.0).clamp(0.0, MAX_DAILY_CHILL_HOURS);
            (day, round1(hours))
        })
        .collect()
}

/// Readings that carry a temperature.
pub fn data_points(readings: &[Reading]) -> usize {
    readings.iter().filter(|r| r.temperature.is_some()).count()
}
