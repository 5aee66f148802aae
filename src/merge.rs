use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::DailySeries;
use crate::phenology::round1;

/// How sensors reporting on the same day are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Partial coverage on a day must not inflate the farm value
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub daily_value: f64,
    pub cumulative: f64,
}

/// Combine per-sensor series into one farm series keyed by day.
pub fn merge_series(series: &[DailySeries], strategy: MergeStrategy) -> DailySeries {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for sensor in series {
        for (day, value) in sensor {
            let bucket = buckets.entry(*day).or_insert((0.0, 0));
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(day, (sum, count))| {
            let value = match strategy {
                MergeStrategy::Mean => sum / count as f64,
                MergeStrategy::Sum => sum,
            };
            (day, round1(value))
        })
        .collect()
}

/// Running total in ascending day order, rounded at every step.
pub fn cumulative(daily: &DailySeries) -> Vec<DailyPoint> {
    let mut running = 0.0;
    daily
        .iter()
        .map(|(day, value)| {
            running = round1(running + value);
            DailyPoint {
                date: *day,
                daily_value: *value,
                cumulative: running,
            }
        })
        .collect()
}

/// Last cumulative value of a series, 0 when empty.
pub fn series_total(daily: &DailySeries) -> f64 {
    cumulative(daily).last().map(|p| p.cumulative).unwrap_or(0.0)
}
