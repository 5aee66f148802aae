use chrono::NaiveDate;
use serde::Serialize;

use crate::merge::DailyPoint;
use crate::phenology::round1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub threshold: f64,
    pub reached: bool,
    pub date: Option<NaiveDate>,
}

/// Headline figures for one index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: f64,
    /// Mean of each valid sensor's own total
    pub average: f64,
    pub sensor_count: usize,
    pub target: f64,
    pub remaining: f64,
    pub milestones: Vec<Milestone>,
    pub today: Option<DailyPoint>,
}

/// First day on which the cumulative value reaches `threshold`.
pub fn first_crossing(points: &[DailyPoint], threshold: f64) -> Milestone {
    let date = points
        .iter()
        .find(|p| p.cumulative >= threshold)
        .map(|p| p.date);

    Milestone {
        threshold,
        reached: date.is_some(),
        date,
    }
}

/// The entry dated today, otherwise the latest one.
pub fn today_point(points: &[DailyPoint], today: NaiveDate) -> Option<&DailyPoint> {
    points
        .iter()
        .find(|p| p.date == today)
        .or_else(|| points.last())
}

pub fn remaining_to(target: f64, total: f64) -> f64 {
    round1((target - total).max(0.0))
}

pub fn summarize(
    points: &[DailyPoint],
    sensor_totals: &[f64],
    target: f64,
    thresholds: &[f64],
    today: NaiveDate,
) -> Summary {
    let total = points.last().map(|p| p.cumulative).unwrap_or(0.0);
    let average = if sensor_totals.is_empty() {
        0.0
    } else {
        round1(sensor_totals.iter().sum::<f64>() / sensor_totals.len() as f64)
    };

    Summary {
        total,
        average,
        sensor_count: sensor_totals.len(),
        target,
        remaining: remaining_to(target, total),
        milestones: thresholds
            .iter()
            .map(|&threshold| first_crossing(points, threshold))
            .collect(),
        today: today_point(points, today).cloned(),
    }
}
