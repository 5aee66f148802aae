use serde::Serialize;

use crate::merge::DailyPoint;
use crate::period::Period;
use crate::phenology::Sampling;
use crate::policy::SkipReason;
use crate::summary::Summary;

/// Per-sensor index value, serialized under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexValue {
    ChillHours(f64),
    ChillUnits(f64),
    Gdd(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorEntry {
    pub sensor: String,
    #[serde(flatten)]
    pub value: IndexValue,
    /// First and last day with data
    pub period: Option<Period>,
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_soil_sensor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_by_exception: Option<bool>,
}

impl SensorEntry {
    pub fn is_valid(&self) -> bool {
        self.skipped_reason.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub daily: Vec<DailyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub farm_id: String,
    pub period: Period,
    pub sensors: Vec<SensorEntry>,
    pub series: Series,
    pub summary: Summary,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Sampling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_temp: Option<f64>,
}

/// GDD is only computed inside its campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GddResponse {
    Ok(IndexReport),
    #[serde(rename_all = "camelCase")]
    OutOfCampaign {
        farm_id: String,
        campaign: Period,
        message: String,
    },
}
