use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::fmt;

use crate::config::{ChillMode, Config};
use crate::errors::ConfigError;
use crate::period::Period;
use crate::phenology::ChillModel;

const MAX_FARM_ID_LEN: usize = 63;

/// Validated farm identifier, safe to use as a schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FarmId(String);

impl FarmId {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let id = raw.trim();
        let valid = !id.is_empty()
            && id.len() <= MAX_FARM_ID_LEN
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(ConfigError::InvalidFarmId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query parameters as they arrive from the caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndexQuery {
    pub year: Option<String>,
    pub sensor: Option<String>,
    pub range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub bloom_date: Option<String>,
    pub base_temp: Option<String>,
    pub mode: Option<String>,
    pub sample_minutes: Option<String>,
    pub max_gap_minutes: Option<String>,
    pub allow_negative: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChillRequest {
    pub year: i32,
    pub sensor: Option<String>,
    pub custom: Option<Period>,
    pub model: ChillModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GddRequest {
    pub year: i32,
    pub sensor: Option<String>,
    pub custom: Option<Period>,
    pub bloom_start: Option<NaiveDate>,
    pub base_temp: f64,
}

impl RawIndexQuery {
    pub fn chill_request(&self, config: &Config, today: NaiveDate) -> Result<ChillRequest, ConfigError> {
        let custom = self.custom_range()?;
        let year = self.year(today)?;

        let mode = match non_empty(&self.mode) {
            Some(m) => m.parse::<ChillMode>().map_err(ConfigError::InvalidMode)?,
            None => config.chill.default_mode,
        };
        let sample_minutes = positive("sampleMinutes", &self.sample_minutes)?
            .unwrap_or(config.chill.sample_minutes);
        let max_gap_minutes = positive("maxGapMinutes", &self.max_gap_minutes)?
            .unwrap_or(config.chill.max_gap_minutes);
        let allow_negative = boolean("allowNegative", &self.allow_negative)?
            .unwrap_or(config.chill.allow_negative);

        let model = match mode {
            ChillMode::Fixed => ChillModel::Fixed { sample_minutes },
            ChillMode::Delta => ChillModel::Delta { max_gap_minutes },
            ChillMode::Utah => ChillModel::Utah { sample_minutes, allow_negative },
        };

        Ok(ChillRequest {
            year,
            sensor: self.sensor_filter(),
            custom,
            model,
        })
    }

    pub fn gdd_request(&self, config: &Config, today: NaiveDate) -> Result<GddRequest, ConfigError> {
        let custom = self.custom_range()?;
        // A custom range picks its own campaign unless a year is given
        let year = match (non_empty(&self.year), custom) {
            (None, Some(range)) => range.start.year(),
            _ => self.year(today)?,
        };

        let base_temp = finite("baseTemp", &self.base_temp)?.unwrap_or(config.gdd.base_temp);
        let bloom_start = non_empty(&self.bloom_date)
            .map(|d| parse_day("bloomDate", d))
            .transpose()?;

        Ok(GddRequest {
            year,
            sensor: self.sensor_filter(),
            custom,
            bloom_start,
            base_temp,
        })
    }

    fn year(&self, today: NaiveDate) -> Result<i32, ConfigError> {
        match non_empty(&self.year) {
            Some(y) => y
                .parse::<i32>()
                .ok()
                .filter(|y| (1900..=9999).contains(y))
                .ok_or_else(|| ConfigError::InvalidYear(y.to_string())),
            None => Ok(today.year()),
        }
    }

    fn sensor_filter(&self) -> Option<String> {
        non_empty(&self.sensor).map(String::from)
    }

    /// Dates are validated whenever present. Without `range`, a start and end
    /// pair is taken as a custom range.
    fn custom_range(&self) -> Result<Option<Period>, ConfigError> {
        let start = non_empty(&self.start_date)
            .map(|d| parse_day("startDate", d))
            .transpose()?;
        let end = non_empty(&self.end_date)
            .map(|d| parse_day("endDate", d))
            .transpose()?;

        let range = non_empty(&self.range).map(|r| r.to_lowercase());
        match range.as_deref() {
            Some("campaign") => Ok(None),
            None if start.is_none() && end.is_none() => Ok(None),
            None | Some("custom") => {
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(ConfigError::MissingCustomRange);
                };
                if start > end {
                    return Err(ConfigError::InvertedRange {
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
                Ok(Some(Period::new(start, end)))
            }
            Some(other) => Err(ConfigError::InvalidRange(other.to_string())),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Strict `YYYY-MM-DD`; chrono alone would accept `2026-1-5`.
pub fn parse_day(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    let invalid = || ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    };
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn finite(field: &'static str, value: &Option<String>) -> Result<Option<f64>, ConfigError> {
    non_empty(value)
        .map(|v| {
            v.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ConfigError::NonFinite {
                    field,
                    value: v.to_string(),
                })
        })
        .transpose()
}

fn positive(field: &'static str, value: &Option<String>) -> Result<Option<f64>, ConfigError> {
    match finite(field, value)? {
        Some(n) if n <= 0.0 => Err(ConfigError::NonPositive {
            field,
            value: n.to_string(),
        }),
        other => Ok(other),
    }
}

fn boolean(field: &'static str, value: &Option<String>) -> Result<Option<bool>, ConfigError> {
    non_empty(value)
        .map(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                field,
                value: v.to_string(),
            }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn raw() -> RawIndexQuery {
        RawIndexQuery::default()
    }

    #[test]
    fn test_farm_id_validation() {
        assert!(FarmId::parse("finca_01").is_ok());
        assert!(FarmId::parse("").is_err());
        assert!(FarmId::parse("farm; DROP TABLE").is_err());
        assert!(FarmId::parse(&"x".repeat(64)).is_err());
    }

    #[test]
    fn test_chill_defaults_from_config() {
        let request = raw().chill_request(&Config::default(), today()).unwrap();

        assert_eq!(request.year, 2026);
        assert_eq!(request.model, ChillModel::Delta { max_gap_minutes: 60.0 });
        assert!(request.custom.is_none());
    }

    #[test]
    fn test_chill_utah_parameters() {
        let query = RawIndexQuery {
            mode: Some("utah".into()),
            sample_minutes: Some("15".into()),
            allow_negative: Some("true".into()),
            ..raw()
        };

        let request = query.chill_request(&Config::default(), today()).unwrap();

        assert_eq!(
            request.model,
            ChillModel::Utah { sample_minutes: 15.0, allow_negative: true }
        );
    }

    #[test]
    fn test_invalid_dates_rejected() {
        for bad in ["2026-1-05", "05/01/2026", "2026-02-30", "tomorrow"] {
            let query = RawIndexQuery {
                range: Some("custom".into()),
                start_date: Some(bad.into()),
                end_date: Some("2026-05-31".into()),
                ..raw()
            };
            let err = query.chill_request(&Config::default(), today()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidDate { field: "startDate", .. }), "{}", bad);
        }
    }

    #[test]
    fn test_dates_validated_without_custom_range() {
        for range in [None, Some("campaign")] {
            let query = RawIndexQuery {
                range: range.map(String::from),
                start_date: Some("05/01/2026".into()),
                end_date: Some("garbage".into()),
                ..raw()
            };
            let err = query.gdd_request(&Config::default(), today()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidDate { .. }), "{:?}", range);
            assert!(err.is_client_error());
        }

        let query = RawIndexQuery {
            end_date: Some("2026-13-01".into()),
            ..raw()
        };
        assert!(matches!(
            query.chill_request(&Config::default(), today()),
            Err(ConfigError::InvalidDate { field: "endDate", .. })
        ));
    }

    #[test]
    fn test_dates_without_range_are_a_custom_range() {
        let query = RawIndexQuery {
            start_date: Some("2026-05-01".into()),
            end_date: Some("2026-05-31".into()),
            ..raw()
        };
        let request = query.gdd_request(&Config::default(), today()).unwrap();
        assert_eq!(
            request.custom,
            Some(Period::new(
                NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 5, 31).unwrap()
            ))
        );

        let query = RawIndexQuery {
            start_date: Some("2026-05-01".into()),
            ..raw()
        };
        assert_eq!(
            query.chill_request(&Config::default(), today()).unwrap_err(),
            ConfigError::MissingCustomRange
        );
    }

    #[test]
    fn test_campaign_range_ignores_valid_dates() {
        let query = RawIndexQuery {
            range: Some("campaign".into()),
            start_date: Some("2026-05-01".into()),
            end_date: Some("2026-05-31".into()),
            ..raw()
        };
        let request = query.gdd_request(&Config::default(), today()).unwrap();
        assert!(request.custom.is_none());
    }

    #[test]
    fn test_custom_range_requires_both_dates() {
        let query = RawIndexQuery {
            range: Some("custom".into()),
            start_date: Some("2026-05-01".into()),
            ..raw()
        };
        assert_eq!(
            query.gdd_request(&Config::default(), today()).unwrap_err(),
            ConfigError::MissingCustomRange
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = RawIndexQuery {
            range: Some("custom".into()),
            start_date: Some("2026-05-10".into()),
            end_date: Some("2026-05-01".into()),
            ..raw()
        };
        assert!(matches!(
            query.gdd_request(&Config::default(), today()),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_non_finite_base_temp_rejected() {
        for bad in ["NaN", "inf", "abc"] {
            let query = RawIndexQuery {
                base_temp: Some(bad.into()),
                ..raw()
            };
            let err = query.gdd_request(&Config::default(), today()).unwrap_err();
            assert!(matches!(err, ConfigError::NonFinite { field: "baseTemp", .. }));
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_gdd_custom_range_picks_campaign_year() {
        let query = RawIndexQuery {
            range: Some("custom".into()),
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-06-30".into()),
            base_temp: Some("7.2".into()),
            ..raw()
        };

        let request = query.gdd_request(&Config::default(), today()).unwrap();

        assert_eq!(request.year, 2024);
        assert_eq!(request.base_temp, 7.2);
    }

    #[test]
    fn test_invalid_mode_and_bool() {
        let query = RawIndexQuery {
            mode: Some("hourly".into()),
            ..raw()
        };
        assert!(matches!(
            query.chill_request(&Config::default(), today()),
            Err(ConfigError::InvalidMode(_))
        ));

        let query = RawIndexQuery {
            allow_negative: Some("maybe".into()),
            ..raw()
        };
        assert!(matches!(
            query.chill_request(&Config::default(), today()),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn test_non_positive_gap_rejected() {
        let query = RawIndexQuery {
            max_gap_minutes: Some("0".into()),
            ..raw()
        };
        assert!(matches!(
            query.chill_request(&Config::default(), today()),
            Err(ConfigError::NonPositive { field: "maxGapMinutes", .. })
        ));
    }
}
