use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::aggregate::{daily_chill, daily_gdd, data_points, DailySeries};
use crate::columns::classify_columns;
use crate::config::Config;
use crate::errors::{ConfigError, EngineError, SourceError};
use crate::merge::{cumulative, merge_series, series_total};
use crate::period::{resolve_chill, resolve_gdd, GddWindow, Period};
use crate::phenology::ChillModel;
use crate::policy::{Inclusion, SkipReason};
use crate::query::{ChillRequest, FarmId, GddRequest};
use crate::report::{GddResponse, IndexReport, IndexValue, SensorEntry, Series};
use crate::source::SensorSource;
use crate::summary::summarize;

pub const GDD_MODEL_ID: &str = "gdd_avg_min_max";

#[derive(Debug, Clone, Copy)]
enum IndexKind {
    Chill(ChillModel),
    Gdd { base_temp: f64 },
}

impl IndexKind {
    fn value(&self, v: f64) -> IndexValue {
        match self {
            IndexKind::Chill(model) if model.is_units() => IndexValue::ChillUnits(v),
            IndexKind::Chill(_) => IndexValue::ChillHours(v),
            IndexKind::Gdd { .. } => IndexValue::Gdd(v),
        }
    }

    fn daily(&self, readings: &[crate::source::Reading]) -> DailySeries {
        match self {
            IndexKind::Chill(model) => daily_chill(readings, model),
            IndexKind::Gdd { base_temp } => daily_gdd(readings, *base_temp),
        }
    }
}

struct SensorOutcome {
    entry: SensorEntry,
    daily: Option<DailySeries>,
}

/// Computes Chill and GDD reports for a farm from a storage collaborator.
pub struct IndexEngine<S> {
    source: S,
    config: Config,
}

impl<S: SensorSource> IndexEngine<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn chill(
        &self,
        farm: &FarmId,
        request: &ChillRequest,
        today: NaiveDate,
    ) -> Result<IndexReport, EngineError> {
        let period = resolve_chill(request.year, request.custom, today);
        let kind = IndexKind::Chill(request.model);
        info!(
            "Chill for farm {} over {}..{} using {}",
            farm,
            period.start,
            period.end,
            request.model.id()
        );

        let target = self.config.chill.target;
        let mut report = self
            .compute(farm, request.sensor.as_deref(), period, kind, target, &[target], today)
            .await?;
        report.model = request.model.id().to_string();
        report.sampling = Some(request.model.sampling());
        Ok(report)
    }

    pub async fn gdd(
        &self,
        farm: &FarmId,
        request: &GddRequest,
        today: NaiveDate,
    ) -> Result<GddResponse, EngineError> {
        let period = match resolve_gdd(request.year, request.custom, request.bloom_start, today) {
            GddWindow::Active { period, .. } => period,
            GddWindow::OutOfCampaign { campaign } => {
                info!("GDD campaign {} not active yet for farm {}", request.year, farm);
                return Ok(GddResponse::OutOfCampaign {
                    farm_id: farm.to_string(),
                    campaign,
                    message: format!(
                        "GDD campaign runs {} to {}; nothing to compute yet",
                        campaign.start, campaign.end
                    ),
                });
            }
        };
        info!(
            "GDD for farm {} over {}..{} base {} °C",
            farm, period.start, period.end, request.base_temp
        );

        let kind = IndexKind::Gdd {
            base_temp: request.base_temp,
        };
        let milestones = self.config.gdd.milestones.clone();
        let mut report = self
            .compute(
                farm,
                request.sensor.as_deref(),
                period,
                kind,
                self.config.gdd.target(),
                &milestones,
                today,
            )
            .await?;
        report.model = GDD_MODEL_ID.to_string();
        report.base_temp = Some(request.base_temp);
        Ok(GddResponse::Ok(report))
    }

    #[allow(clippy::too_many_arguments)]
    async fn compute(
        &self,
        farm: &FarmId,
        sensor_filter: Option<&str>,
        period: Period,
        kind: IndexKind,
        target: f64,
        thresholds: &[f64],
        today: NaiveDate,
    ) -> Result<IndexReport, EngineError> {
        let sensors = self.sensors_for(farm, sensor_filter).await?;

        let outcomes: Vec<SensorOutcome> = stream::iter(sensors.iter())
            .map(|sensor| self.process_sensor(farm, sensor, &period, &kind))
            .buffered(self.config.max_concurrent_sensors.max(1))
            .collect()
            .await;

        let mut entries = Vec::with_capacity(outcomes.len());
        let mut valid_series = Vec::new();
        let mut sensor_totals = Vec::new();
        for outcome in outcomes {
            match outcome.daily {
                Some(daily) if outcome.entry.is_valid() => {
                    sensor_totals.push(series_total(&daily));
                    valid_series.push(daily);
                }
                _ => {}
            }
            entries.push(outcome.entry);
        }

        let merged = merge_series(&valid_series, self.config.merge_strategy);
        let points = cumulative(&merged);
        let summary = summarize(&points, &sensor_totals, target, thresholds, today);
        info!(
            "Farm {}: {} of {} sensors valid, total {}",
            farm,
            sensor_totals.len(),
            entries.len(),
            summary.total
        );

        Ok(IndexReport {
            farm_id: farm.to_string(),
            period,
            sensors: entries,
            series: Series { daily: points },
            summary,
            model: String::new(),
            sampling: None,
            base_temp: None,
        })
    }

    async fn sensors_for(
        &self,
        farm: &FarmId,
        filter: Option<&str>,
    ) -> Result<Vec<String>, EngineError> {
        let sensors = self
            .bounded("list_sensors", self.source.list_sensors(farm))
            .await?;

        match filter {
            None => Ok(sensors),
            Some(wanted) => sensors
                .into_iter()
                .find(|s| s == wanted)
                .map(|s| vec![s])
                .ok_or_else(|| ConfigError::UnknownSensor(wanted.to_string()).into()),
        }
    }

    async fn process_sensor(
        &self,
        farm: &FarmId,
        sensor: &str,
        period: &Period,
        kind: &IndexKind,
    ) -> SensorOutcome {
        let fields = match self
            .bounded("field_names", self.source.field_names(farm, sensor))
            .await
        {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Sensor '{}' schema lookup failed: {}", sensor, e);
                return skipped(sensor, kind, SkipReason::ErrorProcessingSensor, None, None);
            }
        };

        let layout = classify_columns(&fields);
        let is_soil = Some(layout.is_soil());
        let Some((date_field, temp_field)) = layout.required_fields() else {
            debug!("Sensor '{}' has no date or temperature field in {:?}", sensor, fields);
            return skipped(sensor, kind, SkipReason::MissingTempOrDate, is_soil, None);
        };

        let included_by_exception = match kind {
            IndexKind::Chill(_) => match self.config.soil_policy.chill_inclusion(sensor, &layout) {
                Inclusion::Included => Some(false),
                Inclusion::IncludedByException => Some(true),
                Inclusion::Excluded(reason) => {
                    debug!("Sensor '{}' excluded from chill: {:?}", sensor, reason);
                    return skipped(sensor, kind, reason, is_soil, Some(false));
                }
            },
            IndexKind::Gdd { .. } => None,
        };

        let readings = if period.is_empty() {
            Vec::new()
        } else {
            let window = period.query_window();
            match self
                .bounded(
                    "fetch_readings",
                    self.source
                        .fetch_readings(farm, sensor, date_field, temp_field, &window),
                )
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Sensor '{}' data fetch failed: {}", sensor, e);
                    return skipped(
                        sensor,
                        kind,
                        SkipReason::ErrorProcessingSensor,
                        is_soil,
                        included_by_exception,
                    );
                }
            }
        };

        let count = data_points(&readings);
        if count == 0 {
            return skipped(
                sensor,
                kind,
                SkipReason::NoDataInPeriod,
                is_soil,
                included_by_exception,
            );
        }

        let daily = kind.daily(&readings);
        let total = series_total(&daily);
        let span = match (daily.keys().next(), daily.keys().next_back()) {
            (Some(first), Some(last)) => Some(Period::new(*first, *last)),
            _ => None,
        };
        debug!(
            "Sensor '{}': {} readings, {} days, total {}",
            sensor,
            count,
            daily.len(),
            total
        );

        SensorOutcome {
            entry: SensorEntry {
                sensor: sensor.to_string(),
                value: kind.value(total),
                period: span,
                data_points: count,
                skipped_reason: None,
                is_soil_sensor: is_soil,
                included_by_exception,
            },
            daily: Some(daily),
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        let limit = self.config.sensor_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                operation,
                seconds: limit.as_secs(),
            }),
        }
    }
}

fn skipped(
    sensor: &str,
    kind: &IndexKind,
    reason: SkipReason,
    is_soil_sensor: Option<bool>,
    included_by_exception: Option<bool>,
) -> SensorOutcome {
    SensorOutcome {
        entry: SensorEntry {
            sensor: sensor.to_string(),
            value: kind.value(0.0),
            period: None,
            data_points: 0,
            skipped_reason: Some(reason),
            is_soil_sensor,
            included_by_exception,
        },
        daily: None,
    }
}
