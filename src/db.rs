use chrono::NaiveDateTime;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::SourceError;
use crate::period::QueryWindow;
use crate::query::FarmId;
use crate::source::{Reading, SensorSource};

/// Each farm is a schema; each sensor is a table named after its display name.
#[derive(Debug, Clone)]
pub struct PgSensorSource {
    pool: PgPool,
}

pub async fn create_pool(config: &Config) -> Result<PgPool, SourceError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.sensor_timeout.max(Duration::from_secs(1)))
        .connect(&config.database_url)
        .await?;
    info!("Connected to database (max {} connections)", config.max_connections);
    Ok(pool)
}

impl PgSensorSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Half-open, time-ordered select of one sensor table.
pub fn readings_query(farm: &FarmId, sensor: &str, date_field: &str, temp_field: &str) -> String {
    let ts = format!("CAST({} AS timestamp)", quote_ident(date_field));
    format!(
        r#"
        SELECT
            {ts} AS ts,
            CAST({temp} AS double precision) AS temperature
        FROM {schema}.{table}
        WHERE {ts} >= $1 AND {ts} < $2
        ORDER BY ts
        "#,
        ts = ts,
        temp = quote_ident(temp_field),
        schema = quote_ident(farm.as_str()),
        table = quote_ident(sensor),
    )
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    ts: Option<NaiveDateTime>,
    temperature: Option<f64>,
}

impl SensorSource for PgSensorSource {
    async fn list_sensors(&self, farm: &FarmId) -> Result<Vec<String>, SourceError> {
        let sensors = sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .bind(farm.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!("Farm {} has {} sensor tables", farm, sensors.len());
        Ok(sensors)
    }

    async fn field_names(&self, farm: &FarmId, sensor: &str) -> Result<Vec<String>, SourceError> {
        let fields = sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(farm.as_str())
        .bind(sensor)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }

    async fn fetch_readings(
        &self,
        farm: &FarmId,
        sensor: &str,
        date_field: &str,
        temp_field: &str,
        window: &QueryWindow,
    ) -> Result<Vec<Reading>, SourceError> {
        let query = readings_query(farm, sensor, date_field, temp_field);

        let rows = sqlx::query_as::<_, ReadingRow>(&query)
            .bind(window.start)
            .bind(window.end_exclusive)
            .fetch_all(&self.pool)
            .await?;

        let readings: Vec<Reading> = rows
            .into_iter()
            .filter_map(|row| row.ts.map(|ts| Reading::new(ts, row.temperature)))
            .collect();

        debug!("Sensor '{}' returned {} rows", sensor, readings.len());
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_handles_punctuation() {
        assert_eq!(quote_ident("Estación 1"), "\"Estación 1\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_readings_query_is_half_open() {
        let farm = FarmId::parse("finca_01").unwrap();
        let sql = readings_query(&farm, "Sonda \"A\"", "Fecha", "Temp");

        assert!(sql.contains(r#"FROM "finca_01"."Sonda ""A""""#));
        assert!(sql.contains(r#"CAST("Fecha" AS timestamp) >= $1"#));
        assert!(sql.contains(r#"CAST("Fecha" AS timestamp) < $2"#));
        assert!(sql.contains(r#"CAST("Temp" AS double precision)"#));
        assert!(sql.contains("ORDER BY ts"));
    }
}
