use chrono::NaiveDateTime;

use crate::errors::SourceError;
use crate::period::QueryWindow;
use crate::FarmId;

/// One sensor observation as handed over by storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, temperature: Option<f64>) -> Self {
        Self {
            timestamp,
            temperature,
        }
    }
}

/// Storage collaborator. Implementations own identifier escaping and
/// connection lifecycle; sensor names are opaque strings.
#[allow(async_fn_in_trait)]
pub trait SensorSource {
    /// All sensors recorded for a farm, in a stable order.
    async fn list_sensors(&self, farm: &FarmId) -> Result<Vec<String>, SourceError>;

    /// Field (column) names available for one sensor.
    async fn field_names(&self, farm: &FarmId, sensor: &str) -> Result<Vec<String>, SourceError>;

    /// Rows inside `window` (half-open), ascending by time.
    async fn fetch_readings(
        &self,
        farm: &FarmId,
        sensor: &str,
        date_field: &str,
        temp_field: &str,
        window: &QueryWindow,
    ) -> Result<Vec<Reading>, SourceError>;
}
