use serde::{Deserialize, Serialize};

use crate::columns::ColumnLayout;

pub const DEFAULT_SOIL_EXCEPTION: &str = "Estacion Suelo Ambiente";

/// Why a sensor did not contribute to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingTempOrDate,
    SensorSoilOrConductivity,
    ErrorProcessingSensor,
    NoDataInPeriod,
}

/// Chill inclusion decision for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Included,
    IncludedByException,
    Excluded(SkipReason),
}

/// Soil sensors allowed into Chill despite their classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilExceptionPolicy {
    allowlist: Vec<String>,
}

impl Default for SoilExceptionPolicy {
    fn default() -> Self {
        Self::new(vec![DEFAULT_SOIL_EXCEPTION.to_string()])
    }
}

impl SoilExceptionPolicy {
    pub fn new(allowlist: Vec<String>) -> Self {
        Self { allowlist }
    }

    pub fn is_allowlisted(&self, sensor: &str) -> bool {
        let wanted = sensor.trim().to_lowercase();
        self.allowlist
            .iter()
            .any(|name| name.trim().to_lowercase() == wanted)
    }

    pub fn chill_inclusion(&self, sensor: &str, layout: &ColumnLayout) -> Inclusion {
        if !layout.is_soil() {
            Inclusion::Included
        } else if self.is_allowlisted(sensor) {
            Inclusion::IncludedByException
        } else {
            Inclusion::Excluded(SkipReason::SensorSoilOrConductivity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::classify_columns;

    #[test]
    fn test_soil_sensor_excluded() {
        let layout = classify_columns(&["datetime", "temperature", "conductivity", "soil_moisture"]);
        let policy = SoilExceptionPolicy::default();

        assert_eq!(
            policy.chill_inclusion("Sonda Norte", &layout),
            Inclusion::Excluded(SkipReason::SensorSoilOrConductivity)
        );
    }

    #[test]
    fn test_allowlisted_soil_sensor() {
        let layout = classify_columns(&["datetime", "temperature", "conductivity"]);
        let policy = SoilExceptionPolicy::new(vec!["Sonda Norte".to_string()]);

        assert_eq!(
            policy.chill_inclusion("  sonda norte ", &layout),
            Inclusion::IncludedByException
        );
    }

    #[test]
    fn test_ambient_sensor_included() {
        let layout = classify_columns(&["datetime", "temperature", "humidity"]);
        let policy = SoilExceptionPolicy::new(Vec::new());

        assert_eq!(policy.chill_inclusion("Estación 1", &layout), Inclusion::Included);
    }

    #[test]
    fn test_default_allowlist() {
        assert!(SoilExceptionPolicy::default().is_allowlisted(DEFAULT_SOIL_EXCEPTION));
    }

    #[test]
    fn test_skip_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&SkipReason::SensorSoilOrConductivity).unwrap(),
            "\"sensor_soil_or_conductivity\""
        );
        assert_eq!(
            serde_json::to_string(&SkipReason::MissingTempOrDate).unwrap(),
            "\"missing_temp_or_date\""
        );
    }
}
