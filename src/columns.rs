use serde::Serialize;

/// Date/time field candidates in priority order
pub const DATE_CANDIDATES: [&str; 5] = ["datetime", "timestamp", "date", "fecha", "time"];

/// Temperature field candidates in priority order
pub const TEMP_CANDIDATES: [&str; 3] = ["temperature", "temperatura", "temp"];

pub const HUMIDITY_CANDIDATES: [&str; 4] = ["humidity", "humedad", "relative_humidity", "rh"];

/// Signal tokens that mark a conductivity/moisture (soil) sensor
pub const SOIL_TOKENS: [&str; 12] = [
    "conductivity",
    "conductividad",
    "ec",
    "ece",
    "soil",
    "soil_moisture",
    "soilmoisture",
    "vwc",
    "smtc",
    "moisture",
    "humedad_suelo",
    "water_content",
];

// Tokens this short only match a whole word, optionally followed by a depth
// or index number ("VWC10", "ECe25"). Otherwise "ec" hits "record", "sector".
const WHOLE_WORD_MAX_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Ambient,
    Soil,
}

/// What the classifier found in a sensor's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date_field: Option<String>,
    pub temp_field: Option<String>,
    pub humidity_field: Option<String>,
    pub kind: SensorKind,
}

impl ColumnLayout {
    /// Date and temperature fields, if both were found.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        match (&self.date_field, &self.temp_field) {
            (Some(date), Some(temp)) => Some((date.as_str(), temp.as_str())),
            _ => None,
        }
    }

    pub fn is_soil(&self) -> bool {
        self.kind == SensorKind::Soil
    }
}

/// Classify a sensor from its available field names.
///
/// Never fails: missing fields come back as `None` and the caller decides
/// whether the sensor can be used.
pub fn classify_columns<S: AsRef<str>>(field_names: &[S]) -> ColumnLayout {
    let fields: Vec<&str> = field_names.iter().map(|f| f.as_ref()).collect();

    let date_field = pick_field(&fields, &DATE_CANDIDATES, |_| false);
    let temp_field = pick_field(&fields, &TEMP_CANDIDATES, |f| {
        date_field.as_deref() == Some(f)
    });
    let humidity_field = pick_field(&fields, &HUMIDITY_CANDIDATES, |f| {
        is_soil_field(f) || date_field.as_deref() == Some(f) || temp_field.as_deref() == Some(f)
    });

    let kind = if fields.iter().any(|f| is_soil_field(f)) {
        SensorKind::Soil
    } else {
        SensorKind::Ambient
    };

    ColumnLayout {
        date_field,
        temp_field,
        humidity_field,
        kind,
    }
}

/// Exact matches over the whole candidate list win over substring matches.
fn pick_field<F>(fields: &[&str], candidates: &[&str], excluded: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let usable: Vec<(&str, String)> = fields
        .iter()
        .filter(|f| !excluded(**f))
        .map(|f| (*f, f.trim().to_lowercase()))
        .collect();

    for candidate in candidates {
        if let Some((original, _)) = usable.iter().find(|(_, lower)| lower == candidate) {
            return Some(original.to_string());
        }
    }

    for candidate in candidates {
        if let Some((original, _)) = usable.iter().find(|(_, lower)| lower.contains(candidate)) {
            return Some(original.to_string());
        }
    }

    None
}

pub fn is_soil_field(field: &str) -> bool {
    let lower = field.trim().to_lowercase();

    SOIL_TOKENS.iter().any(|token| {
        if lower == *token {
            return true;
        }
        if token.len() <= WHOLE_WORD_MAX_LEN {
            lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter_map(|word| word.strip_prefix(*token))
                .any(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        } else {
            lower.contains(token)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_sensor_layout() {
        let layout = classify_columns(&["id", "Fecha", "Temperatura", "Humedad"]);

        assert_eq!(layout.date_field.as_deref(), Some("Fecha"));
        assert_eq!(layout.temp_field.as_deref(), Some("Temperatura"));
        assert_eq!(layout.humidity_field.as_deref(), Some("Humedad"));
        assert_eq!(layout.kind, SensorKind::Ambient);
    }

    #[test]
    fn test_exact_match_beats_substring() {
        // "date_received" contains "date" but "time" is an exact hit
        let layout = classify_columns(&["date_received", "time", "air_temp"]);

        assert_eq!(layout.date_field.as_deref(), Some("time"));
        assert_eq!(layout.temp_field.as_deref(), Some("air_temp"));
    }

    #[test]
    fn test_priority_order_among_exact_matches() {
        let layout = classify_columns(&["time", "date", "timestamp", "temp", "temperature"]);

        assert_eq!(layout.date_field.as_deref(), Some("timestamp"));
        assert_eq!(layout.temp_field.as_deref(), Some("temperature"));
    }

    #[test]
    fn test_soil_sensor_detection() {
        let layout = classify_columns(&["datetime", "temperature", "conductivity", "soil_moisture"]);

        assert!(layout.is_soil());
        assert!(layout.required_fields().is_some());
    }

    #[test]
    fn test_short_tokens_need_whole_words() {
        assert!(is_soil_field("EC"));
        assert!(is_soil_field("ec_value"));
        assert!(is_soil_field("VWC 10cm"));
        assert!(!is_soil_field("record_id"));
        assert!(!is_soil_field("sector"));
        assert!(is_soil_field("SoilMoisture_20"));
    }

    #[test]
    fn test_short_tokens_allow_numbered_suffix() {
        assert!(is_soil_field("VWC10"));
        assert!(is_soil_field("ECe25"));
        assert!(is_soil_field("ec_1"));
        assert!(is_soil_field("Soil EC2"));
        assert!(!is_soil_field("received_at"));
        assert!(!is_soil_field("ecology"));
        assert!(!is_soil_field("fecha"));
    }

    #[test]
    fn test_missing_temperature() {
        let layout = classify_columns(&["datetime", "conductivity"]);

        assert!(layout.temp_field.is_none());
        assert!(layout.required_fields().is_none());
    }

    #[test]
    fn test_soil_humidity_is_not_ambient_humidity() {
        let layout = classify_columns(&["datetime", "temp", "humedad_suelo"]);

        assert!(layout.humidity_field.is_none());
        assert!(layout.is_soil());
    }
}
