use thiserror::Error;

/// Caller-side mistakes. The whole request fails and the caller gets a
/// client error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid farm identifier '{0}'")]
    InvalidFarmId(String),
    #[error("Invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("Invalid {field} '{value}': expected a finite number")]
    NonFinite { field: &'static str, value: String },
    #[error("Invalid {field} '{value}': must be greater than zero")]
    NonPositive { field: &'static str, value: String },
    #[error("Invalid {field} '{value}': expected true or false")]
    InvalidBool { field: &'static str, value: String },
    #[error("Invalid year '{0}'")]
    InvalidYear(String),
    #[error("Unknown range '{0}': expected 'campaign' or 'custom'")]
    InvalidRange(String),
    #[error("Unknown chill mode '{0}': expected 'fixed', 'delta' or 'utah'")]
    InvalidMode(String),
    #[error("Custom range requires both startDate and endDate")]
    MissingCustomRange,
    #[error("startDate {start} is after endDate {end}")]
    InvertedRange { start: String, end: String },
    #[error("Sensor '{0}' not found for this farm")]
    UnknownSensor(String),
}

impl ConfigError {
    pub fn is_client_error(&self) -> bool {
        true
    }
}

/// Failures talking to the storage collaborator.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage call '{operation}' timed out after {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage unavailable: {0}")]
    Source(#[from] SourceError),
}

impl EngineError {
    pub fn is_client_error(&self) -> bool {
        match self {
            EngineError::Config(e) => e.is_client_error(),
            EngineError::Source(_) => false,
        }
    }
}
