use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported controller: {0}")]
    UnsupportedController(String),

    #[error("No data for planet {planet}: {detail}")]
    DataUnavailable { planet: String, detail: String },

    #[error("Cannot determine zone on planet {planet} for latitude {latitude}")]
    ZoneUnresolved { planet: String, latitude: f64 },

    #[error("Data source failed: {0}")]
    DataSource(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Worker {name} failed: {detail}")]
    WorkerFailed { name: String, detail: String },

    #[error("Worker {0} did not stop in time")]
    ShutdownTimeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl WeatherError {
    pub fn data_unavailable(planet: &str, detail: impl Into<String>) -> Self {
        Self::DataUnavailable {
            planet: planet.to_string(),
            detail: detail.into(),
        }
    }

    /// Errors that stop a controller instead of being retried on the next tick
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DataSource(_) | Self::LockPoisoned(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnsupportedController(_))
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
