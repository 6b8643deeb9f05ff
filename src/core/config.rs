//! Runtime configuration for controllers, the data reader and the driver
//!
//! Every field has a default, so an empty TOML file is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Result, WeatherError};

/// Timing and sampling knobs for a weather run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Interval between season clock ticks (milliseconds)
    ///
    /// A planet flips seasons every `revolution_period / 2` ticks.
    pub season_tick_ms: u64,

    /// Interval between rain snapshot refreshes (milliseconds)
    pub rain_tick_ms: u64,

    /// Interval between reloads of the zone dataset (milliseconds)
    pub data_refresh_ms: u64,

    /// Consecutive reload failures tolerated before the data source is
    /// considered dead
    pub max_refresh_failures: u32,

    /// Upper bound on rain regions generated per planet per tick
    pub max_rain_regions: usize,

    /// Pause between report cycles in the driver (milliseconds)
    pub report_interval_ms: u64,

    /// How long shutdown waits for each worker to exit (milliseconds)
    pub shutdown_timeout_ms: u64,

    /// Seed for controller RNGs; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            season_tick_ms: 3000,
            rain_tick_ms: 3000,
            data_refresh_ms: 2000,
            max_refresh_failures: 1,
            max_rain_regions: 10,
            report_interval_ms: 6000,
            shutdown_timeout_ms: 5000,
            seed: None,
        }
    }
}

impl WeatherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WeatherConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("season_tick_ms", self.season_tick_ms),
            ("rain_tick_ms", self.rain_tick_ms),
            ("data_refresh_ms", self.data_refresh_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(WeatherError::Configuration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.max_rain_regions == 0 {
            return Err(WeatherError::Configuration(
                "max_rain_regions must be at least 1".into(),
            ));
        }

        if self.max_refresh_failures == 0 {
            return Err(WeatherError::Configuration(
                "max_refresh_failures must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn season_tick(&self) -> Duration {
        Duration::from_millis(self.season_tick_ms)
    }

    pub fn rain_tick(&self) -> Duration {
        Duration::from_millis(self.rain_tick_ms)
    }

    pub fn data_refresh(&self) -> Duration {
        Duration::from_millis(self.data_refresh_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WeatherConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WeatherConfig::from_toml_str("season_tick_ms = 50\nseed = 7\n").unwrap();
        assert_eq!(config.season_tick_ms, 50);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.rain_tick_ms, 3000);
        assert_eq!(config.max_rain_regions, 10);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = WeatherConfig::from_toml_str("rain_tick_ms = 0").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_rain_regions_rejected() {
        let mut config = WeatherConfig::default();
        config.max_rain_regions = 0;
        assert!(config.validate().is_err());
    }
}
