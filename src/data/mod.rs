//! Zone data: per-planet zones, seasons and metric ranges
//!
//! `ZoneData` is the query surface used by planets and controllers.
//! `DataSet` is the parsed JSON dataset; `DataReader` keeps a refreshed
//! copy of it behind a lock.

pub mod reader;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::core::error::{Result, WeatherError};
use crate::core::types::{LatitudeBand, Metric, MetricRange, Season};
use crate::location::LocationData;

pub use reader::DataReader;

/// Queries the weather core needs answered about a planet
pub trait ZoneData: Send + Sync {
    /// Revolution period around the parent star, in season ticks
    fn revolution_period(&self, planet: &str) -> Result<u64>;

    /// All zones of a planet with their latitude bands
    fn zones(&self, planet: &str) -> Result<BTreeMap<String, LatitudeBand>>;

    /// Zones where rain may fall
    fn rain_eligible_zones(&self, planet: &str) -> Result<BTreeSet<String>>;

    /// Zone containing `latitude`
    fn zone_of(&self, planet: &str, latitude: f64) -> Result<String>;

    /// Allowed range of `metric` for a zone in a season
    fn range(&self, planet: &str, zone: &str, season: Season, metric: Metric) -> Result<MetricRange>;
}

/// Ranges for one zone in one season
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonRanges {
    #[serde(default)]
    pub temperature: Option<MetricRange>,
    #[serde(default)]
    pub pressure: Option<MetricRange>,
    #[serde(default)]
    pub humidity: Option<MetricRange>,
}

impl SeasonRanges {
    pub fn get(&self, metric: Metric) -> Option<MetricRange> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
            Metric::Humidity => self.humidity,
        }
    }
}

/// One planet's entry in the dataset
#[derive(Debug, Clone, Deserialize)]
pub struct PlanetData {
    pub name: String,
    #[serde(default)]
    pub base_weather: Option<String>,
    #[serde(default)]
    pub weather_decorators: Vec<String>,
    #[serde(default)]
    pub revolution_period: Option<i64>,
    #[serde(default)]
    pub rain_zones: Vec<String>,
    #[serde(default)]
    pub zones: BTreeMap<String, LatitudeBand>,
    #[serde(default)]
    pub zone_data: BTreeMap<String, HashMap<Season, SeasonRanges>>,
    #[serde(default)]
    pub locations: Vec<LocationData>,
}

/// The whole dataset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSet {
    pub planets: Vec<PlanetData>,
}

impl DataSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn planet(&self, name: &str) -> Result<&PlanetData> {
        self.planets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| WeatherError::data_unavailable(name, "planet not in dataset"))
    }
}

impl ZoneData for DataSet {
    fn revolution_period(&self, planet: &str) -> Result<u64> {
        let period = self.planet(planet)?.revolution_period.ok_or_else(|| {
            WeatherError::Configuration(format!("{} has no revolution_period", planet))
        })?;
        u64::try_from(period).map_err(|_| {
            WeatherError::Configuration(format!(
                "{} has a negative revolution_period ({})",
                planet, period
            ))
        })
    }

    fn zones(&self, planet: &str) -> Result<BTreeMap<String, LatitudeBand>> {
        Ok(self.planet(planet)?.zones.clone())
    }

    fn rain_eligible_zones(&self, planet: &str) -> Result<BTreeSet<String>> {
        Ok(self.planet(planet)?.rain_zones.iter().cloned().collect())
    }

    fn zone_of(&self, planet: &str, latitude: f64) -> Result<String> {
        self.planet(planet)?
            .zones
            .iter()
            .find(|(_, band)| band.contains(latitude))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| WeatherError::ZoneUnresolved {
                planet: planet.to_string(),
                latitude,
            })
    }

    fn range(&self, planet: &str, zone: &str, season: Season, metric: Metric) -> Result<MetricRange> {
        let range = self
            .planet(planet)?
            .zone_data
            .get(zone)
            .and_then(|seasons| seasons.get(&season))
            .and_then(|ranges| ranges.get(metric))
            .ok_or_else(|| {
                WeatherError::data_unavailable(
                    planet,
                    format!("no {} range for zone {} in {}", metric.as_str(), zone, season),
                )
            })?;
        if !range.is_finite() {
            return Err(WeatherError::data_unavailable(
                planet,
                format!("{} range for zone {} in {} is not a number", metric.as_str(), zone, season),
            ));
        }
        Ok(range.normalized())
    }
}
