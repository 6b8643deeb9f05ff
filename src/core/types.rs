//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Longitudes sampled for rain regions span the whole planet
pub const LONGITUDE_RANGE: (f64, f64) = (-179.999, 180.0);

/// A geographic point (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Weather condition used to pick a zone's metric ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
    Rain,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Rain => "rain",
        }
    }

    /// Label shown in rendered reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summer => "Sunny",
            Self::Winter => "Snow",
            Self::Rain => "Rain",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed quantity sampled during a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Pressure,
    Humidity,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Humidity => "humidity",
        }
    }
}

/// Closed interval `[min, max]`, written as a two-element array in data files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Same bounds with `min <= max`; datasets may list them either way
    pub fn normalized(self) -> Self {
        Self::new(self.min.min(self.max), self.min.max(self.max))
    }
}

impl From<[f64; 2]> for MetricRange {
    fn from(bounds: [f64; 2]) -> Self {
        Self::new(bounds[0], bounds[1])
    }
}

impl From<MetricRange> for [f64; 2] {
    fn from(range: MetricRange) -> Self {
        [range.min, range.max]
    }
}

/// Latitude band covered by a zone
///
/// Data files list the two edges in either order (southern zones are
/// usually written `[0, -30]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatitudeBand {
    pub first: f64,
    pub second: f64,
}

impl LatitudeBand {
    pub fn new(first: f64, second: f64) -> Self {
        Self { first, second }
    }

    pub fn south(&self) -> f64 {
        self.first.min(self.second)
    }

    pub fn north(&self) -> f64 {
        self.first.max(self.second)
    }

    pub fn contains(&self, latitude: f64) -> bool {
        self.south() <= latitude && latitude <= self.north()
    }
}

impl From<[f64; 2]> for LatitudeBand {
    fn from(edges: [f64; 2]) -> Self {
        Self::new(edges[0], edges[1])
    }
}

impl From<LatitudeBand> for [f64; 2] {
    fn from(band: LatitudeBand) -> Self {
        [band.first, band.second]
    }
}
