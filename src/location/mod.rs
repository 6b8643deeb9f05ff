//! Location - a point on a planet where weather is reported
//!
//! Coordinates are fixed at construction. The observed fields (temperature,
//! pressure, humidity, season) are overwritten by every report cycle.

use std::fmt;

use chrono::{FixedOffset, Utc};
use serde::Deserialize;

use crate::core::types::{GeoPoint, Season};

/// Separator between fields of a rendered record
pub const FIELD_DELIMITER: &str = "|";

const FALLBACK_TIMEZONE: &str = "UTC+0";

/// A location entry as it appears in the dataset
#[derive(Debug, Clone, Deserialize)]
pub struct LocationData {
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    timezone: Option<String>,
    pub elevation: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<i64>,
    pub season: Option<Season>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
            timezone: None,
            elevation: None,
            temperature: None,
            pressure: None,
            humidity: None,
            season: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        let mut location = Self::new(latitude, longitude);
        location.name = Some(name.into());
        location
    }

    pub fn from_data(data: &LocationData) -> Self {
        let mut location = Self::new(data.latitude, data.longitude);
        location.name = data.name.clone();
        location.elevation = data.elevation;
        if let Some(tz) = &data.timezone {
            location.set_timezone(tz);
        }
        location
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// Set the timezone, which must look like `UTC+8.0` or `UTC-2`
    ///
    /// Anything else falls back to `UTC+0`.
    pub fn set_timezone(&mut self, timezone: &str) {
        let accepted = if parse_utc_offset(timezone).is_some() {
            timezone
        } else {
            FALLBACK_TIMEZONE
        };
        self.timezone = Some(accepted.to_string());
    }

    /// Comma separated latitude, longitude and elevation
    ///
    /// Coordinates always carry a decimal point (`10.0`, not `10`).
    pub fn position(&self) -> String {
        format!(
            "{:?},{:?},{}",
            self.latitude,
            self.longitude,
            display_or_none(self.elevation)
        )
    }

    /// Current local time at this location, `None` when no timezone is set
    pub fn current_time(&self) -> String {
        let Some(hours) = self.timezone.as_deref().and_then(parse_utc_offset) else {
            return "None".to_string();
        };
        // Offsets of a day or more are out of range for chrono
        let Some(offset) = FixedOffset::east_opt((hours * 3600.0).round() as i32) else {
            return "None".to_string();
        };
        Utc::now()
            .with_timezone(&offset)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }

    pub fn temperature_string(&self) -> String {
        format_temperature(self.temperature)
    }

    pub fn pressure_string(&self) -> String {
        match self.pressure {
            Some(p) => format!("{:.1}", p),
            None => "None".to_string(),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.name == other.name
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            self.name.clone().unwrap_or_else(|| "None".to_string()),
            self.position(),
            self.current_time(),
            self.season
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| "None".to_string()),
            self.temperature_string(),
            self.pressure_string(),
            display_or_none(self.humidity),
        ];
        f.write_str(&fields.join(FIELD_DELIMITER))
    }
}

/// Render a temperature with one decimal and an explicit `+` when positive
pub fn format_temperature(temperature: Option<f64>) -> String {
    let Some(t) = temperature else {
        return "None".to_string();
    };
    let rounded = format!("{:.1}", t);
    if rounded.parse::<f64>().map_or(false, |v| v > 0.0) {
        format!("+{}", rounded)
    } else {
        rounded
    }
}

/// Hours east of UTC for a `UTC(+|-)<hours>[.<fraction>]` string
pub fn parse_utc_offset(timezone: &str) -> Option<f64> {
    let rest = timezone.strip_prefix("UTC")?;
    let mut chars = rest.chars();
    let sign = match chars.next()? {
        '+' => 1.0,
        '-' => -1.0,
        _ => return None,
    };
    let number = chars.as_str();
    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return None;
    }
    let hours: f64 = number.trim_end_matches('.').parse().ok()?;
    Some(sign * hours)
}

fn display_or_none<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}
