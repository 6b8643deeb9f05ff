//! Planets and their climate state
//!
//! A `Planet` owns its locations and is reported by the driver. The part
//! of a planet that background controllers touch lives in `PlanetClimate`,
//! shared through an `Arc`:
//! - the summer/winter zone split, flipped by the season controller
//! - the overlays consulted while reporting (rain, ...)

pub mod loader;

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rand::Rng;

use crate::controller::{Overlay, OverlayView};
use crate::core::error::{Result, WeatherError};
use crate::core::types::{Metric, MetricRange, Season};
use crate::data::{PlanetData, ZoneData};
use crate::location::Location;

/// Summer/winter assignment of a planet's zones
///
/// Every zone is in exactly one of the two sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeasonZones {
    summer: BTreeSet<String>,
    winter: BTreeSet<String>,
}

impl SeasonZones {
    /// Sorted zone names, first half summer and the rest winter
    pub fn split<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let all: BTreeSet<String> = zones.into_iter().map(Into::into).collect();
        let mid = all.len() / 2;
        let mut summer = BTreeSet::new();
        let mut winter = BTreeSet::new();
        for (i, zone) in all.into_iter().enumerate() {
            if i < mid {
                summer.insert(zone);
            } else {
                winter.insert(zone);
            }
        }
        Self { summer, winter }
    }

    pub fn summer(&self) -> &BTreeSet<String> {
        &self.summer
    }

    pub fn winter(&self) -> &BTreeSet<String> {
        &self.winter
    }

    pub fn all(&self) -> BTreeSet<String> {
        self.summer.union(&self.winter).cloned().collect()
    }

    /// Seasonal baseline for a zone; anything not in summer is winter
    pub fn season_of(&self, zone: &str) -> Season {
        if self.summer.contains(zone) {
            Season::Summer
        } else {
            Season::Winter
        }
    }

    pub fn flip(&mut self) {
        std::mem::swap(&mut self.summer, &mut self.winter);
    }
}

/// Climate state shared between a planet and its controllers
///
/// Identity is the planet name.
#[derive(Debug)]
pub struct PlanetClimate {
    name: String,
    zones: Mutex<SeasonZones>,
    overlays: RwLock<Vec<Overlay>>,
    controlled: AtomicBool,
}

impl PlanetClimate {
    pub fn new(name: impl Into<String>, zones: SeasonZones) -> Self {
        Self {
            name: name.into(),
            zones: Mutex::new(zones),
            overlays: RwLock::new(Vec::new()),
            controlled: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the current summer/winter split
    pub fn season_zones(&self) -> Result<SeasonZones> {
        self.zones
            .lock()
            .map(|z| z.clone())
            .map_err(|_| WeatherError::LockPoisoned("season zones"))
    }

    /// Swap summer and winter zones in one critical section
    pub fn flip_seasons(&self) -> Result<()> {
        let mut zones = self
            .zones
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("season zones"))?;
        zones.flip();
        Ok(())
    }

    pub fn attach_overlay(&self, overlay: Overlay) -> Result<()> {
        self.overlays
            .write()
            .map_err(|_| WeatherError::LockPoisoned("planet overlays"))?
            .push(overlay);
        Ok(())
    }

    pub fn overlays(&self) -> Result<Vec<Overlay>> {
        self.overlays
            .read()
            .map(|o| o.clone())
            .map_err(|_| WeatherError::LockPoisoned("planet overlays"))
    }

    /// Drop every attached overlay
    ///
    /// Overlays only ever come from the chain holding the claim.
    pub fn detach_overlays(&self) -> Result<()> {
        self.overlays
            .write()
            .map_err(|_| WeatherError::LockPoisoned("planet overlays"))?
            .clear();
        Ok(())
    }

    /// Mark the planet as driven by a season controller
    ///
    /// Fails if another controller chain already claimed it.
    pub fn claim_controller(&self) -> Result<()> {
        self.controlled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| {
                WeatherError::Configuration(format!(
                    "{} already has a season controller",
                    self.name
                ))
            })
    }

    /// Give the planet back so another chain may claim it
    pub fn release_controller(&self) {
        self.controlled.store(false, Ordering::SeqCst);
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled.load(Ordering::SeqCst)
    }
}

impl PartialEq for PlanetClimate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PlanetClimate {}

impl Hash for PlanetClimate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A planet with locations to report on
#[derive(Debug)]
pub struct Planet {
    climate: Arc<PlanetClimate>,
    locations: Vec<Location>,
}

impl Planet {
    pub fn new<I, S>(name: impl Into<String>, zones: I, mut locations: Vec<Location>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // East to west
        locations.sort_by(|a, b| b.longitude().total_cmp(&a.longitude()));
        Self {
            climate: Arc::new(PlanetClimate::new(name, SeasonZones::split(zones))),
            locations,
        }
    }

    pub fn from_data(data: &PlanetData) -> Self {
        let locations = data.locations.iter().map(Location::from_data).collect();
        Self::new(data.name.clone(), data.zones.keys().cloned(), locations)
    }

    pub fn name(&self) -> &str {
        self.climate.name()
    }

    pub fn climate(&self) -> &Arc<PlanetClimate> {
        &self.climate
    }

    /// Locations sorted by longitude, east to west
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Write current conditions for every location, then a blank line
    pub fn report<W: Write>(&mut self, data: &dyn ZoneData, out: &mut W) -> Result<()> {
        self.report_with_rng(data, &mut rand::thread_rng(), out)
    }

    /// `report` with a caller supplied RNG
    ///
    /// Stops at the first location whose zone or ranges cannot be resolved;
    /// locations already written keep their new values.
    pub fn report_with_rng<W: Write, R: Rng>(
        &mut self,
        data: &dyn ZoneData,
        rng: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let name = self.climate.name().to_string();
        let zones = self.climate.season_zones()?;
        let views = self
            .climate
            .overlays()?
            .iter()
            .map(|overlay| overlay.view(&name))
            .collect::<Result<Vec<OverlayView>>>()?;

        for location in &mut self.locations {
            let zone = data.zone_of(&name, location.latitude())?;
            let season = views
                .iter()
                .find_map(|view| view.season_at(location.point()))
                .unwrap_or_else(|| zones.season_of(&zone));

            let temperature = data.range(&name, &zone, season, Metric::Temperature)?;
            let pressure = data.range(&name, &zone, season, Metric::Pressure)?;
            let humidity = data.range(&name, &zone, season, Metric::Humidity)?;

            location.temperature = Some(rng.gen_range(temperature.min..=temperature.max));
            location.pressure = Some(rng.gen_range(pressure.min..=pressure.max));
            location.humidity = Some(sample_integer(&name, &zone, humidity, rng)?);
            location.season = Some(season);

            writeln!(out, "{}", location)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

fn sample_integer<R: Rng>(planet: &str, zone: &str, range: MetricRange, rng: &mut R) -> Result<i64> {
    let low = range.min.ceil() as i64;
    let high = range.max.floor() as i64;
    if low > high {
        return Err(WeatherError::data_unavailable(
            planet,
            format!("no whole humidity value in zone {} range", zone),
        ));
    }
    Ok(rng.gen_range(low..=high))
}
