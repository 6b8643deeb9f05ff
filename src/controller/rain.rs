//! Rain overlay
//!
//! `RainController` wraps another controller and periodically publishes,
//! per planet, a fresh list of rectangular regions where it is raining.
//! Planets consult the published lists through `RainOverlay` while
//! reporting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use super::{Controller, Overlay};
use crate::core::error::{Result, WeatherError};
use crate::core::types::{GeoPoint, LONGITUDE_RANGE};
use crate::data::ZoneData;
use crate::planet::PlanetClimate;
use crate::simulation::scheduler::{spawn_periodic, StopSignal, Worker};

/// Closed rectangle between two corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub lower_left: GeoPoint,
    pub upper_right: GeoPoint,
}

impl Region {
    /// Canonical rectangle spanned by two arbitrary corners
    ///
    /// The result is the same whichever order the corners are given in.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            lower_left: GeoPoint::new(a.latitude.min(b.latitude), a.longitude.min(b.longitude)),
            upper_right: GeoPoint::new(a.latitude.max(b.latitude), a.longitude.max(b.longitude)),
        }
    }

    /// Inclusive on every edge
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.lower_left.latitude <= point.latitude
            && point.latitude <= self.upper_right.latitude
            && self.lower_left.longitude <= point.longitude
            && point.longitude <= self.upper_right.longitude
    }
}

/// Latest published regions for one planet
#[derive(Debug, Default)]
struct RainSnapshot {
    regions: Mutex<Arc<Vec<Region>>>,
}

/// Published rain regions for every planet a rain controller drives
#[derive(Debug, Default)]
pub struct RainOverlay {
    planets: RwLock<HashMap<String, Arc<RainSnapshot>>>,
}

impl RainOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a planet with an empty region list
    pub fn register(&self, planet: &str) -> Result<()> {
        self.planets
            .write()
            .map_err(|_| WeatherError::LockPoisoned("rain planets"))?
            .entry(planet.to_string())
            .or_default();
        Ok(())
    }

    fn snapshot(&self, planet: &str) -> Result<Option<Arc<RainSnapshot>>> {
        Ok(self
            .planets
            .read()
            .map_err(|_| WeatherError::LockPoisoned("rain planets"))?
            .get(planet)
            .cloned())
    }

    /// Replace the planet's region list
    pub fn publish(&self, planet: &str, regions: Vec<Region>) -> Result<()> {
        let snapshot = self.snapshot(planet)?.ok_or_else(|| {
            WeatherError::Configuration(format!("{} is not registered for rain", planet))
        })?;
        let regions = Arc::new(regions);
        let mut current = snapshot
            .regions
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("rain regions"))?;
        *current = regions;
        Ok(())
    }

    /// Copy of the regions where it currently rains on `planet`
    pub fn planet_data(&self, planet: &str) -> Result<Vec<Region>> {
        let Some(snapshot) = self.snapshot(planet)? else {
            return Ok(Vec::new());
        };
        let regions = snapshot
            .regions
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("rain regions"))?
            .clone();
        Ok(regions.as_ref().clone())
    }
}

/// Lowest and highest latitude of a planet's rain zones
///
/// `None` when the planet has no rain zones.
pub fn allowed_rain_latitudes(data: &dyn ZoneData, planet: &str) -> Result<Option<(f64, f64)>> {
    let rain_zones = data.rain_eligible_zones(planet)?;
    let bands = data.zones(planet)?;
    let edges = bands
        .iter()
        .filter(|(name, _)| rain_zones.contains(*name))
        .flat_map(|(_, band)| [band.south(), band.north()]);

    Ok(edges.fold(None, |acc, lat| match acc {
        None => Some((lat, lat)),
        Some((lo, hi)) => Some((lo.min(lat), hi.max(lat))),
    }))
}

/// Random rain regions inside a latitude band
#[derive(Debug)]
pub struct RainGenerator {
    rng: StdRng,
    max_regions: usize,
}

impl RainGenerator {
    pub fn new(seed: Option<u64>, max_regions: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            max_regions: max_regions.max(1),
        }
    }

    /// Between 1 and `max_regions` regions with latitudes in `band`
    pub fn generate(&mut self, band: (f64, f64)) -> Vec<Region> {
        let count = self.rng.gen_range(1..=self.max_regions);
        (0..count)
            .map(|_| {
                let a = self.sample_point(band);
                let b = self.sample_point(band);
                Region::from_corners(a, b)
            })
            .collect()
    }

    fn sample_point(&mut self, (south, north): (f64, f64)) -> GeoPoint {
        GeoPoint::new(
            self.rng.gen_range(south..=north),
            self.rng.gen_range(LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1),
        )
    }

    /// One refresh of every planet's rain regions
    pub fn tick(&mut self, overlay: &RainOverlay, planets: &[Arc<PlanetClimate>], data: &dyn ZoneData) -> Result<()> {
        for planet in planets {
            let regions = match allowed_rain_latitudes(data, planet.name()) {
                Ok(Some(band)) => self.generate(band),
                Ok(None) => Vec::new(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(planet = planet.name(), error = %e, "skipping rain refresh");
                    continue;
                }
            };
            tracing::debug!(planet = planet.name(), regions = regions.len(), "rain regions published");
            overlay.publish(planet.name(), regions)?;
        }
        Ok(())
    }
}

/// Controller layer that adds rain on top of the controller it wraps
#[derive(Debug)]
pub struct RainController {
    inner: Box<Controller>,
    overlay: Arc<RainOverlay>,
    planets: Vec<Arc<PlanetClimate>>,
    period: Duration,
    max_regions: usize,
    seed: Option<u64>,
    worker: Option<Worker>,
}

impl RainController {
    pub fn new(inner: Controller, period: Duration, max_regions: usize, seed: Option<u64>) -> Self {
        Self {
            inner: Box::new(inner),
            overlay: Arc::new(RainOverlay::new()),
            planets: Vec::new(),
            period,
            max_regions,
            seed,
            worker: None,
        }
    }

    pub fn inner(&self) -> &Controller {
        &self.inner
    }

    pub fn overlay(&self) -> &Arc<RainOverlay> {
        &self.overlay
    }

    /// Register with the wrapped controller, then attach rain to the planet
    pub fn add_planet(&mut self, planet: &Arc<PlanetClimate>) -> Result<()> {
        self.inner.add_planet(planet)?;
        if self.planets.iter().any(|p| p == planet) {
            return Ok(());
        }
        self.overlay.register(planet.name())?;
        planet.attach_overlay(Overlay::Rain(self.overlay.clone()))?;
        self.planets.push(planet.clone());
        Ok(())
    }

    pub fn planets(&self) -> &[Arc<PlanetClimate>] {
        &self.planets
    }

    /// Start the wrapped controller first, then the rain worker
    pub fn start(&mut self, data: Arc<dyn ZoneData>) -> Result<()> {
        if self.worker.is_some() {
            return Err(WeatherError::Configuration("rain controller already started".into()));
        }
        self.inner.start(data.clone())?;

        let overlay = self.overlay.clone();
        let planets = self.planets.clone();
        let mut generator = RainGenerator::new(self.seed, self.max_regions);
        self.worker = Some(spawn_periodic("rain", self.period, StopSignal::new(), move || {
            generator.tick(&overlay, &planets, data.as_ref())
        }));
        Ok(())
    }

    pub fn shutdown(&self) {
        self.inner.shutdown();
        if let Some(worker) = &self.worker {
            worker.shutdown();
        }
    }

    /// Join this layer and the wrapped chain by one deadline; the first error wins
    pub async fn join_until(&mut self, deadline: Instant) -> Result<()> {
        let own = match self.worker.as_mut() {
            Some(worker) => worker.join_until(deadline).await,
            None => Ok(()),
        };
        let inner = self.inner.join_until(deadline).await;
        own.and(inner)
    }
}
