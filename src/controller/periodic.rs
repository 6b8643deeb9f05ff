//! Periodic season controller
//!
//! Each bound planet has a clock in `[0, revolution_period / 2)`. Every tick
//! advances the clock; when it wraps to zero the planet has gone half way
//! around its star and its summer and winter zones swap.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::error::{Result, WeatherError};
use crate::data::ZoneData;
use crate::planet::PlanetClimate;
use crate::simulation::scheduler::{spawn_periodic, StopSignal, Worker};

/// Half of the revolution period, which must be at least one tick
pub fn half_period(data: &dyn ZoneData, planet: &str) -> Result<u64> {
    let period = data.revolution_period(planet)?;
    let half = period / 2;
    if half == 0 {
        return Err(WeatherError::Configuration(format!(
            "{} has revolution_period {}, need at least 2",
            planet, period
        )));
    }
    Ok(half)
}

/// Ticks until the next season change for one planet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonClock {
    clock: u64,
    half_period: u64,
}

impl SeasonClock {
    pub fn new(half_period: u64) -> Self {
        Self {
            clock: 0,
            half_period: half_period.max(1),
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn half_period(&self) -> u64 {
        self.half_period
    }

    /// Follow a changed revolution period without losing the phase
    pub fn set_half_period(&mut self, half_period: u64) {
        self.half_period = half_period.max(1);
        self.clock %= self.half_period;
    }

    /// Advance one tick; true when seasons should change
    pub fn advance(&mut self) -> bool {
        self.clock = (self.clock + 1) % self.half_period;
        self.clock == 0
    }
}

/// Clocks for every planet of a periodic controller
#[derive(Debug)]
pub struct SeasonSchedule {
    entries: Vec<(Arc<PlanetClimate>, SeasonClock)>,
}

impl SeasonSchedule {
    /// All clocks start at zero; fails if any planet's period is unusable
    pub fn new(planets: &[Arc<PlanetClimate>], data: &dyn ZoneData) -> Result<Self> {
        let entries = planets
            .iter()
            .map(|planet| -> Result<_> {
                let half = half_period(data, planet.name())?;
                Ok((planet.clone(), SeasonClock::new(half)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn clock(&self, planet: &str) -> Option<SeasonClock> {
        self.entries
            .iter()
            .find(|(p, _)| p.name() == planet)
            .map(|(_, clock)| *clock)
    }

    /// One tick for every planet, in registration order
    pub fn tick(&mut self, data: &dyn ZoneData) -> Result<()> {
        for (planet, clock) in &mut self.entries {
            match half_period(data, planet.name()) {
                Ok(half) => clock.set_half_period(half),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(planet = planet.name(), error = %e, "keeping previous revolution period");
                }
            }
            if clock.advance() {
                planet.flip_seasons()?;
                tracing::debug!(planet = planet.name(), "seasons changed");
            }
        }
        Ok(())
    }
}

/// Base controller that flips seasons on a fixed tick
#[derive(Debug)]
pub struct PeriodicController {
    planets: Vec<Arc<PlanetClimate>>,
    period: Duration,
    worker: Option<Worker>,
}

impl PeriodicController {
    pub fn new(period: Duration) -> Self {
        Self {
            planets: Vec::new(),
            period,
            worker: None,
        }
    }

    /// Bind a planet; a planet already driven by another chain is rejected
    pub fn add_planet(&mut self, planet: &Arc<PlanetClimate>) -> Result<()> {
        if self.planets.iter().any(|p| p == planet) {
            return Ok(());
        }
        planet.claim_controller()?;
        self.planets.push(planet.clone());
        Ok(())
    }

    pub fn planets(&self) -> &[Arc<PlanetClimate>] {
        &self.planets
    }

    pub fn start(&mut self, data: Arc<dyn ZoneData>) -> Result<()> {
        if self.worker.is_some() {
            return Err(WeatherError::Configuration("periodic controller already started".into()));
        }
        let mut schedule = SeasonSchedule::new(&self.planets, data.as_ref())?;
        self.worker = Some(spawn_periodic("periodic-seasons", self.period, StopSignal::new(), move || {
            schedule.tick(data.as_ref())
        }));
        Ok(())
    }

    pub fn shutdown(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown();
        }
    }

    pub async fn join_until(&mut self, deadline: Instant) -> Result<()> {
        match self.worker.as_mut() {
            Some(worker) => worker.join_until(deadline).await,
            None => Ok(()),
        }
    }
}
