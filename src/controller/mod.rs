//! Weather controllers
//!
//! A controller chain is one base controller (seasons) wrapped by zero or
//! more overlay controllers (rain, ...). Every layer runs its own periodic
//! worker. Overlay layers also attach an `Overlay` handle to each planet so
//! the planet's report can ask where the overlay currently applies.

pub mod factory;
pub mod periodic;
pub mod rain;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::error::Result;
use crate::core::types::{GeoPoint, Season};
use crate::data::ZoneData;
use crate::planet::PlanetClimate;

pub use factory::{create_controller, BaseWeather, Decorator};
pub use periodic::PeriodicController;
pub use rain::{RainController, RainOverlay, Region};

/// One layer of a controller chain
#[derive(Debug)]
pub enum Controller {
    Periodic(PeriodicController),
    Rain(RainController),
}

impl Controller {
    pub fn add_planet(&mut self, planet: &Arc<PlanetClimate>) -> Result<()> {
        match self {
            Self::Periodic(c) => c.add_planet(planet),
            Self::Rain(c) => c.add_planet(planet),
        }
    }

    pub fn planets(&self) -> &[Arc<PlanetClimate>] {
        match self {
            Self::Periodic(c) => c.planets(),
            Self::Rain(c) => c.planets(),
        }
    }

    /// Start every worker in the chain, innermost first
    pub fn start(&mut self, data: Arc<dyn ZoneData>) -> Result<()> {
        match self {
            Self::Periodic(c) => c.start(data),
            Self::Rain(c) => c.start(data),
        }
    }

    /// Undo `add_planet` for a chain that will not run
    ///
    /// Planets lose the chain's overlays and can be claimed again.
    pub fn release(&self) -> Result<()> {
        for planet in self.planets() {
            planet.detach_overlays()?;
            planet.release_controller();
        }
        Ok(())
    }

    /// Ask every worker in the chain to stop after its current tick
    pub fn shutdown(&self) {
        match self {
            Self::Periodic(c) => c.shutdown(),
            Self::Rain(c) => c.shutdown(),
        }
    }

    /// Wait for every worker in the chain to exit
    ///
    /// `timeout` bounds the whole chain, not each layer.
    pub async fn join(&mut self, timeout: Duration) -> Result<()> {
        self.join_until(Instant::now() + timeout).await
    }

    pub fn join_until(&mut self, deadline: Instant) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match self {
                Self::Periodic(c) => c.join_until(deadline).await,
                Self::Rain(c) => c.join_until(deadline).await,
            }
        })
    }

    /// Layer names from the outermost inwards
    pub fn layers(&self) -> Vec<&'static str> {
        match self {
            Self::Periodic(_) => vec!["periodic"],
            Self::Rain(c) => {
                let mut layers = vec!["rain"];
                layers.extend(c.inner().layers());
                layers
            }
        }
    }
}

/// Transient weather attached to a planet
#[derive(Debug, Clone)]
pub enum Overlay {
    Rain(Arc<RainOverlay>),
}

impl Overlay {
    /// Current state of the overlay for one planet
    pub fn view(&self, planet: &str) -> Result<OverlayView> {
        match self {
            Self::Rain(rain) => Ok(OverlayView {
                season: Season::Rain,
                regions: rain.planet_data(planet)?,
            }),
        }
    }
}

/// Regions where an overlay forces a season, copied at report time
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub season: Season,
    pub regions: Vec<Region>,
}

impl OverlayView {
    pub fn season_at(&self, point: GeoPoint) -> Option<Season> {
        self.regions
            .iter()
            .any(|region| region.contains(point))
            .then_some(self.season)
    }
}
