//! Build planets and their controller chains from the dataset

use crate::controller::{create_controller, BaseWeather, Controller};
use crate::core::config::WeatherConfig;
use crate::core::error::{Result, WeatherError};
use crate::data::{DataSet, PlanetData};

use super::Planet;

/// Planets in dataset order plus the chains that drive them
#[derive(Debug, Default)]
pub struct LoadedPlanets {
    pub planets: Vec<Planet>,
    pub controllers: Vec<Controller>,
    /// Planets whose chain could not be built, with the reason
    pub failures: Vec<(String, WeatherError)>,
}

/// Create every supported planet in `data` and bind a controller chain to it
///
/// A bad chain for one planet does not stop the others; the planet is still
/// loaded and keeps its initial seasons.
pub fn load_planets(data: &DataSet, config: &WeatherConfig) -> LoadedPlanets {
    let mut loaded = LoadedPlanets::default();

    for planet_data in &data.planets {
        let base = planet_data.base_weather.as_deref().unwrap_or_default();
        if let Err(e) = base.parse::<BaseWeather>() {
            tracing::warn!(planet = %planet_data.name, error = %e, "skipping planet");
            loaded.failures.push((planet_data.name.clone(), e));
            continue;
        }

        let planet = Planet::from_data(planet_data);
        match build_chain(&planet, planet_data, config) {
            Ok(controller) => {
                tracing::info!(
                    planet = planet.name(),
                    layers = ?controller.layers(),
                    "controller chain built"
                );
                loaded.controllers.push(controller);
            }
            Err(e) => {
                tracing::warn!(planet = planet.name(), error = %e, "planet runs without controllers");
                loaded.failures.push((planet.name().to_string(), e));
            }
        }
        loaded.planets.push(planet);
    }

    loaded
}

fn build_chain(planet: &Planet, data: &PlanetData, config: &WeatherConfig) -> Result<Controller> {
    let base = data.base_weather.as_deref().unwrap_or_default();
    let mut controller = create_controller(base, &data.weather_decorators, config)?;
    controller.add_planet(planet.climate())?;
    Ok(controller)
}
