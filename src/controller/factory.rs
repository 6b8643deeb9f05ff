//! Build controller chains from dataset identifiers

use std::str::FromStr;

use super::{Controller, PeriodicController, RainController};
use crate::core::config::WeatherConfig;
use crate::core::error::{Result, WeatherError};

/// Base weather of a planet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseWeather {
    Periodic,
}

impl FromStr for BaseWeather {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "periodic" => Ok(Self::Periodic),
            other => Err(WeatherError::UnsupportedController(format!(
                "base weather '{}'",
                other
            ))),
        }
    }
}

/// Overlay layered on top of a base weather
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
    Rain,
}

impl FromStr for Decorator {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rain" => Ok(Self::Rain),
            other => Err(WeatherError::UnsupportedController(format!(
                "weather decorator '{}'",
                other
            ))),
        }
    }
}

/// Build a chain: the base controller, wrapped by each decorator in order
///
/// Every identifier is validated before anything is built.
pub fn create_controller<I>(base_weather: &str, decorators: I, config: &WeatherConfig) -> Result<Controller>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let base: BaseWeather = base_weather.parse()?;
    let decorators = decorators
        .into_iter()
        .map(|d| d.as_ref().parse::<Decorator>())
        .collect::<Result<Vec<_>>>()?;

    let mut controller = match base {
        BaseWeather::Periodic => Controller::Periodic(PeriodicController::new(config.season_tick())),
    };

    for (layer, decorator) in decorators.into_iter().enumerate() {
        controller = match decorator {
            Decorator::Rain => Controller::Rain(RainController::new(
                controller,
                config.rain_tick(),
                config.max_rain_regions,
                config.seed.map(|s| s.wrapping_add(layer as u64)),
            )),
        };
    }

    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_without_decorators() {
        let controller = create_controller("periodic", Vec::<&str>::new(), &WeatherConfig::default()).unwrap();
        assert_eq!(controller.layers(), ["periodic"]);
    }

    #[test]
    fn test_decorators_wrap_in_order() {
        let controller = create_controller("periodic", ["rain", "rain"], &WeatherConfig::default()).unwrap();
        assert_eq!(controller.layers(), ["rain", "rain", "periodic"]);
    }

    #[test]
    fn test_unknown_base_weather_rejected() {
        let err = create_controller("chaotic", Vec::<&str>::new(), &WeatherConfig::default()).unwrap_err();
        assert!(matches!(err, WeatherError::UnsupportedController(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_decorator_rejected() {
        let err = create_controller("periodic", ["rain", "storm"], &WeatherConfig::default()).unwrap_err();
        assert!(err.to_string().contains("storm"));
    }
}
