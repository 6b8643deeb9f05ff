pub mod config;
pub mod error;
pub mod types;

pub use config::WeatherConfig;
pub use error::{Result, WeatherError};
