pub mod scheduler;
pub mod system;

pub use scheduler::{spawn_periodic, StopSignal, Worker};
pub use system::WeatherSystem;
