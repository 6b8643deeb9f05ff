//! Whole-simulation lifecycle: load, start, report, shut down

use std::io::Write;
use std::sync::Arc;

use tokio::time::Instant;

use crate::controller::Controller;
use crate::core::config::WeatherConfig;
use crate::core::error::{Result, WeatherError};
use crate::data::{DataReader, ZoneData};
use crate::planet::loader::load_planets;
use crate::planet::Planet;

pub struct WeatherSystem {
    config: WeatherConfig,
    reader: Arc<DataReader>,
    planets: Vec<Planet>,
    controllers: Vec<Controller>,
    started: bool,
}

impl WeatherSystem {
    /// Load planets and build their controller chains; nothing runs yet
    pub fn new(reader: DataReader, config: WeatherConfig) -> Result<Self> {
        config.validate()?;
        let data = reader.snapshot()?;
        let loaded = load_planets(&data, &config);
        tracing::info!(
            planets = loaded.planets.len(),
            chains = loaded.controllers.len(),
            skipped = loaded.failures.len(),
            "weather system loaded"
        );
        Ok(Self {
            config,
            reader: Arc::new(reader),
            planets: loaded.planets,
            controllers: loaded.controllers,
            started: false,
        })
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn data(&self) -> &DataReader {
        &self.reader
    }

    /// Start the data refresh and every controller chain
    ///
    /// A chain that fails to start (bad revolution period, ...) is dropped.
    /// Its planets keep their current seasons, lose the chain's overlays and
    /// are free to be claimed again.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(WeatherError::Configuration("weather system already started".into()));
        }
        self.reader
            .start(self.config.data_refresh(), self.config.max_refresh_failures)?;

        let data: Arc<dyn ZoneData> = self.reader.clone();
        let mut running = Vec::with_capacity(self.controllers.len());
        for mut controller in self.controllers.drain(..) {
            let planets: Vec<String> = controller.planets().iter().map(|p| p.name().to_string()).collect();
            let failure = match controller.start(data.clone()) {
                Ok(()) => {
                    running.push(controller);
                    continue;
                }
                Err(e) if e.is_fatal() => e,
                Err(e) => {
                    tracing::warn!(planets = ?planets, error = %e, "controller chain not started");
                    controller.shutdown();
                    match controller.release() {
                        Ok(()) => continue,
                        Err(release) => release,
                    }
                }
            };
            for started in &running {
                started.shutdown();
            }
            self.reader.shutdown();
            return Err(failure);
        }
        self.controllers = running;
        self.started = true;
        tracing::info!(chains = self.controllers.len(), "weather system started");
        Ok(())
    }

    /// Report every planet in load order
    ///
    /// A failing planet is logged and skipped; the failures are returned.
    /// A dead data source aborts the whole cycle.
    pub fn report_all<W: Write>(&mut self, out: &mut W) -> Result<Vec<(String, WeatherError)>> {
        let mut failures = Vec::new();
        for planet in &mut self.planets {
            match planet.report(self.reader.as_ref(), out) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(planet = planet.name(), error = %e, "report aborted");
                    failures.push((planet.name().to_string(), e));
                }
            }
        }
        out.flush()?;
        Ok(failures)
    }

    /// Stop every worker and wait for all of them within the configured timeout
    ///
    /// Returns the first error any worker ended with.
    pub async fn shutdown(&mut self) -> Result<()> {
        for controller in &self.controllers {
            controller.shutdown();
        }
        self.reader.shutdown();

        let deadline = Instant::now() + self.config.shutdown_timeout();
        let mut outcome = Ok(());
        for controller in &mut self.controllers {
            let joined = controller.join_until(deadline).await;
            if outcome.is_ok() {
                outcome = joined;
            }
        }
        let joined = self.reader.join_until(deadline).await;
        if outcome.is_ok() {
            outcome = joined;
        }
        tracing::info!("weather system stopped");
        outcome
    }
}
