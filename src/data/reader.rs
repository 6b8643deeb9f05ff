//! Refreshing reader over the JSON dataset
//!
//! The reader loads the dataset once when opened and, once started,
//! reloads it on a fixed interval. Readers clone the current `Arc<DataSet>`
//! under the lock and query it without holding the lock.
//!
//! After `max_failures` consecutive failed reloads the source is marked
//! dead: the refresh worker exits and every query returns
//! `WeatherError::DataSource`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{DataSet, ZoneData};
use crate::core::error::{Result, WeatherError};
use crate::core::types::{LatitudeBand, Metric, MetricRange, Season};
use crate::simulation::scheduler::{spawn_periodic, StopSignal, Worker};

#[derive(Debug)]
struct Cache {
    data: Arc<DataSet>,
    failure: Option<String>,
}

#[derive(Debug)]
pub struct DataReader {
    source: Option<PathBuf>,
    cache: Arc<Mutex<Cache>>,
    worker: Mutex<Option<Worker>>,
}

impl DataReader {
    /// Load `path` and keep it as the reload source
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = DataSet::from_file(&path)?;
        tracing::info!(source = %path.display(), planets = data.planets.len(), "dataset loaded");
        Ok(Self {
            source: Some(path),
            cache: Self::new_cache(data),
            worker: Mutex::new(None),
        })
    }

    /// Reader over fixed data; `start` is a no-op
    pub fn from_data(data: DataSet) -> Self {
        Self {
            source: None,
            cache: Self::new_cache(data),
            worker: Mutex::new(None),
        }
    }

    fn new_cache(data: DataSet) -> Arc<Mutex<Cache>> {
        Arc::new(Mutex::new(Cache {
            data: Arc::new(data),
            failure: None,
        }))
    }

    /// Current dataset, or the persisted failure if the source died
    pub fn snapshot(&self) -> Result<Arc<DataSet>> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("data cache"))?;
        match &cache.failure {
            Some(reason) => Err(WeatherError::DataSource(reason.clone())),
            None => Ok(cache.data.clone()),
        }
    }

    /// Start reloading the source every `interval`
    pub fn start(&self, interval: Duration, max_failures: u32) -> Result<()> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("data reader worker"))?;
        if worker.is_some() {
            return Err(WeatherError::Configuration("data reader already started".into()));
        }

        let cache = self.cache.clone();
        let mut failures = 0u32;
        *worker = Some(spawn_periodic("data-reader", interval, StopSignal::new(), move || {
            match DataSet::from_file(&path) {
                Ok(data) => {
                    failures = 0;
                    let mut cache = cache
                        .lock()
                        .map_err(|_| WeatherError::LockPoisoned("data cache"))?;
                    cache.data = Arc::new(data);
                    Ok(())
                }
                Err(e) => {
                    failures += 1;
                    if failures < max_failures {
                        return Err(e);
                    }
                    let reason = format!("cannot load {}: {}", path.display(), e);
                    let mut cache = cache
                        .lock()
                        .map_err(|_| WeatherError::LockPoisoned("data cache"))?;
                    cache.failure = Some(reason.clone());
                    Err(WeatherError::DataSource(reason))
                }
            }
        }));
        Ok(())
    }

    /// Request the refresh worker to stop
    pub fn shutdown(&self) {
        if let Ok(worker) = self.worker.lock() {
            if let Some(worker) = worker.as_ref() {
                worker.shutdown();
            }
        }
    }

    /// Wait for the refresh worker to exit
    pub async fn join(&self, timeout: Duration) -> Result<()> {
        self.join_until(Instant::now() + timeout).await
    }

    pub async fn join_until(&self, deadline: Instant) -> Result<()> {
        let worker = self
            .worker
            .lock()
            .map_err(|_| WeatherError::LockPoisoned("data reader worker"))?
            .take();
        match worker {
            Some(mut worker) => worker.join_until(deadline).await,
            None => Ok(()),
        }
    }
}

impl ZoneData for DataReader {
    fn revolution_period(&self, planet: &str) -> Result<u64> {
        self.snapshot()?.revolution_period(planet)
    }

    fn zones(&self, planet: &str) -> Result<BTreeMap<String, LatitudeBand>> {
        self.snapshot()?.zones(planet)
    }

    fn rain_eligible_zones(&self, planet: &str) -> Result<BTreeSet<String>> {
        self.snapshot()?.rain_eligible_zones(planet)
    }

    fn zone_of(&self, planet: &str, latitude: f64) -> Result<String> {
        self.snapshot()?.zone_of(planet, latitude)
    }

    fn range(&self, planet: &str, zone: &str, season: Season, metric: Metric) -> Result<MetricRange> {
        self.snapshot()?.range(planet, zone, season, metric)
    }
}
