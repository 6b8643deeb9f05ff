//! Periodic workers on the tokio runtime
//!
//! Each worker owns a tick closure and an interval. Ticks run on the
//! blocking pool since they read files and take std locks. Stopping is
//! cooperative: the stop flag is checked once per iteration after the timer
//! fires, so a worker exits at most one interval after `StopSignal::request`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::error::{Result, WeatherError};

/// Shared cooperative stop flag
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a running periodic worker
#[derive(Debug)]
pub struct Worker {
    name: String,
    stop: StopSignal,
    handle: Option<JoinHandle<Result<()>>>,
}

impl Worker {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the worker to stop; does not wait for it
    pub fn shutdown(&self) {
        self.stop.request();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait up to `timeout` for the worker to exit and return its outcome
    ///
    /// A worker that overruns the timeout is aborted.
    pub async fn join(&mut self, timeout: Duration) -> Result<()> {
        self.join_until(Instant::now() + timeout).await
    }

    /// `join` against a deadline shared with other workers
    pub async fn join_until(&mut self, deadline: Instant) -> Result<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(WeatherError::WorkerFailed {
                name: self.name.clone(),
                detail: join_err.to_string(),
            }),
            Err(_) => {
                handle.abort();
                tracing::warn!(worker = %self.name, "worker did not stop in time, aborted");
                Err(WeatherError::ShutdownTimeout(self.name.clone()))
            }
        }
    }
}

/// Spawn `tick` every `period` until `stop` is requested
///
/// The first tick runs immediately. A failing tick is logged and the loop
/// carries on, unless the error is fatal, in which case the worker exits
/// and the error is reported from `Worker::join`.
pub fn spawn_periodic<F>(name: impl Into<String>, period: Duration, stop: StopSignal, mut tick: F) -> Worker
where
    F: FnMut() -> Result<()> + Send + 'static,
{
    let name = name.into();
    let task_name = name.clone();
    let task_stop = stop.clone();
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(worker = %task_name, period_ms = period.as_millis() as u64, "worker started");

        loop {
            interval.tick().await;
            if task_stop.is_requested() {
                break;
            }
            // The closure travels to the blocking pool and back each tick
            let ran = tokio::task::spawn_blocking(move || {
                let outcome = tick();
                (tick, outcome)
            })
            .await;
            let outcome = match ran {
                Ok((returned, outcome)) => {
                    tick = returned;
                    outcome
                }
                Err(e) => {
                    return Err(WeatherError::WorkerFailed {
                        name: task_name,
                        detail: e.to_string(),
                    });
                }
            };

            if let Err(e) = outcome {
                if e.is_fatal() {
                    tracing::error!(worker = %task_name, error = %e, "worker stopping on fatal error");
                    return Err(e);
                }
                tracing::warn!(worker = %task_name, error = %e, "tick failed");
            }
        }

        tracing::info!(worker = %task_name, "worker stopped");
        Ok(())
    });

    Worker {
        name,
        stop,
        handle: Some(handle),
    }
}
