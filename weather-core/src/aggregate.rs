//! Concurrent fan-out/fan-in over all configured providers.
//!
//! Every call to [`Aggregator::temperature`] spawns one task per provider and
//! waits for their outcomes on two bounded channels, one for readings and one
//! for errors. The mean is only produced when every provider succeeds; the
//! first error to arrive wins and the remaining tasks are aborted.

use std::{sync::Arc, time::Instant};

use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, warn};

use crate::provider::TemperatureProvider;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no temperature providers configured")]
    NoProviders,

    /// Provider tasks ended without reporting (e.g. a provider panicked).
    #[error("only {received} of {expected} providers reported a result")]
    Incomplete { expected: usize, received: usize },
}

/// Combines readings from a fixed set of providers.
///
/// Cheap to clone and safe to share between concurrent requests; each call
/// owns its own channels and tasks.
#[derive(Debug, Clone)]
pub struct Aggregator {
    providers: Arc<[Arc<dyn TemperatureProvider>]>,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn TemperatureProvider>>) -> Self {
        Self { providers: providers.into() }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in iteration order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Mean temperature for `city` in Kelvin across all providers.
    ///
    /// # Errors
    ///
    /// Returns the first provider error observed, unchanged, or an
    /// [`AggregateError`] when there are no providers or a task vanished.
    pub async fn temperature(&self, city: &str) -> anyhow::Result<f64> {
        let expected = self.providers.len();
        if expected == 0 {
            return Err(AggregateError::NoProviders.into());
        }

        let started = Instant::now();
        let city: Arc<str> = Arc::from(city);

        // Capacity `expected` so no task can block on send after we stop listening.
        let (value_tx, mut value_rx) = mpsc::channel::<f64>(expected);
        let (error_tx, mut error_rx) = mpsc::channel::<anyhow::Error>(expected);

        // Dropped on return, which aborts anything still in flight.
        let mut tasks = JoinSet::new();
        for provider in self.providers.iter() {
            let provider = Arc::clone(provider);
            let city = Arc::clone(&city);
            let value_tx = value_tx.clone();
            let error_tx = error_tx.clone();

            tasks.spawn(async move {
                // A closed channel means the coordinator already returned.
                match provider.temperature(&city).await {
                    Ok(kelvin) => {
                        let _ = value_tx.send(kelvin).await;
                    }
                    Err(err) => {
                        let _ = error_tx.send(err).await;
                    }
                }
            });
        }
        drop(value_tx);
        drop(error_tx);

        let mut sum = 0.0;
        let mut received = 0;
        while received < expected {
            tokio::select! {
                Some(kelvin) = value_rx.recv() => {
                    sum += kelvin;
                    received += 1;
                }
                Some(err) = error_rx.recv() => {
                    warn!(
                        %city, error = %err, received, expected,
                        "provider failed, abandoning aggregate"
                    );
                    return Err(err);
                }
                else => {
                    return Err(AggregateError::Incomplete { expected, received }.into());
                }
            }
        }

        let mean = sum / expected as f64;
        debug!(
            %city, mean, providers = expected, elapsed = ?started.elapsed(),
            "aggregated temperature"
        );
        Ok(mean)
    }
}
