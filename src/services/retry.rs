//! Retry policy with exponential backoff and full jitter.
//!
//! Backoff doubles per attempt (configurable multiplier) up to a cap, and
//! each sleep is scaled by a jitter factor drawn uniformly from [0.5, 1.5].
//! Errors marked non-recoverable abort immediately.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RetrySettings;
use crate::domain::ports::{MetricsSink, NoopMetrics};

/// Retry policy driving repeated execution of fallible async operations.
pub struct RetryPolicy {
    settings: RetrySettings,
    rng: Mutex<StdRng>,
    metrics: Arc<dyn MetricsSink>,
}

impl RetryPolicy {
    /// Create a policy from settings with an entropy-seeded RNG.
    pub fn new(settings: RetrySettings) -> Self {
        Self {
            settings,
            rng: Mutex::new(StdRng::from_entropy()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(RetrySettings::default())
    }

    /// Seed the jitter RNG for deterministic tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &RetrySettings {
        &self.settings
    }

    /// Execute `operation` with retry. The operation is invoked at most
    /// `max_attempts` times; non-recoverable errors abort immediately.
    pub async fn execute<F, Fut, T>(&self, name: &str, mut operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let mut last_error: Option<DomainError> = None;

        for attempt in 0..self.settings.max_attempts {
            let attempt_label = (attempt + 1).to_string();
            self.metrics.incr_counter(
                "retry_attempts_total",
                &[("op", name), ("attempt", attempt_label.as_str())],
            );

            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.recoverable() {
                        error!(op = name, error = %err, "non_retryable_error");
                        return Err(err);
                    }

                    let exhausted = attempt + 1 >= self.settings.max_attempts;
                    if exhausted {
                        last_error = Some(err);
                        break;
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        op = name,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retry_attempt_failed"
                    );
                    last_error = Some(err);
                    sleep(delay).await;
                }
            }
        }

        error!(op = name, attempts = self.settings.max_attempts, "retry_exhausted");
        Err(last_error.unwrap_or_else(|| DomainError::Internal("retry exhausted".to_string())))
    }

    /// Delay before the retry following attempt `attempt` (0-indexed):
    /// `min(initial x multiplier^attempt, max)` scaled by jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = (self.settings.initial_delay_ms as f64
            * self.settings.multiplier.powi(attempt as i32))
        .min(self.settings.max_delay_ms as f64);

        let jittered_ms = if self.settings.jitter {
            let factor: f64 = {
                let mut rng = self.rng.lock().expect("retry rng poisoned");
                rng.gen_range(0.5..1.5)
            };
            base_ms * factor
        } else {
            base_ms
        };

        Duration::from_millis(jittered_ms as u64)
    }
}
