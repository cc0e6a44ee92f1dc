//! Resilience composition: circuit breaker wrapped around retry.
//!
//! An open circuit rejects before any attempt runs; one exhausted retry
//! sequence counts as a single failure against the circuit.

use std::future::Future;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CircuitBreakerSettings, RetrySettings};
use crate::domain::ports::MetricsSink;
use crate::services::circuit_breaker::CircuitBreakerService;
use crate::services::retry::RetryPolicy;

/// Circuits pre-registered for the engine's critical operations.
pub const KNOWN_CIRCUITS: [&str; 4] = [
    "agent_activation",
    "agent_coordination",
    "democratic_decision",
    "context_management",
];

/// Bundles the retry policy and circuit breaker service behind one call.
pub struct ResilienceKit {
    breakers: CircuitBreakerService,
    retry: RetryPolicy,
    seed: Option<u64>,
}

impl ResilienceKit {
    /// Create a kit from the two settings blocks.
    pub fn new(circuit: CircuitBreakerSettings, retry: RetrySettings) -> Self {
        Self {
            breakers: CircuitBreakerService::new(circuit),
            retry: RetryPolicy::new(retry),
            seed: None,
        }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerSettings::default(), RetrySettings::default())
    }

    /// Seed the retry jitter RNG for deterministic tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.retry = RetryPolicy::new(self.retry.settings().clone()).with_seed(seed);
        self
    }

    /// Wire a metrics sink into both layers.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.breakers = CircuitBreakerService::new(self.breakers.settings().clone())
            .with_metrics(Arc::clone(&metrics));
        let mut retry =
            RetryPolicy::new(self.retry.settings().clone()).with_metrics(metrics);
        if let Some(seed) = self.seed {
            retry = retry.with_seed(seed);
        }
        self.retry = retry;
        self
    }

    /// Pre-register the engine's known circuits.
    pub async fn register_known_circuits(&self) {
        for name in KNOWN_CIRCUITS {
            self.breakers.register(name).await;
        }
    }

    /// Execute `operation` under circuit_breaker(retry(op)) for the named
    /// circuit.
    pub async fn execute<F, Fut, T>(&self, name: &str, operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = DomainResult<T>> + Send,
        T: Send,
    {
        let retry = &self.retry;
        self.breakers
            .call(name, || retry.execute(name, operation))
            .await
    }

    /// The circuit breaker service.
    pub fn breakers(&self) -> &CircuitBreakerService {
        &self.breakers
    }

    /// The retry policy.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::services::circuit_breaker::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_kit() -> ResilienceKit {
        ResilienceKit::new(
            CircuitBreakerSettings {
                failure_threshold: 2,
                recovery_timeout_secs: 60,
                success_threshold: 1,
                call_timeout_secs: 5,
            },
            RetrySettings {
                max_attempts: 3,
                initial_delay_ms: 5,
                max_delay_ms: 20,
                multiplier: 2.0,
                jitter: true,
            },
        )
        .with_seed(11)
    }

    #[tokio::test]
    async fn test_retry_inside_one_circuit_failure() {
        let kit = fast_kit();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_outer = Arc::clone(&calls);
        let result: DomainResult<()> = kit
            .execute("agent_coordination", move || {
                let calls = Arc::clone(&calls_outer);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::Coordination("transient".into()))
                }
            })
            .await;

        assert!(result.is_err());
        // Three retry attempts ran, but the circuit counts one failure
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            kit.breakers().state("agent_coordination").await,
            Some(CircuitState::Closed)
        );

        // A second exhausted sequence trips the 2-failure circuit
        let calls_outer = Arc::clone(&calls);
        let _: DomainResult<()> = kit
            .execute("agent_coordination", move || {
                let calls = Arc::clone(&calls_outer);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::Coordination("transient".into()))
                }
            })
            .await;
        assert_eq!(
            kit.breakers().state("agent_coordination").await,
            Some(CircuitState::Open)
        );

        // Open circuit rejects without invoking the operation
        let calls_outer = Arc::clone(&calls);
        let result: DomainResult<()> = kit
            .execute("agent_coordination", move || {
                let calls = Arc::clone(&calls_outer);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert!(matches!(result, Err(DomainError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_known_circuits_registered() {
        let kit = fast_kit();
        kit.register_known_circuits().await;
        for name in KNOWN_CIRCUITS {
            assert_eq!(kit.breakers().state(name).await, Some(CircuitState::Closed));
        }
    }

    #[tokio::test]
    async fn test_resource_exhaustion_not_retried() {
        let kit = fast_kit();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_outer = Arc::clone(&calls);
        let result: DomainResult<()> = kit
            .execute("agent_activation", move || {
                let calls = Arc::clone(&calls_outer);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::ResourceExhausted("no capacity".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::ResourceExhausted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
