//! Circuit breaker pattern for failure detection and recovery.
//!
//! Each named operation gets its own breaker. A breaker trips open after a
//! run of consecutive failures, rejects calls while open, and probes
//! recovery through a half-open state. Per-call deadlines expire into
//! failures.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CircuitBreakerSettings;
use crate::domain::ports::{MetricsSink, NoopMetrics};

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are blocked.
    Open,
    /// Testing whether the operation has recovered.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    /// Numeric encoding for the state gauge.
    pub fn gauge_value(&self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::Open => 1.0,
            Self::HalfOpen => 2.0,
        }
    }
}

/// Individual circuit breaker state machine.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    /// Operation name this circuit guards.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures while closed.
    pub failure_count: u32,
    /// Consecutive successes while half-open.
    pub success_count: u32,
    /// When the last failure happened.
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Total times this circuit opened.
    pub trip_count: u32,
}

impl CircuitBreaker {
    /// Create a closed circuit for a named operation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_at: None,
            trip_count: 0,
        }
    }

    /// Whether a call may proceed, transitioning open -> half-open once the
    /// recovery timeout has elapsed since the last failure.
    pub fn allows(&mut self, settings: &CircuitBreakerSettings, now: DateTime<Utc>) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = self.last_failure_at.is_some_and(|at| {
                    (now - at).num_seconds() >= settings.recovery_timeout_secs as i64
                });
                if recovered {
                    self.half_open();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&mut self, settings: &CircuitBreakerSettings) {
        match self.state {
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= settings.success_threshold {
                    self.close();
                }
            }
            CircuitState::Closed => self.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    /// Record a failed call. Timeouts count as failures.
    pub fn record_failure(&mut self, settings: &CircuitBreakerSettings, now: DateTime<Utc>) {
        self.last_failure_at = Some(now);
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= settings.failure_threshold {
                    self.open();
                }
            }
            CircuitState::HalfOpen => self.open(),
            CircuitState::Open => {}
        }
    }

    /// Earliest time a call will be admitted again.
    pub fn retry_after(&self, settings: &CircuitBreakerSettings) -> DateTime<Utc> {
        let base = self.last_failure_at.unwrap_or_else(Utc::now);
        base + chrono::Duration::seconds(settings.recovery_timeout_secs as i64)
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.success_count = 0;
        self.trip_count += 1;
        warn!(circuit = %self.name, failures = self.failure_count, "circuit_breaker_opened");
    }

    fn half_open(&mut self) {
        self.state = CircuitState::HalfOpen;
        self.success_count = 0;
        info!(circuit = %self.name, "circuit_breaker_half_open");
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.success_count = 0;
        info!(circuit = %self.name, "circuit_breaker_closed");
    }

    /// Manually reset the circuit to closed.
    pub fn reset(&mut self) {
        self.close();
        self.trip_count = 0;
        self.last_failure_at = None;
    }
}

/// Snapshot of one circuit for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitStats {
    pub name: String,
    pub state: String,
    pub failure_count: u32,
    pub trip_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Service managing one breaker per named operation.
pub struct CircuitBreakerService {
    settings: CircuitBreakerSettings,
    circuits: RwLock<HashMap<String, CircuitBreaker>>,
    metrics: Arc<dyn MetricsSink>,
}

impl CircuitBreakerService {
    /// Create a service with the given settings.
    pub fn new(settings: CircuitBreakerSettings) -> Self {
        Self {
            settings,
            circuits: RwLock::new(HashMap::new()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerSettings::default())
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }

    /// Execute `operation` through the named circuit with the per-call
    /// deadline applied. Rejected calls fail with `CircuitOpen` without
    /// invoking the operation.
    pub async fn call<F, Fut, T>(&self, name: &str, operation: F) -> DomainResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let now = Utc::now();
        {
            let mut circuits = self.circuits.write().await;
            let circuit = circuits
                .entry(name.to_string())
                .or_insert_with(|| CircuitBreaker::new(name));

            if !circuit.allows(&self.settings, now) {
                let retry_after = circuit.retry_after(&self.settings);
                self.publish_state(name, circuit.state);
                return Err(DomainError::CircuitOpen {
                    circuit: name.to_string(),
                    retry_after,
                });
            }
            self.publish_state(name, circuit.state);
        }

        let deadline = Duration::from_secs(self.settings.call_timeout_secs);
        let outcome = match tokio::time::timeout(deadline, operation()).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::Timeout(format!(
                "{name} exceeded {}s deadline",
                self.settings.call_timeout_secs
            ))),
        };

        let mut circuits = self.circuits.write().await;
        let circuit = circuits
            .entry(name.to_string())
            .or_insert_with(|| CircuitBreaker::new(name));

        match &outcome {
            Ok(_) => circuit.record_success(&self.settings),
            Err(_) => {
                let was_closed = circuit.state != CircuitState::Open;
                circuit.record_failure(&self.settings, Utc::now());
                if was_closed && circuit.state == CircuitState::Open {
                    self.metrics
                        .incr_counter("circuit_breaker_trips_total", &[("circuit", name)]);
                }
            }
        }
        self.publish_state(name, circuit.state);

        outcome
    }

    /// Pre-register a circuit so its state is observable before first use.
    pub async fn register(&self, name: &str) {
        let mut circuits = self.circuits.write().await;
        circuits
            .entry(name.to_string())
            .or_insert_with(|| CircuitBreaker::new(name));
        self.publish_state(name, CircuitState::Closed);
    }

    /// State of a named circuit, if it exists.
    pub async fn state(&self, name: &str) -> Option<CircuitState> {
        self.circuits.read().await.get(name).map(|c| c.state)
    }

    /// Snapshot of every circuit.
    pub async fn stats(&self) -> Vec<CircuitStats> {
        let circuits = self.circuits.read().await;
        let mut stats: Vec<CircuitStats> = circuits
            .values()
            .map(|c| CircuitStats {
                name: c.name.clone(),
                state: c.state.as_str().to_string(),
                failure_count: c.failure_count,
                trip_count: c.trip_count,
                last_failure_at: c.last_failure_at,
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Manually reset a circuit.
    pub async fn reset(&self, name: &str) {
        let mut circuits = self.circuits.write().await;
        if let Some(circuit) = circuits.get_mut(name) {
            circuit.reset();
        }
    }

    fn publish_state(&self, name: &str, state: CircuitState) {
        self.metrics.set_gauge(
            "circuit_breaker_state",
            &[("circuit", name)],
            state.gauge_value(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_settings() -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            failure_threshold: 3,
            recovery_timeout_secs: 60,
            success_threshold: 2,
            call_timeout_secs: 1,
        }
    }

    #[test]
    fn test_opens_after_consecutive_failures() {
        let settings = fast_settings();
        let mut circuit = CircuitBreaker::new("op");
        let now = Utc::now();

        circuit.record_failure(&settings, now);
        circuit.record_failure(&settings, now);
        assert_eq!(circuit.state, CircuitState::Closed);

        circuit.record_failure(&settings, now);
        assert_eq!(circuit.state, CircuitState::Open);
        assert_eq!(circuit.trip_count, 1);
    }

    #[test]
    fn test_success_resets_consecutive_count() {
        let settings = fast_settings();
        let mut circuit = CircuitBreaker::new("op");
        let now = Utc::now();

        circuit.record_failure(&settings, now);
        circuit.record_failure(&settings, now);
        circuit.record_success(&settings);
        circuit.record_failure(&settings, now);
        circuit.record_failure(&settings, now);
        assert_eq!(circuit.state, CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_recovery_timeout() {
        let settings = fast_settings();
        let mut circuit = CircuitBreaker::new("op");
        let past = Utc::now() - chrono::Duration::seconds(120);

        for _ in 0..3 {
            circuit.record_failure(&settings, past);
        }
        assert_eq!(circuit.state, CircuitState::Open);
        assert!(!circuit.allows(&settings, past + chrono::Duration::seconds(30)));

        // Recovery timeout elapsed: probe allowed
        assert!(circuit.allows(&settings, Utc::now()));
        assert_eq!(circuit.state, CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_success_closes_failure_reopens() {
        let settings = fast_settings();
        let mut circuit = CircuitBreaker::new("op");
        let now = Utc::now();

        for _ in 0..3 {
            circuit.record_failure(&settings, now);
        }
        circuit.half_open();

        circuit.record_success(&settings);
        assert_eq!(circuit.state, CircuitState::HalfOpen);
        circuit.record_success(&settings);
        assert_eq!(circuit.state, CircuitState::Closed);

        // Trip again, probe, fail -> straight back to open
        for _ in 0..3 {
            circuit.record_failure(&settings, now);
        }
        circuit.half_open();
        circuit.record_failure(&settings, now);
        assert_eq!(circuit.state, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_service_rejects_without_invoking() {
        let service = CircuitBreakerService::new(fast_settings());
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let _: DomainResult<()> = service
                .call("op", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::Internal("boom".into()))
                })
                .await;
        }
        assert_eq!(service.state("op").await, Some(CircuitState::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Next call is rejected before the operation runs
        let calls_clone = Arc::clone(&calls);
        let result: DomainResult<()> = service
            .call("op", move || async move {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(DomainError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_call_deadline_counts_as_failure() {
        let service = CircuitBreakerService::new(CircuitBreakerSettings {
            call_timeout_secs: 1,
            failure_threshold: 1,
            ..fast_settings()
        });

        let result: DomainResult<()> = service
            .call("slow_op", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(DomainError::Timeout(_))));
        assert_eq!(service.state("slow_op").await, Some(CircuitState::Open));
    }

    #[tokio::test]
    async fn test_stats_and_reset() {
        let service = CircuitBreakerService::new(fast_settings());
        service.register("agent_activation").await;
        let _: DomainResult<()> = service
            .call("agent_activation", || async {
                Err(DomainError::Internal("x".into()))
            })
            .await;

        let stats = service.stats().await;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].failure_count, 1);

        service.reset("agent_activation").await;
        assert_eq!(service.state("agent_activation").await, Some(CircuitState::Closed));
    }
}
