//! Health monitoring for the coordination engine.
//!
//! Readiness requires a populated registry and a live coordinator;
//! liveness requires a recent full health check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::ports::{MetricsSink, NoopMetrics};
use crate::services::agent_registry::AgentRegistryService;
use crate::services::coordinator::SwarmHiveCoordinator;

/// Maximum age of the last full check for the process to count as alive.
const LIVENESS_WINDOW_SECS: i64 = 300;

/// Overall component health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// One component check inside a full health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckEntry {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
}

/// Result of a full health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    pub checks: Vec<HealthCheckEntry>,
}

/// Periodic health monitor over the engine's components.
pub struct HealthMonitor {
    registry: Arc<AgentRegistryService>,
    coordinator: Arc<SwarmHiveCoordinator>,
    last_full_check: RwLock<Option<DateTime<Utc>>>,
    metrics: Arc<dyn MetricsSink>,
}

impl HealthMonitor {
    /// Create a monitor over the registry and coordinator.
    pub fn new(registry: Arc<AgentRegistryService>, coordinator: Arc<SwarmHiveCoordinator>) -> Self {
        Self {
            registry,
            coordinator,
            last_full_check: RwLock::new(None),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Ready when the registry is populated and the coordinator responds.
    pub async fn readiness(&self) -> bool {
        if self.registry.is_empty().await {
            return false;
        }
        // A responding coordinator is an up coordinator
        let _ = self.coordinator.active_coordination_count().await;
        true
    }

    /// Alive when the last full check happened within the liveness window.
    pub async fn liveness(&self) -> bool {
        match *self.last_full_check.read().await {
            Some(at) => (Utc::now() - at).num_seconds() <= LIVENESS_WINDOW_SECS,
            None => false,
        }
    }

    /// Run every component check and store the report timestamp.
    pub async fn full_health_check(&self) -> HealthReport {
        let started = tokio::time::Instant::now();
        let mut checks = Vec::new();

        let registry_size = self.registry.len().await;
        checks.push(HealthCheckEntry {
            name: "agent_registry".to_string(),
            status: if registry_size > 0 {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: format!("{registry_size} agents registered"),
        });

        let overview = self.coordinator.swarm().overview().await;
        checks.push(HealthCheckEntry {
            name: "swarm_engine".to_string(),
            status: HealthStatus::Healthy,
            message: format!("{} active swarms", overview.active_swarms),
        });

        let hive_status = self.coordinator.hive().status().await;
        let hive_health = if hive_status.collective_confidence >= 0.3 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        checks.push(HealthCheckEntry {
            name: "hive_engine".to_string(),
            status: hive_health,
            message: format!(
                "{} nodes, {} fragments, collective confidence {:.2}",
                hive_status.nodes, hive_status.memory_fragments, hive_status.collective_confidence
            ),
        });

        let overall = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let now = Utc::now();
        *self.last_full_check.write().await = Some(now);

        let duration = started.elapsed().as_secs_f64();
        self.metrics
            .observe_histogram("health_check_duration_seconds", &[], duration);

        info!(status = overall.as_str(), checks = checks.len(), "health_check_completed");

        HealthReport {
            status: overall,
            timestamp: now,
            duration_ms: duration * 1000.0,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CoordinatorConfig, HiveConfig};
    use crate::services::hive::HiveService;
    use crate::services::hive_memory::CollectiveMemory;
    use crate::services::swarm::SwarmService;

    async fn monitor_with(registry: Arc<AgentRegistryService>) -> HealthMonitor {
        let coordinator = Arc::new(SwarmHiveCoordinator::new(
            CoordinatorConfig::default(),
            Arc::clone(&registry),
            SwarmService::with_defaults(),
            HiveService::new(HiveConfig::fast(), Arc::new(CollectiveMemory::with_defaults())),
        ));
        HealthMonitor::new(registry, coordinator)
    }

    #[tokio::test]
    async fn test_readiness_requires_agents() {
        let empty = Arc::new(AgentRegistryService::new());
        let monitor = monitor_with(empty).await;
        assert!(!monitor.readiness().await);

        let populated = Arc::new(AgentRegistryService::with_builtin_catalog().await);
        let monitor = monitor_with(populated).await;
        assert!(monitor.readiness().await);
    }

    #[tokio::test]
    async fn test_liveness_follows_full_check() {
        let registry = Arc::new(AgentRegistryService::with_builtin_catalog().await);
        let monitor = monitor_with(registry).await;

        assert!(!monitor.liveness().await);
        let report = monitor.full_health_check().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(monitor.liveness().await);
    }

    #[tokio::test]
    async fn test_empty_registry_is_unhealthy() {
        let monitor = monitor_with(Arc::new(AgentRegistryService::new())).await;
        let report = monitor.full_health_check().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }
}
