//! Agent registry and activation bookkeeping.
//!
//! The registry maps agent ids to immutable configurations; the active set
//! tracks which of them are currently activated. Status updates are a log
//! side effect and never block activation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{builtin_agents, AgentConfig, AgentStatus};
use crate::domain::ports::{AlwaysAvailable, MetricsSink, NoopMetrics, ResourceValidator};

/// Central registry for agent configurations and the active set.
pub struct AgentRegistryService {
    registry: RwLock<HashMap<String, AgentConfig>>,
    /// Insertion order of registrations; shutdown deactivates in this order.
    registration_order: RwLock<Vec<String>>,
    active: RwLock<HashMap<String, AgentConfig>>,
    validator: Arc<dyn ResourceValidator>,
    metrics: Arc<dyn MetricsSink>,
}

impl AgentRegistryService {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            registration_order: RwLock::new(Vec::new()),
            active: RwLock::new(HashMap::new()),
            validator: Arc::new(AlwaysAvailable),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create a registry pre-populated with the built-in catalog.
    pub async fn with_builtin_catalog() -> Self {
        let service = Self::new();
        for agent in builtin_agents() {
            // Builtin ids are unique; registration cannot fail here
            let _ = service.register(agent).await;
        }
        service
    }

    /// Set the resource validator.
    pub fn with_validator(mut self, validator: Arc<dyn ResourceValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Register an agent. Rejects duplicate ids.
    pub async fn register(&self, config: AgentConfig) -> DomainResult<()> {
        config.validate().map_err(DomainError::InvalidInput)?;

        let mut registry = self.registry.write().await;
        if registry.contains_key(&config.agent_id) {
            return Err(DomainError::InvalidInput(format!(
                "duplicate agent id: {}",
                config.agent_id
            )));
        }

        let agent_id = config.agent_id.clone();
        registry.insert(agent_id.clone(), config);
        drop(registry);

        self.registration_order.write().await.push(agent_id.clone());
        info!(agent_id = %agent_id, "agent_registered");
        Ok(())
    }

    /// Overlay agent configurations from a YAML or JSON file. Existing ids
    /// are replaced; new ids are appended.
    pub async fn overlay_from_file(&self, path: impl AsRef<Path>) -> DomainResult<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::InvalidInput(format!("cannot read {}: {e}", path.display())))?;

        let agents: Vec<AgentConfig> = if path.extension().and_then(|e| e.to_str()) == Some("json")
        {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)
                .map_err(|e| DomainError::InvalidInput(format!("invalid agents file: {e}")))?
        };

        let mut registry = self.registry.write().await;
        let mut order = self.registration_order.write().await;
        let count = agents.len();
        for agent in agents {
            agent.validate().map_err(DomainError::InvalidInput)?;
            if !registry.contains_key(&agent.agent_id) {
                order.push(agent.agent_id.clone());
            }
            registry.insert(agent.agent_id.clone(), agent);
        }

        info!(path = %path.display(), count, "agent_registry_overlaid");
        Ok(count)
    }

    /// Activate an agent for a task. Idempotent: re-activation returns the
    /// already-active configuration.
    pub async fn activate(
        &self,
        agent_id: &str,
        task_context: &serde_json::Value,
    ) -> DomainResult<AgentConfig> {
        let config = {
            let registry = self.registry.read().await;
            registry
                .get(agent_id)
                .cloned()
                .ok_or_else(|| DomainError::AgentNotFound(agent_id.to_string()))?
        };

        {
            let active = self.active.read().await;
            if let Some(existing) = active.get(agent_id) {
                info!(agent_id, "agent_already_active");
                return Ok(existing.clone());
            }
        }

        if !self.validator.validate(&config).await {
            warn!(agent_id, "agent_activation_rejected");
            self.metrics.incr_counter(
                "agent_activations_total",
                &[("agent_id", agent_id), ("status", "rejected")],
            );
            return Err(DomainError::ResourceExhausted(format!(
                "resource requirements not met for agent {agent_id}"
            )));
        }

        let mut active = self.active.write().await;
        active.insert(agent_id.to_string(), config.clone());
        let active_count = active.len();
        drop(active);

        // Status update is a log side effect; it must never block activation
        info!(
            agent_id,
            status = AgentStatus::Active.as_str(),
            context = %task_context,
            "agent_activated"
        );
        self.metrics.incr_counter(
            "agent_activations_total",
            &[("agent_id", agent_id), ("status", "activated")],
        );
        self.metrics
            .set_gauge("active_agents_count", &[], active_count as f64);

        Ok(config)
    }

    /// Deactivate an agent. A no-op when the agent is not active.
    pub async fn deactivate(&self, agent_id: &str) {
        let mut active = self.active.write().await;
        if active.remove(agent_id).is_some() {
            let active_count = active.len();
            drop(active);
            info!(agent_id, status = AgentStatus::Idle.as_str(), "agent_deactivated");
            self.metrics
                .set_gauge("active_agents_count", &[], active_count as f64);
        }
    }

    /// Find agents whose specialization domains intersect the required set,
    /// sorted by coordination priority descending, ties by agent id.
    pub async fn find_by_capabilities(&self, required: &[String]) -> Vec<String> {
        let registry = self.registry.read().await;

        let mut suitable: Vec<(&String, u8)> = registry
            .iter()
            .filter(|(_, config)| config.capability.matches_any(required))
            .map(|(id, config)| (id, config.coordination_priority))
            .collect();

        suitable.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        suitable.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Look up a registered agent.
    pub async fn get(&self, agent_id: &str) -> Option<AgentConfig> {
        self.registry.read().await.get(agent_id).cloned()
    }

    /// Whether an agent is currently active.
    pub async fn is_active(&self, agent_id: &str) -> bool {
        self.active.read().await.contains_key(agent_id)
    }

    /// Snapshot of all registered agents.
    pub async fn registry_snapshot(&self) -> HashMap<String, AgentConfig> {
        self.registry.read().await.clone()
    }

    /// Snapshot of all active agents.
    pub async fn active_snapshot(&self) -> HashMap<String, AgentConfig> {
        self.active.read().await.clone()
    }

    /// Number of registered agents.
    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }

    /// Deactivate all active agents in registration order. Idempotent.
    pub async fn shutdown(&self) {
        let order = self.registration_order.read().await.clone();
        for agent_id in &order {
            self.deactivate(agent_id).await;
        }
        info!("agent_registry_shutdown_complete");
    }
}

impl Default for AgentRegistryService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AgentTier, Capability};
    use async_trait::async_trait;
    use serde_json::json;

    struct RejectEverything;

    #[async_trait]
    impl ResourceValidator for RejectEverything {
        async fn validate(&self, _agent: &AgentConfig) -> bool {
            false
        }
    }

    fn test_agent(id: &str, priority: u8, domains: &[&str]) -> AgentConfig {
        let mut capability = Capability::new(id, "test agent");
        for domain in domains {
            capability = capability.with_domain(*domain);
        }
        AgentConfig::new(id, id, AgentTier::Specialists)
            .with_priority(priority)
            .with_capability(capability)
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let service = AgentRegistryService::new();
        service.register(test_agent("a1", 50, &["ai"])).await.unwrap();

        let err = service.register(test_agent("a1", 60, &["ml"])).await;
        assert!(matches!(err, Err(DomainError::InvalidInput(_))));
        assert_eq!(service.len().await, 1);
    }

    #[tokio::test]
    async fn test_activate_idempotent() {
        let service = AgentRegistryService::new();
        service.register(test_agent("a1", 50, &["ai"])).await.unwrap();

        let first = service.activate("a1", &json!({})).await.unwrap();
        let second = service.activate("a1", &json!({})).await.unwrap();
        assert_eq!(first.agent_id, second.agent_id);
        assert!(service.is_active("a1").await);
    }

    #[tokio::test]
    async fn test_activate_unknown_agent() {
        let service = AgentRegistryService::new();
        let err = service.activate("ghost", &json!({})).await;
        assert!(matches!(err, Err(DomainError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_activate_resource_exhausted() {
        let service = AgentRegistryService::new().with_validator(Arc::new(RejectEverything));
        service.register(test_agent("a1", 50, &["ai"])).await.unwrap();

        let err = service.activate("a1", &json!({})).await;
        assert!(matches!(err, Err(DomainError::ResourceExhausted(_))));
        assert!(!service.is_active("a1").await);
    }

    #[tokio::test]
    async fn test_deactivate_is_idempotent() {
        let service = AgentRegistryService::new();
        service.register(test_agent("a1", 50, &["ai"])).await.unwrap();
        service.activate("a1", &json!({})).await.unwrap();

        service.deactivate("a1").await;
        assert!(!service.is_active("a1").await);
        // Second deactivation is a no-op
        service.deactivate("a1").await;
        service.deactivate("never_registered").await;
    }

    #[tokio::test]
    async fn test_find_by_capabilities_ordering() {
        let service = AgentRegistryService::new();
        service.register(test_agent("zeta", 85, &["ai"])).await.unwrap();
        service.register(test_agent("alpha", 85, &["ai"])).await.unwrap();
        service.register(test_agent("low", 40, &["ai"])).await.unwrap();
        service.register(test_agent("other", 99, &["design"])).await.unwrap();

        let found = service.find_by_capabilities(&["ai".to_string()]).await;
        // Priority descending, ties by agent id ascending
        assert_eq!(found, vec!["alpha", "zeta", "low"]);
    }

    #[tokio::test]
    async fn test_builtin_catalog_lookup() {
        let service = AgentRegistryService::with_builtin_catalog().await;
        assert_eq!(service.len().await, 8);

        let found = service
            .find_by_capabilities(&["ios".to_string(), "ai".to_string()])
            .await;
        assert_eq!(found, vec!["ai_engineer", "ios_developer"]);
    }

    #[tokio::test]
    async fn test_shutdown_deactivates_everything() {
        let service = AgentRegistryService::new();
        for id in ["a1", "a2", "a3"] {
            service.register(test_agent(id, 50, &["ai"])).await.unwrap();
            service.activate(id, &json!({})).await.unwrap();
        }

        service.shutdown().await;
        assert!(service.active_snapshot().await.is_empty());

        // Shutdown is idempotent
        service.shutdown().await;
    }
}
