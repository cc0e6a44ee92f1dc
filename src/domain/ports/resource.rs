//! Resource validator port.
//!
//! Activation asks the validator whether the host can take another agent.
//! A rejection is a non-recoverable `ResourceExhausted`.

use async_trait::async_trait;

use crate::domain::models::AgentConfig;

/// Decides whether an agent's resource requirements can be satisfied.
#[async_trait]
pub trait ResourceValidator: Send + Sync {
    /// Returns false when activating `agent` would exhaust resources.
    async fn validate(&self, agent: &AgentConfig) -> bool;
}

/// Validator that admits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

#[async_trait]
impl ResourceValidator for AlwaysAvailable {
    async fn validate(&self, _agent: &AgentConfig) -> bool {
        true
    }
}
