//! Agent worker port.
//!
//! The engine treats the component that actually produces a proposal as an
//! abstract capability. The simulated worker stands in for a real model
//! runner: it answers quickly and deterministically from the agent's own
//! view, which is exactly what the coordination layer needs to be tested
//! against.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Proposal, SwarmAgent, SwarmTask};

/// Produces a proposal for a task on behalf of one swarm agent.
#[async_trait]
pub trait AgentWorker: Send + Sync {
    /// Ask `agent` for a proposal on `task`. `ctx` carries phase-specific
    /// context (subtask payloads, aspect names, collective knowledge).
    async fn propose(
        &self,
        agent: &SwarmAgent,
        task: &SwarmTask,
        ctx: &serde_json::Value,
    ) -> DomainResult<Proposal>;
}

/// Deterministic in-process worker used by default and in tests.
#[derive(Debug, Clone)]
pub struct SimulatedWorker {
    /// Simulated thinking time per proposal, in milliseconds.
    pub latency_ms: u64,
}

impl Default for SimulatedWorker {
    fn default() -> Self {
        Self { latency_ms: 20 }
    }
}

impl SimulatedWorker {
    /// A worker that answers immediately.
    pub fn instant() -> Self {
        Self { latency_ms: 0 }
    }
}

#[async_trait]
impl AgentWorker for SimulatedWorker {
    async fn propose(
        &self,
        agent: &SwarmAgent,
        task: &SwarmTask,
        ctx: &serde_json::Value,
    ) -> DomainResult<Proposal> {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        let focus = agent
            .capabilities
            .first()
            .cloned()
            .unwrap_or_else(|| "general".to_string());

        Ok(Proposal {
            approach: format!(
                "{} proposes solution for {} using {}",
                agent.agent_id, task.description, focus
            ),
            confidence: agent.trust_score,
            output: json!({
                "agent_id": agent.agent_id,
                "focus": focus,
                "capabilities": agent.capabilities,
                "ctx": ctx,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SwarmRole;

    #[tokio::test]
    async fn test_simulated_worker_uses_agent_view() {
        let worker = SimulatedWorker::instant();
        let agent = SwarmAgent::new("ai_engineer", SwarmRole::Specialist, vec!["ai".into()]);
        let task = SwarmTask::new("t1", "build rag pipeline");

        let proposal = worker
            .propose(&agent, &task, &serde_json::Value::Null)
            .await
            .unwrap();

        assert!((proposal.confidence - agent.trust_score).abs() < f64::EPSILON);
        assert!(proposal.approach.contains("ai_engineer"));
        assert_eq!(proposal.output["focus"], "ai");
    }
}
