//! Swarm coordination engine.
//!
//! Swarms fan subtasks out across their members according to the active
//! topology: queen-led delegation, peer proposals, collective four-phase
//! synthesis, or adaptive topology switching. Failures in one branch never
//! abort the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentConfig, Proposal, Swarm, SwarmAgent, SwarmConfig, SwarmRole, SwarmTask, SwarmTaskReport,
    SwarmTopology,
};
use crate::domain::ports::{AgentWorker, MetricsSink, NoopMetrics, SimulatedWorker};
use crate::services::agent_registry::AgentRegistryService;

/// Load added to a worker for each dispatched subtask.
const SUBTASK_LOAD: f64 = 0.1;

/// Per-agent line in a swarm status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SwarmAgentStatus {
    pub agent_id: String,
    pub role: String,
    pub load: f64,
    pub trust_score: f64,
}

/// Snapshot of one swarm.
#[derive(Debug, Clone, Serialize)]
pub struct SwarmStatusReport {
    pub swarm_id: String,
    pub topology: String,
    pub agent_count: usize,
    pub active_agents: Vec<SwarmAgentStatus>,
    pub task_queue_size: usize,
    pub health_score: f64,
    pub uptime_seconds: f64,
    pub memory_size: usize,
}

/// Aggregate view over every active swarm.
#[derive(Debug, Clone, Serialize)]
pub struct SwarmsOverview {
    pub active_swarms: usize,
    pub swarms: HashMap<String, SwarmStatusReport>,
    pub historical_swarms: usize,
    pub global_memory_size: usize,
}

/// Manages swarm lifecycles and topology-specific task coordination.
#[derive(Clone)]
pub struct SwarmService {
    config: SwarmConfig,
    swarms: Arc<RwLock<HashMap<String, Arc<RwLock<Swarm>>>>>,
    global_memory: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    swarm_history: Arc<RwLock<Vec<serde_json::Value>>>,
    worker: Arc<dyn AgentWorker>,
    metrics: Arc<dyn MetricsSink>,
}

impl SwarmService {
    /// Create a swarm engine.
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config,
            swarms: Arc::new(RwLock::new(HashMap::new())),
            global_memory: Arc::new(RwLock::new(HashMap::new())),
            swarm_history: Arc::new(RwLock::new(Vec::new())),
            worker: Arc::new(SimulatedWorker::default()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SwarmConfig::default())
    }

    /// Set the agent worker implementation.
    pub fn with_worker(mut self, worker: Arc<dyn AgentWorker>) -> Self {
        self.worker = worker;
        self
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a swarm from registered agents. Idempotent on the swarm id:
    /// creating an existing swarm returns it unchanged.
    pub async fn create_swarm(
        &self,
        swarm_id: &str,
        topology: SwarmTopology,
        initial_agents: &[String],
        registry: &AgentRegistryService,
        formation_context: serde_json::Value,
    ) -> Swarm {
        {
            let swarms = self.swarms.read().await;
            if let Some(existing) = swarms.get(swarm_id) {
                warn!(swarm_id, "swarm_already_exists");
                return existing.read().await.clone();
            }
        }

        let mut swarm = Swarm::new(swarm_id, topology);
        for agent_id in initial_agents {
            let Some(config) = registry.get(agent_id).await else {
                warn!(swarm_id, agent_id = %agent_id, "swarm_agent_not_registered");
                continue;
            };
            let role = determine_swarm_role(&config, topology);
            let mut member = SwarmAgent::new(agent_id, role, config.domains());
            member.swarm_memberships.insert(swarm_id.to_string());
            swarm.agents.insert(agent_id.clone(), member);
        }
        swarm
            .collective_memory
            .insert("formation_context".to_string(), formation_context);

        let snapshot = swarm.clone();
        let mut swarms = self.swarms.write().await;
        let entry = swarms
            .entry(swarm_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(swarm)));
        let created = entry.read().await.clone();
        let total = swarms.len();
        drop(swarms);

        self.metrics.set_gauge("active_swarms_count", &[], total as f64);
        info!(
            swarm_id,
            topology = topology.as_str(),
            agent_count = snapshot.agents.len(),
            "swarm_created"
        );
        created
    }

    /// Dissolve a swarm, archiving its memory into the global history.
    pub async fn dissolve_swarm(&self, swarm_id: &str) -> DomainResult<()> {
        let removed = {
            let mut swarms = self.swarms.write().await;
            swarms.remove(swarm_id)
        };
        let Some(swarm_lock) = removed else {
            return Err(DomainError::SwarmNotFound(swarm_id.to_string()));
        };
        let swarm = swarm_lock.read().await.clone();

        let archive_entry = json!({
            "swarm_id": swarm_id,
            "topology": swarm.topology.as_str(),
            "duration_seconds": swarm.uptime_seconds(),
            "final_memory": swarm.collective_memory,
            "agent_count": swarm.agents.len(),
            "dissolved_at": Utc::now().to_rfc3339(),
        });
        self.swarm_history.write().await.push(archive_entry);

        let mut memory_keys: Vec<&String> = swarm.collective_memory.keys().collect();
        memory_keys.sort();
        let mut agent_ids: Vec<&String> = swarm.agents.keys().collect();
        agent_ids.sort();
        self.global_memory.write().await.insert(
            format!("swarm_{swarm_id}_learnings"),
            json!({
                "topology_effectiveness": swarm.health_score,
                "successful_patterns": memory_keys,
                "agent_combinations": agent_ids,
            }),
        );

        let total = self.swarms.read().await.len();
        self.metrics.set_gauge("active_swarms_count", &[], total as f64);
        info!(swarm_id, "swarm_dissolved");
        Ok(())
    }

    /// Snapshot of one swarm.
    pub async fn swarm_snapshot(&self, swarm_id: &str) -> Option<Swarm> {
        let swarms = self.swarms.read().await;
        match swarms.get(swarm_id) {
            Some(lock) => Some(lock.read().await.clone()),
            None => None,
        }
    }

    /// Whether the swarm exists.
    pub async fn contains(&self, swarm_id: &str) -> bool {
        self.swarms.read().await.contains_key(swarm_id)
    }

    /// Ids of all active swarms, sorted.
    pub async fn swarm_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.swarms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Status of one swarm including per-agent role, load and trust.
    pub async fn swarm_status(&self, swarm_id: &str) -> Option<SwarmStatusReport> {
        let swarm = self.swarm_snapshot(swarm_id).await?;

        let mut agents: Vec<SwarmAgentStatus> = swarm
            .agents
            .values()
            .map(|a| SwarmAgentStatus {
                agent_id: a.agent_id.clone(),
                role: a.role.as_str().to_string(),
                load: a.current_load,
                trust_score: a.trust_score,
            })
            .collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        Some(SwarmStatusReport {
            swarm_id: swarm.swarm_id.clone(),
            topology: swarm.topology.as_str().to_string(),
            agent_count: swarm.agents.len(),
            active_agents: agents,
            task_queue_size: swarm.task_queue.len(),
            health_score: swarm.health_score,
            uptime_seconds: swarm.uptime_seconds(),
            memory_size: swarm.collective_memory.len(),
        })
    }

    /// Aggregate status of all swarms.
    pub async fn overview(&self) -> SwarmsOverview {
        let ids = self.swarm_ids().await;
        let mut swarms = HashMap::new();
        for id in &ids {
            if let Some(status) = self.swarm_status(id).await {
                swarms.insert(id.clone(), status);
            }
        }
        SwarmsOverview {
            active_swarms: swarms.len(),
            swarms,
            historical_swarms: self.swarm_history.read().await.len(),
            global_memory_size: self.global_memory.read().await.len(),
        }
    }

    /// Dissolve every active swarm. Used on shutdown; errors are swallowed.
    pub async fn dissolve_all(&self) {
        for swarm_id in self.swarm_ids().await {
            if let Err(err) = self.dissolve_swarm(&swarm_id).await {
                warn!(swarm_id = %swarm_id, error = %err, "swarm_dissolve_failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Coordination
    // ------------------------------------------------------------------

    /// Coordinate a task within a swarm under a hard deadline. A deadline
    /// expiry is reported as a timeout outcome, not an error.
    pub async fn coordinate_task(
        &self,
        swarm_id: &str,
        mut task: SwarmTask,
        budget: Option<Duration>,
    ) -> DomainResult<SwarmTaskReport> {
        let swarm_lock = {
            let swarms = self.swarms.read().await;
            swarms
                .get(swarm_id)
                .cloned()
                .ok_or_else(|| DomainError::SwarmNotFound(swarm_id.to_string()))?
        };

        if task.task_id.is_empty() {
            task.task_id = format!("{swarm_id}_{}", &Uuid::new_v4().simple().to_string()[..8]);
        }
        let deadline = budget.unwrap_or(Duration::from_secs(self.config.task_timeout_secs));
        let started = tokio::time::Instant::now();

        let outcome = {
            let mut swarm = swarm_lock.write().await;
            swarm.task_queue.push(task.task_id.clone());
            let topology_label = swarm.topology.as_str();
            let run_result =
                tokio::time::timeout(deadline, self.run_topology(&mut swarm, &task)).await;
            match run_result {
                Ok(report) => report,
                Err(_) => {
                    warn!(swarm_id, task_id = %task.task_id, "swarm_task_deadline_expired");
                    let mut report = SwarmTaskReport::completed(
                        topology_label,
                        0.0,
                        json!({"reason": "deadline expired before coordination finished"}),
                    );
                    report.status = "timeout".to_string();
                    report
                }
            }
        };

        let duration = started.elapsed().as_secs_f64();
        {
            let mut swarm = swarm_lock.write().await;
            let participants: Vec<String> = {
                let mut ids: Vec<String> = swarm.agents.keys().cloned().collect();
                ids.sort();
                ids
            };
            swarm.collective_memory.insert(
                task.task_id.clone(),
                json!({
                    "status": outcome.status,
                    "approach": outcome.approach,
                    "efficiency_score": outcome.efficiency_score,
                    "duration_seconds": duration,
                    "participants": participants,
                    "timestamp": Utc::now().to_rfc3339(),
                }),
            );
        }
        self.metrics
            .observe_histogram("consensus_duration_seconds", &[], duration);

        Ok(outcome)
    }

    /// Dispatch to the strategy for the swarm's current topology.
    async fn run_topology(&self, swarm: &mut Swarm, task: &SwarmTask) -> SwarmTaskReport {
        match swarm.topology {
            SwarmTopology::Hierarchical => self.hierarchical_coordination(swarm, task).await,
            SwarmTopology::Mesh => self.mesh_coordination(swarm, task).await,
            SwarmTopology::Collective => self.collective_coordination(swarm, task).await,
            SwarmTopology::Adaptive => self.adaptive_coordination(swarm, task).await,
        }
    }

    /// Queen-led delegation: the queen decomposes the task, the best worker
    /// takes each subtask, and the queen integrates the results.
    async fn hierarchical_coordination(
        &self,
        swarm: &mut Swarm,
        task: &SwarmTask,
    ) -> SwarmTaskReport {
        let Some(queen_id) = elect_queen(swarm) else {
            let mut report = SwarmTaskReport::completed(
                "hierarchical",
                0.0,
                json!({"reason": "no suitable queen agent found"}),
            );
            report.status = "partial".to_string();
            return report;
        };

        let subtasks = queen_strategy(task);

        // Workers are the execution roles; an all-leader swarm falls back to
        // everyone but the queen.
        let mut workers: Vec<String> = swarm
            .agents
            .values()
            .filter(|a| matches!(a.role, SwarmRole::Worker | SwarmRole::Specialist))
            .map(|a| a.agent_id.clone())
            .collect();
        if workers.is_empty() {
            workers = swarm
                .agents
                .keys()
                .filter(|id| **id != queen_id)
                .cloned()
                .collect();
        }
        workers.sort();

        // Pick a worker per subtask and account its load before dispatch
        let mut assignments: Vec<(SwarmAgent, serde_json::Value)> = Vec::new();
        for subtask in &subtasks {
            let required = subtask["required_capabilities"]
                .as_array()
                .map(|caps| {
                    caps.iter()
                        .filter_map(|c| c.as_str().map(String::from))
                        .collect::<Vec<String>>()
                })
                .unwrap_or_default();

            let best = workers
                .iter()
                .filter_map(|id| swarm.agents.get(id))
                .map(|agent| {
                    let score = agent.matched_capabilities(&required) as f64 * agent.trust_score
                        - agent.current_load;
                    (score, agent.agent_id.clone())
                })
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            if let Some((_, worker_id)) = best {
                if let Some(agent) = swarm.agents.get_mut(&worker_id) {
                    agent.acquire_load(SUBTASK_LOAD);
                    assignments.push((agent.clone(), subtask.clone()));
                }
            }
        }

        // Subtasks carry no data dependencies, so they all run in parallel
        let executions = assignments.iter().map(|(agent, subtask)| {
            let worker = Arc::clone(&self.worker);
            async move {
                let ctx = json!({"phase": "subtask", "subtask": subtask});
                let result = worker.propose(agent, task, &ctx).await;
                (agent.agent_id.clone(), subtask.clone(), result)
            }
        });
        let raw_results = join_all(executions).await;

        // Restore load on every path, errors included
        for (agent, _) in &assignments {
            if let Some(live) = swarm.agents.get_mut(&agent.agent_id) {
                live.release_load(SUBTASK_LOAD);
            }
        }

        let mut delegation_results = Vec::new();
        let mut workers_used = Vec::new();
        for (worker_id, subtask, result) in raw_results {
            match result {
                Ok(proposal) => {
                    workers_used.push(worker_id.clone());
                    delegation_results.push(json!({
                        "worker_id": worker_id,
                        "subtask_id": subtask["id"],
                        "status": "completed",
                        "confidence": proposal.confidence,
                        "output": proposal.output,
                    }));
                }
                Err(err) => {
                    warn!(worker_id = %worker_id, error = %err, "subtask_failed");
                }
            }
        }

        let overall_confidence = if delegation_results.is_empty() {
            0.0
        } else {
            delegation_results
                .iter()
                .map(|r| r["confidence"].as_f64().unwrap_or(0.5))
                .sum::<f64>()
                / delegation_results.len() as f64
        };

        let result = json!({
            "integrated_by": queen_id,
            "subtask_count": delegation_results.len(),
            "overall_confidence": overall_confidence,
            "subtask_results": delegation_results,
            "final_output": format!("Integrated solution for {}", task.description),
        });

        let mut report = SwarmTaskReport::completed("hierarchical", overall_confidence, result);
        report.queen_agent = Some(queen_id);
        report.workers_used = Some(workers_used);
        report
    }

    /// Peer proposals: everyone proposes concurrently, the trust-weighted
    /// best proposal wins.
    async fn mesh_coordination(&self, swarm: &mut Swarm, task: &SwarmTask) -> SwarmTaskReport {
        let mut agents: Vec<SwarmAgent> = swarm.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        let proposal_futures = agents.iter().map(|agent| {
            let worker = Arc::clone(&self.worker);
            async move {
                let ctx = json!({"phase": "proposal"});
                let result = worker.propose(agent, task, &ctx).await;
                (agent.agent_id.clone(), agent.trust_score, result)
            }
        });
        let raw = join_all(proposal_futures).await;

        let mut proposals: Vec<(String, f64, Proposal)> = Vec::new();
        for (agent_id, trust, result) in raw {
            match result {
                Ok(proposal) => proposals.push((agent_id, trust, proposal)),
                Err(err) => warn!(agent_id = %agent_id, error = %err, "proposal_failed"),
            }
        }

        if proposals.is_empty() {
            let mut report = SwarmTaskReport::completed(
                "mesh",
                0.0,
                json!({"reason": "no proposals received"}),
            );
            report.status = "partial".to_string();
            report.participating_agents = Some(vec![]);
            return report;
        }

        let total_trust: f64 = proposals.iter().map(|(_, trust, _)| trust).sum();
        let winner = proposals
            .iter()
            .max_by(|a, b| {
                (a.2.confidence * a.1)
                    .partial_cmp(&(b.2.confidence * b.1))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("proposals is non-empty");

        let consensus_score = if total_trust > 0.0 {
            winner.1 / total_trust
        } else {
            0.0
        };

        let participating: Vec<String> =
            proposals.iter().map(|(id, _, _)| id.clone()).collect();

        let result = json!({
            "selected_proposal": {
                "agent_id": winner.0,
                "approach": winner.2.approach,
                "confidence": winner.2.confidence,
            },
            "consensus_score": consensus_score,
            "contributing_agents": proposals.len(),
        });

        let mut report = SwarmTaskReport::completed("mesh", consensus_score, result);
        report.participating_agents = Some(participating);
        report
    }

    /// Collective four-phase pipeline: per-aspect analysis, knowledge
    /// aggregation, informed execution, integration.
    async fn collective_coordination(
        &self,
        swarm: &mut Swarm,
        task: &SwarmTask,
    ) -> SwarmTaskReport {
        const ASPECTS: [&str; 4] = ["requirements", "constraints", "opportunities", "risks"];

        let mut agents: Vec<SwarmAgent> = swarm.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        // Phase 1: every agent analyzes every aspect, concurrently
        let analysis_futures = agents.iter().flat_map(|agent| {
            ASPECTS.iter().map(move |aspect| {
                let worker = Arc::clone(&self.worker);
                async move {
                    let ctx = json!({"phase": "analysis", "aspect": aspect});
                    let result = worker.propose(agent, task, &ctx).await;
                    (agent.agent_id.clone(), *aspect, result)
                }
            })
        });
        let analyses = join_all(analysis_futures).await;

        // Phase 2: aggregate into shared knowledge grouped by aspect
        let mut by_aspect: HashMap<&str, Vec<serde_json::Value>> = HashMap::new();
        let mut perspectives = 0usize;
        for (agent_id, aspect, result) in analyses {
            match result {
                Ok(proposal) => {
                    perspectives += 1;
                    by_aspect.entry(aspect).or_default().push(json!({
                        "agent_id": agent_id,
                        "analysis": proposal.approach,
                    }));
                }
                Err(err) => warn!(agent_id = %agent_id, aspect, error = %err, "analysis_failed"),
            }
        }
        let mut insights = serde_json::Map::new();
        for aspect in ASPECTS {
            insights.insert(
                aspect.to_string(),
                json!(by_aspect.get(aspect).cloned().unwrap_or_default()),
            );
        }
        let collective_knowledge = json!({
            "collective_insights": insights,
            "total_perspectives": perspectives,
        });

        // Phase 3: informed execution, concurrently
        let execution_futures = agents.iter().map(|agent| {
            let worker = Arc::clone(&self.worker);
            let knowledge = collective_knowledge.clone();
            async move {
                let focus = agent.capabilities.first().cloned().unwrap_or_default();
                let ctx = json!({
                    "phase": "collective_execution",
                    "shared_knowledge": knowledge,
                    "agent_focus": focus,
                });
                let result = worker.propose(agent, task, &ctx).await;
                (agent.agent_id.clone(), result)
            }
        });
        let executions = join_all(execution_futures).await;

        let mut contributions = Vec::new();
        for (agent_id, result) in executions {
            match result {
                Ok(proposal) => contributions.push(json!({
                    "agent_id": agent_id,
                    "contribution": proposal.approach,
                })),
                Err(err) => warn!(agent_id = %agent_id, error = %err, "collective_execution_failed"),
            }
        }

        // Phase 4: integrate; confidence scales with participation
        let participation = if agents.is_empty() {
            0.0
        } else {
            contributions.len() as f64 / agents.len() as f64
        };
        let collective_confidence = 0.9 * participation;

        let result = json!({
            "collective_solution": format!("Integrated solution for {}", task.description),
            "contributing_agents": contributions.len(),
            "contributions": contributions,
            "shared_understanding": collective_knowledge,
            "confidence": collective_confidence,
        });

        let mut report = SwarmTaskReport::completed("collective", collective_confidence, result);
        report.collective_agents = Some(agents.iter().map(|a| a.agent_id.clone()).collect());
        report
    }

    /// Adaptive: pick the topology that fits the task, run it, and restore
    /// the swarm's own topology on every exit path.
    async fn adaptive_coordination(&self, swarm: &mut Swarm, task: &SwarmTask) -> SwarmTaskReport {
        let chosen = select_adaptive_topology(task, swarm.agents.len());
        info!(
            swarm_id = %swarm.swarm_id,
            selected_topology = chosen.as_str(),
            complexity = task.complexity,
            agent_count = swarm.agents.len(),
            "adaptive_topology_selected"
        );

        let original = swarm.topology;
        swarm.topology = chosen;

        let mut report = match chosen {
            SwarmTopology::Hierarchical => self.hierarchical_coordination(swarm, task).await,
            SwarmTopology::Mesh => self.mesh_coordination(swarm, task).await,
            SwarmTopology::Collective => self.collective_coordination(swarm, task).await,
            // The selector never yields Adaptive
            SwarmTopology::Adaptive => self.hierarchical_coordination(swarm, task).await,
        };

        swarm.topology = original;
        report.adaptive_topology_used = Some(chosen.as_str().to_string());
        report
    }
}

/// Role assignment from agent configuration and topology.
pub fn determine_swarm_role(config: &AgentConfig, topology: SwarmTopology) -> SwarmRole {
    let domains = &config.capability.specialization_domains;
    let has = |d: &str| domains.contains(d);

    match topology {
        SwarmTopology::Hierarchical => {
            if config.coordination_priority >= 90 {
                SwarmRole::Queen
            } else if has("orchestration") || has("coordination") {
                SwarmRole::Coordinator
            } else if has("research") || has("analysis") {
                SwarmRole::Scout
            } else {
                SwarmRole::Specialist
            }
        }
        SwarmTopology::Mesh => {
            if has("coordination") {
                SwarmRole::Coordinator
            } else {
                SwarmRole::Worker
            }
        }
        SwarmTopology::Collective => SwarmRole::Worker,
        SwarmTopology::Adaptive => SwarmRole::Coordinator,
    }
}

/// Pick the queen: an agent holding the queen role, or else the agent with
/// the most capabilities (ties broken by agent id).
fn elect_queen(swarm: &Swarm) -> Option<String> {
    let queens = swarm.agents_with_role(SwarmRole::Queen);
    if let Some(queen) = queens.first() {
        return Some(queen.agent_id.clone());
    }

    swarm
        .agents
        .values()
        .max_by(|a, b| {
            a.capabilities
                .len()
                .cmp(&b.capabilities.len())
                .then_with(|| b.agent_id.cmp(&a.agent_id))
        })
        .map(|agent| agent.agent_id.clone())
}

/// The queen's strategy: a fixed decomposition into prioritized subtasks
/// carrying the task's capability requirements.
fn queen_strategy(task: &SwarmTask) -> Vec<serde_json::Value> {
    ["analysis", "implementation", "validation"]
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            json!({
                "id": format!("subtask_{}", i + 1),
                "type": kind,
                "priority": i + 1,
                "required_capabilities": task.required_capabilities,
            })
        })
        .collect()
}

/// Temporary topology for one adaptive coordination round.
pub fn select_adaptive_topology(task: &SwarmTask, agent_count: usize) -> SwarmTopology {
    if task.complexity > 0.8 && !task.time_critical {
        SwarmTopology::Collective
    } else if agent_count > 5 && task.complexity > 0.5 {
        SwarmTopology::Hierarchical
    } else if task.time_critical {
        SwarmTopology::Mesh
    } else {
        SwarmTopology::Hierarchical
    }
}
