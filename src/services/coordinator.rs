//! Swarm-hive coordinator.
//!
//! Chooses between pure-swarm, pure-hive and hybrid coordination from task
//! features and learned per-mode performance, runs the chosen pipeline, and
//! feeds outcomes back into an exponential-moving-average history.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CoordinationMode, CoordinationTask, CoordinatorConfig, DecisionMethod, DecisionOption,
    MemoryType, SwarmTask, SwarmTopology,
};
use crate::domain::ports::{MetricsSink, NoopMetrics};
use crate::services::agent_registry::AgentRegistryService;
use crate::services::hive::HiveService;
use crate::services::swarm::SwarmService;

/// Structured outcome of one coordination request.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinationReport {
    pub task_id: String,
    pub coordination_mode: String,
    pub duration_seconds: f64,
    pub result: serde_json::Value,
}

/// Master coordinator integrating the swarm and hive engines.
pub struct SwarmHiveCoordinator {
    config: CoordinatorConfig,
    registry: Arc<AgentRegistryService>,
    swarm: SwarmService,
    hive: HiveService,
    active_coordinations: RwLock<HashMap<String, CoordinationTask>>,
    coordination_history: RwLock<Vec<serde_json::Value>>,
    performance: RwLock<HashMap<String, f64>>,
    metrics: Arc<dyn MetricsSink>,
}

impl SwarmHiveCoordinator {
    /// Create a coordinator owning the two engines.
    pub fn new(
        config: CoordinatorConfig,
        registry: Arc<AgentRegistryService>,
        swarm: SwarmService,
        hive: HiveService,
    ) -> Self {
        Self {
            config,
            registry,
            swarm,
            hive,
            active_coordinations: RwLock::new(HashMap::new()),
            coordination_history: RwLock::new(Vec::new()),
            performance: RwLock::new(HashMap::new()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The swarm engine.
    pub fn swarm(&self) -> &SwarmService {
        &self.swarm
    }

    /// The hive engine.
    pub fn hive(&self) -> &HiveService {
        &self.hive
    }

    /// The agent registry.
    pub fn registry(&self) -> &Arc<AgentRegistryService> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Mode selection and learning
    // ------------------------------------------------------------------

    /// Select the coordination mode for a task. Pinned non-adaptive modes
    /// pass through; otherwise the decision table plus EMA history applies.
    pub async fn select_coordination_mode(&self, task: &CoordinationTask) -> CoordinationMode {
        if let Some(mode) = task.coordination_mode {
            if mode != CoordinationMode::Adaptive {
                return mode;
            }
        }

        let complexity = task.complexity;
        let capability_count = task.required_capabilities.len();
        let time_critical = task.time_critical;

        let swarm_perf = self.ema("swarm_only_avg_efficiency").await.unwrap_or(0.5);
        let hive_perf = self.ema("hive_only_avg_efficiency").await.unwrap_or(0.5);

        let selected = if complexity > self.config.hybrid_threshold && !time_critical {
            CoordinationMode::Hybrid
        } else if time_critical && capability_count <= 5 {
            CoordinationMode::SwarmOnly
        } else if capability_count > 8 {
            CoordinationMode::HiveOnly
        } else if complexity < 0.3 {
            if swarm_perf >= hive_perf {
                CoordinationMode::SwarmOnly
            } else {
                CoordinationMode::HiveOnly
            }
        } else {
            CoordinationMode::Hybrid
        };

        info!(
            task_id = %task.task_id,
            mode = selected.as_str(),
            complexity,
            capability_count,
            time_critical,
            "coordination_mode_selected"
        );
        selected
    }

    /// Current EMA value for a metric key.
    pub async fn ema(&self, key: &str) -> Option<f64> {
        self.performance.read().await.get(key).copied()
    }

    /// Snapshot of all learned performance metrics.
    pub async fn performance_snapshot(&self) -> HashMap<String, f64> {
        self.performance.read().await.clone()
    }

    /// Fold one observation into the per-mode EMA table. The first
    /// observation bootstraps with the raw value.
    pub async fn record_performance(
        &self,
        mode: CoordinationMode,
        efficiency: f64,
        duration_seconds: f64,
    ) {
        let alpha = self.config.learning_rate;
        let mut performance = self.performance.write().await;

        for (suffix, value) in [
            ("avg_efficiency", efficiency),
            ("avg_duration", duration_seconds),
        ] {
            let key = format!("{}_{suffix}", mode.as_str());
            let updated = match performance.get(&key) {
                Some(old) => old * (1.0 - alpha) + value * alpha,
                None => value,
            };
            performance.insert(key, updated);
        }
    }

    // ------------------------------------------------------------------
    // Coordination entry point
    // ------------------------------------------------------------------

    /// Coordinate a task end to end: select a mode, run its pipeline,
    /// record the outcome, and learn from it.
    pub async fn coordinate_task(
        &self,
        task: CoordinationTask,
        preferred_agents: Option<Vec<String>>,
    ) -> DomainResult<CoordinationReport> {
        let started = tokio::time::Instant::now();
        self.active_coordinations
            .write()
            .await
            .insert(task.task_id.clone(), task.clone());

        let mode = self.select_coordination_mode(&task).await;
        self.metrics
            .incr_counter("coordination_requests_total", &[("mode", mode.as_str())]);

        let result = match mode {
            CoordinationMode::SwarmOnly => {
                self.coordinate_swarm_only(&task, preferred_agents.as_deref()).await
            }
            CoordinationMode::HiveOnly => {
                self.coordinate_hive_only(&task, preferred_agents.as_deref()).await
            }
            CoordinationMode::Hybrid | CoordinationMode::Adaptive => {
                self.coordinate_hybrid(&task, preferred_agents.as_deref()).await
            }
        };

        self.active_coordinations.write().await.remove(&task.task_id);
        let result = result?;

        let duration = started.elapsed().as_secs_f64();
        let efficiency = result
            .get("efficiency_score")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.5);

        self.metrics
            .observe_histogram("coordination_duration_seconds", &[], duration);
        self.metrics
            .observe_histogram("coordination_efficiency_score", &[], efficiency);
        if result.get("status").and_then(serde_json::Value::as_str) == Some("success") {
            self.metrics
                .incr_counter("coordination_success_total", &[("mode", mode.as_str())]);
        }

        self.coordination_history.write().await.push(json!({
            "task_id": task.task_id,
            "mode": mode.as_str(),
            "duration_seconds": duration,
            "efficiency_score": efficiency,
        }));

        self.record_performance(mode, efficiency, duration).await;

        Ok(CoordinationReport {
            task_id: task.task_id,
            coordination_mode: mode.as_str().to_string(),
            duration_seconds: duration,
            result,
        })
    }

    // ------------------------------------------------------------------
    // Pure swarm
    // ------------------------------------------------------------------

    /// Pure swarm pipeline: pick a topology, form a fresh swarm, run one
    /// coordination round, and dissolve.
    pub async fn coordinate_swarm_only(
        &self,
        task: &CoordinationTask,
        preferred_agents: Option<&[String]>,
    ) -> DomainResult<serde_json::Value> {
        let topology = if task.complexity > 0.8 {
            SwarmTopology::Collective
        } else if task.time_critical {
            SwarmTopology::Mesh
        } else if task.required_capabilities.len() > 6 {
            SwarmTopology::Hierarchical
        } else {
            SwarmTopology::Adaptive
        };

        let mut selected = match preferred_agents {
            Some(agents) if !agents.is_empty() => agents.to_vec(),
            _ => self.registry.find_by_capabilities(&task.required_capabilities).await,
        };
        selected.truncate(self.swarm.config().max_agents);

        let swarm_id = format!("swarm_{}", task.task_id);
        self.swarm
            .create_swarm(
                &swarm_id,
                topology,
                &selected,
                &self.registry,
                json!({"task": task.description, "complexity": task.complexity}),
            )
            .await;

        let swarm_task = SwarmTask {
            task_id: String::new(),
            description: task.description.clone(),
            complexity: task.complexity,
            time_critical: task.time_critical,
            required_capabilities: task.required_capabilities.clone(),
            metadata: task.metadata.clone(),
        };
        let report = self.swarm.coordinate_task(&swarm_id, swarm_task, None).await?;

        self.swarm.dissolve_swarm(&swarm_id).await?;

        let efficiency = report.consensus_confidence;
        Ok(json!({
            "status": "success",
            "approach": "swarm_only",
            "topology_used": topology.as_str(),
            "agents_used": selected.len(),
            "swarm_result": report,
            "efficiency_score": efficiency,
        }))
    }

    // ------------------------------------------------------------------
    // Pure hive
    // ------------------------------------------------------------------

    /// Pure hive pipeline: ensure nodes, seed working memory, run one
    /// collective decision, and wait for its resolution.
    pub async fn coordinate_hive_only(
        &self,
        task: &CoordinationTask,
        preferred_agents: Option<&[String]>,
    ) -> DomainResult<serde_json::Value> {
        let mut selected = match preferred_agents {
            Some(agents) if !agents.is_empty() => agents.to_vec(),
            _ => self.registry.find_by_capabilities(&task.required_capabilities).await,
        };
        selected.truncate(self.hive.config().max_nodes);

        let mut node_agents = BTreeSet::new();
        for agent_id in &selected {
            let capabilities = match self.registry.get(agent_id).await {
                Some(config) => config.domains(),
                None => task.required_capabilities.clone(),
            };
            let node = self.hive.ensure_node(agent_id, &capabilities).await;
            node_agents.insert(node.agent_id);
        }

        let memory_id = self
            .hive
            .store_memory(
                json!({
                    "task_description": task.description,
                    "required_capabilities": task.required_capabilities,
                    "complexity": task.complexity,
                }),
                MemoryType::Working,
                node_agents.clone(),
                0.8,
            )
            .await;

        let options = generate_decision_options(task);
        let method = select_decision_method(task);
        let timeout_secs = if task.time_critical {
            self.hive.config().decision_timeout_critical_secs
        } else {
            self.hive.config().decision_timeout_secs
        };
        let timeout = Duration::from_secs(timeout_secs);

        let decision_id = self
            .hive
            .initiate_decision(
                &format!("How should we approach: {}", task.description),
                options,
                method,
                timeout,
            )
            .await?;

        let max_wait = timeout + Duration::from_secs(10);
        let summary = self.hive.wait_for_decision(&decision_id, max_wait).await;

        let efficiency = summary.confidence;
        Ok(json!({
            "status": "success",
            "approach": "hive_only",
            "decision_method": method.as_str(),
            "nodes_participated": node_agents.len(),
            "hive_result": summary,
            "memory_id": memory_id,
            "efficiency_score": efficiency,
        }))
    }

    // ------------------------------------------------------------------
    // Hybrid
    // ------------------------------------------------------------------

    /// Hybrid pipeline: hive planning, swarm execution carrying the plan,
    /// then hive validation of the alignment between the two.
    pub async fn coordinate_hybrid(
        &self,
        task: &CoordinationTask,
        preferred_agents: Option<&[String]>,
    ) -> DomainResult<serde_json::Value> {
        // Phase 1: strategic planning in the hive
        let mut planning_caps = vec!["coordination".to_string(), "planning".to_string()];
        planning_caps.extend(task.required_capabilities.iter().take(3).cloned());
        let planning_task = CoordinationTask::new(
            format!("{}_hive_planning", task.task_id),
            format!("Strategic planning for: {}", task.description),
        )
        .with_complexity(task.complexity * 0.7)
        .with_capabilities(planning_caps);

        let plan = self.coordinate_hive_only(&planning_task, preferred_agents).await?;

        // Phase 2: swarm execution informed by the plan
        let execution_task = CoordinationTask::new(
            format!("{}_swarm_execution", task.task_id),
            format!("Execute plan for: {}", task.description),
        )
        .with_complexity(task.complexity)
        .with_capabilities(task.required_capabilities.clone())
        .time_critical(task.time_critical)
        .with_metadata(json!({
            "hive_strategy": plan.get("hive_result"),
            "strategic_insights": plan.get("memory_id"),
        }));

        let execution = self.coordinate_swarm_only(&execution_task, preferred_agents).await?;

        // Phase 3: hive validation of plan/execution alignment
        let plan_eff = plan
            .get("efficiency_score")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.5);
        let exec_eff = execution
            .get("efficiency_score")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.5);

        let alignment = (1.0 - (plan_eff - exec_eff).abs()).min(1.0);
        let validation_confidence = alignment * 0.9;

        let validation_memory_id = self
            .hive
            .store_memory(
                json!({
                    "original_task": task.description,
                    "hive_strategy": plan.get("hive_result"),
                    "swarm_execution": execution.get("swarm_result"),
                    "strategy_execution_alignment": alignment,
                }),
                MemoryType::Episodic,
                BTreeSet::from(["validation_hive".to_string()]),
                0.9,
            )
            .await;

        let validation = json!({
            "validation_memory_id": validation_memory_id,
            "strategy_execution_alignment": alignment,
            "validation_confidence": validation_confidence,
        });

        let efficiency = plan_eff * 0.3 + exec_eff * 0.5 + validation_confidence * 0.2;

        Ok(json!({
            "status": "success",
            "approach": "swarm_hive_hybrid",
            "phases": {
                "hive_planning": plan,
                "swarm_execution": execution,
                "hive_validation": validation,
            },
            "efficiency_score": efficiency,
        }))
    }

    // ------------------------------------------------------------------
    // Persistent groups
    // ------------------------------------------------------------------

    /// Create a persistent swarm-hive group that survives across
    /// coordination calls: one swarm, hive nodes for every agent, and an
    /// episodic formation fragment.
    pub async fn create_persistent_swarm_hive(
        &self,
        swarm_hive_id: &str,
        agent_ids: &[String],
        coordination_config: serde_json::Value,
    ) -> DomainResult<serde_json::Value> {
        let topology = coordination_config
            .get("swarm_topology")
            .and_then(serde_json::Value::as_str)
            .and_then(SwarmTopology::parse_str)
            .unwrap_or(SwarmTopology::Adaptive);

        let swarm_id = format!("persistent_{swarm_hive_id}");
        let swarm = self
            .swarm
            .create_swarm(
                &swarm_id,
                topology,
                agent_ids,
                &self.registry,
                coordination_config.clone(),
            )
            .await;

        let mut node_count = 0usize;
        for agent_id in agent_ids {
            let capabilities = match self.registry.get(agent_id).await {
                Some(config) => config.domains(),
                None => Vec::new(),
            };
            self.hive.ensure_node(agent_id, &capabilities).await;
            node_count += 1;
        }

        let contributors: BTreeSet<String> = agent_ids.iter().cloned().collect();
        let formation_memory_id = self
            .hive
            .store_memory(
                json!({
                    "swarm_hive_id": swarm_hive_id,
                    "agent_composition": agent_ids,
                    "configuration": coordination_config,
                }),
                MemoryType::Episodic,
                contributors,
                1.0,
            )
            .await;

        info!(swarm_hive_id, agents = agent_ids.len(), "persistent_swarm_hive_created");

        Ok(json!({
            "swarm_hive_id": swarm_hive_id,
            "swarm_id": swarm.swarm_id,
            "hive_nodes": node_count,
            "formation_memory_id": formation_memory_id,
            "status": "active",
        }))
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Number of coordinations currently in flight.
    pub async fn active_coordination_count(&self) -> usize {
        self.active_coordinations.read().await.len()
    }

    /// Aggregate status of the coordinator and both engines.
    pub async fn coordination_status(&self) -> serde_json::Value {
        let performance = self.performance_snapshot().await;
        let swarm_overview = self.swarm.overview().await;
        let hive_status = self.hive.status().await;

        json!({
            "coordinator": {
                "active_coordinations": self.active_coordination_count().await,
                "coordination_history": self.coordination_history.read().await.len(),
                "performance_metrics": performance,
            },
            "swarm_manager": swarm_overview,
            "hive_intelligence": hive_status,
            "system_health": {
                "swarm_efficiency": performance.get("swarm_only_avg_efficiency").copied().unwrap_or(0.5),
                "hive_efficiency": performance.get("hive_only_avg_efficiency").copied().unwrap_or(0.5),
                "hybrid_efficiency": performance.get("hybrid_avg_efficiency").copied().unwrap_or(0.5),
            },
        })
    }

    /// Dissolve every active swarm and drop in-flight coordination state.
    pub async fn stop(&self) {
        self.swarm.dissolve_all().await;
        self.active_coordinations.write().await.clear();
        info!("coordinator_stopped");
    }
}

/// Canonical decision options for a hive coordination, plus an AI-assisted
/// option when the task calls for AI capabilities.
pub fn generate_decision_options(task: &CoordinationTask) -> Vec<DecisionOption> {
    let mut options = vec![
        DecisionOption::new("parallel_approach", "Parallel execution with multiple agents")
            .with_expertise(vec![0, 1, 2]),
        DecisionOption::new("sequential_approach", "Sequential handoff between specialists")
            .with_expertise(vec![1, 3, 4]),
        DecisionOption::new("hybrid_approach", "Mix of parallel and sequential coordination")
            .with_expertise(vec![0, 1, 2, 3]),
    ];

    if task.required_capabilities.iter().any(|c| c == "ai") {
        options.push(
            DecisionOption::new("ai_assisted_approach", "AI-first approach with human oversight")
                .with_expertise(vec![5, 1]),
        );
    }

    options
}

/// Decision method from task characteristics.
pub fn select_decision_method(task: &CoordinationTask) -> DecisionMethod {
    if task.time_critical {
        DecisionMethod::Weighted
    } else if task.complexity > 0.8 {
        DecisionMethod::Emergent
    } else if task.required_capabilities.len() > 6 {
        DecisionMethod::Quorum
    } else {
        DecisionMethod::Consensus
    }
}
