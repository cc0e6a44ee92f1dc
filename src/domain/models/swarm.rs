//! Swarm domain model.
//!
//! A swarm is a working group of agents wired together under a topology.
//! Swarm agents are per-swarm views of registered agents; they exist only
//! for the lifetime of the containing swarm.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structural pattern by which swarm agents exchange work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmTopology {
    /// Queen-led coordination
    Hierarchical,
    /// Peer-to-peer coordination
    Mesh,
    /// Hive-mind coordination
    Collective,
    /// Dynamic topology switching
    Adaptive,
}

impl SwarmTopology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::Mesh => "mesh",
            Self::Collective => "collective",
            Self::Adaptive => "adaptive",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hierarchical" => Some(Self::Hierarchical),
            "mesh" => Some(Self::Mesh),
            "collective" => Some(Self::Collective),
            "adaptive" => Some(Self::Adaptive),
            _ => None,
        }
    }
}

/// Role an agent plays within a swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmRole {
    /// Leadership and oversight
    Queen,
    /// Task execution
    Worker,
    /// Information gathering
    Scout,
    /// Inter-swarm communication
    Coordinator,
    /// Domain expertise
    Specialist,
}

impl SwarmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queen => "queen",
            Self::Worker => "worker",
            Self::Scout => "scout",
            Self::Coordinator => "coordinator",
            Self::Specialist => "specialist",
        }
    }
}

/// Per-swarm view of a registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmAgent {
    /// Registered agent id
    pub agent_id: String,
    /// Role within this swarm
    pub role: SwarmRole,
    /// Copy of the agent's specialization domains
    pub capabilities: Vec<String>,
    /// Maximum load the agent can carry
    pub load_capacity: f64,
    /// Current load in [0, load_capacity]
    pub current_load: f64,
    /// Trust score in [0, 1]
    pub trust_score: f64,
    /// Append-only coordination event log
    pub coordination_history: Vec<serde_json::Value>,
    /// Swarms this agent currently belongs to
    pub swarm_memberships: BTreeSet<String>,
}

impl SwarmAgent {
    /// Create a swarm agent with default load and trust.
    pub fn new(agent_id: impl Into<String>, role: SwarmRole, capabilities: Vec<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            capabilities,
            load_capacity: 1.0,
            current_load: 0.0,
            trust_score: 0.8,
            coordination_history: Vec::new(),
            swarm_memberships: BTreeSet::new(),
        }
    }

    /// Take on additional load, capped at capacity.
    pub fn acquire_load(&mut self, amount: f64) {
        self.current_load = (self.current_load + amount).min(self.load_capacity);
    }

    /// Release load, clamped at zero. Called on completion and error paths.
    pub fn release_load(&mut self, amount: f64) {
        self.current_load = (self.current_load - amount).max(0.0);
    }

    /// Count how many required capabilities this agent covers.
    pub fn matched_capabilities(&self, required: &[String]) -> usize {
        required
            .iter()
            .filter(|r| self.capabilities.iter().any(|c| c == *r))
            .count()
    }

    /// Append a coordination event to the history.
    pub fn record_event(&mut self, event: serde_json::Value) {
        self.coordination_history.push(event);
    }
}

/// A working group of agents under a single topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swarm {
    /// Unique swarm id
    pub swarm_id: String,
    /// Coordination topology; stable through the public API
    pub topology: SwarmTopology,
    /// Member agents keyed by agent id
    pub agents: HashMap<String, SwarmAgent>,
    /// Ordered task ids processed by this swarm
    pub task_queue: Vec<String>,
    /// Per-swarm scratch memory keyed by task id
    pub collective_memory: HashMap<String, serde_json::Value>,
    /// Threshold for collective agreement
    pub consensus_threshold: f64,
    /// Health in [0, 1]
    pub health_score: f64,
    /// Formation time
    pub created_at: DateTime<Utc>,
}

impl Swarm {
    /// Create an empty swarm.
    pub fn new(swarm_id: impl Into<String>, topology: SwarmTopology) -> Self {
        Self {
            swarm_id: swarm_id.into(),
            topology,
            agents: HashMap::new(),
            task_queue: Vec::new(),
            collective_memory: HashMap::new(),
            consensus_threshold: 0.75,
            health_score: 1.0,
            created_at: Utc::now(),
        }
    }

    /// Seconds since the swarm was formed.
    pub fn uptime_seconds(&self) -> f64 {
        let elapsed = Utc::now() - self.created_at;
        elapsed.num_milliseconds() as f64 / 1000.0
    }

    /// Agents holding a given role, sorted by agent id for determinism.
    pub fn agents_with_role(&self, role: SwarmRole) -> Vec<&SwarmAgent> {
        let mut agents: Vec<&SwarmAgent> =
            self.agents.values().filter(|a| a.role == role).collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        agents
    }
}

/// Task payload handed to a swarm for one coordination round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmTask {
    /// Task id, assigned when the task enters the swarm queue
    pub task_id: String,
    /// What needs to be done
    pub description: String,
    /// Estimated complexity in [0, 1]
    pub complexity: f64,
    /// Whether latency matters
    #[serde(default)]
    pub time_critical: bool,
    /// Capability domains the task needs
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    /// Free-form context (e.g. an upstream plan's memory id)
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl SwarmTask {
    pub fn new(task_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            complexity: 0.5,
            time_critical: false,
            required_capabilities: Vec::new(),
            metadata: None,
        }
    }
}

/// A proposal produced by an agent worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposed approach
    pub approach: String,
    /// Proposer's confidence in [0, 1]
    pub confidence: f64,
    /// Structured output payload
    pub output: serde_json::Value,
}

/// Structured outcome of one swarm coordination round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmTaskReport {
    /// "completed" or "partial"
    pub status: String,
    /// Strategy that produced the result
    pub approach: String,
    /// Queen agent id (hierarchical only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queen_agent: Option<String>,
    /// Workers that executed subtasks (hierarchical only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_used: Option<Vec<String>>,
    /// Agents whose proposals landed (mesh only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participating_agents: Option<Vec<String>>,
    /// All contributing agents (collective only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collective_agents: Option<Vec<String>>,
    /// Topology the adaptive strategy actually ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_topology_used: Option<String>,
    /// Unified confidence of the round; feeds efficiency scoring
    pub consensus_confidence: f64,
    /// Integrated result payload
    pub result: serde_json::Value,
    /// Efficiency of the round in [0, 1]
    pub efficiency_score: f64,
}

impl SwarmTaskReport {
    /// A completed report for the given strategy and confidence.
    pub fn completed(approach: &str, confidence: f64, result: serde_json::Value) -> Self {
        Self {
            status: "completed".to_string(),
            approach: approach.to_string(),
            queen_agent: None,
            workers_used: None,
            participating_agents: None,
            collective_agents: None,
            adaptive_topology_used: None,
            consensus_confidence: confidence,
            result,
            efficiency_score: confidence,
        }
    }
}
