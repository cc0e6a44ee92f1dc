//! Agent domain model.
//!
//! Agents are registered once with an immutable configuration and are
//! activated per task. Their capability descriptor drives swarm role
//! assignment and hive expertise vectors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Agent tier classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTier {
    /// Core framework agents
    Core,
    /// Domain specialists
    Specialists,
    /// Task-specific agents
    TaskSpecific,
    /// Business domain agents
    BusinessDomain,
}

impl Default for AgentTier {
    fn default() -> Self {
        Self::Specialists
    }
}

impl AgentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Specialists => "specialists",
            Self::TaskSpecific => "task_specific",
            Self::BusinessDomain => "business_domain",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "core" => Some(Self::Core),
            "specialists" => Some(Self::Specialists),
            "task_specific" => Some(Self::TaskSpecific),
            "business_domain" => Some(Self::BusinessDomain),
            _ => None,
        }
    }
}

/// Lifecycle status of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered, not currently activated
    Idle,
    /// Activated for a task
    Active,
    /// Participating in a coordination round
    Coordinating,
    /// Finished its last task
    Completed,
    /// Last activation failed
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Coordinating => "coordinating",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Capability descriptor for an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tools the agent can use
    #[serde(default)]
    pub tools: Vec<String>,
    /// Domains the agent specializes in; drives capability matching
    #[serde(default)]
    pub specialization_domains: BTreeSet<String>,
    /// Coordination patterns the agent participates in
    #[serde(default)]
    pub coordination_patterns: BTreeSet<String>,
    /// Triggers that suggest activating this agent
    #[serde(default)]
    pub activation_triggers: BTreeSet<String>,
}

impl Capability {
    /// Create a new capability descriptor.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Add a specialization domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.specialization_domains.insert(domain.into());
        self
    }

    /// Add a coordination pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.coordination_patterns.insert(pattern.into());
        self
    }

    /// Add an activation trigger.
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.activation_triggers.insert(trigger.into());
        self
    }

    /// Check whether any specialization domain intersects the required set.
    pub fn matches_any(&self, required: &[String]) -> bool {
        required
            .iter()
            .any(|r| self.specialization_domains.contains(r))
    }
}

/// Immutable agent configuration. Registered once; never mutated through
/// the registry API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique identifier
    pub agent_id: String,
    /// Human-readable name
    pub name: String,
    /// Tier classification
    #[serde(default)]
    pub tier: AgentTier,
    /// Model tag the worker should run with
    #[serde(default = "default_model_tag")]
    pub model_tag: String,
    /// Maximum tokens per worker invocation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Capability descriptor
    #[serde(default)]
    pub capability: Capability,
    /// Coordination priority in [1, 100]; higher wins
    #[serde(default = "default_priority")]
    pub coordination_priority: u8,
    /// Opaque resource requirements for the resource validator
    #[serde(default)]
    pub resource_requirements: BTreeMap<String, serde_json::Value>,
    /// Named quality gate thresholds
    #[serde(default)]
    pub quality_gates: BTreeMap<String, f64>,
}

fn default_model_tag() -> String {
    "claude-sonnet-4".to_string()
}

const fn default_max_tokens() -> u32 {
    200_000
}

const fn default_temperature() -> f64 {
    0.3
}

const fn default_priority() -> u8 {
    50
}

impl AgentConfig {
    /// Create a new agent configuration with defaults.
    pub fn new(agent_id: impl Into<String>, name: impl Into<String>, tier: AgentTier) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            tier,
            model_tag: default_model_tag(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            capability: Capability::default(),
            coordination_priority: default_priority(),
            resource_requirements: BTreeMap::new(),
            quality_gates: BTreeMap::new(),
        }
    }

    /// Set the model tag.
    pub fn with_model(mut self, model_tag: impl Into<String>) -> Self {
        self.model_tag = model_tag.into();
        self
    }

    /// Set the capability descriptor.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    /// Set the coordination priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.coordination_priority = priority;
        self
    }

    /// Add a quality gate threshold.
    pub fn with_quality_gate(mut self, name: impl Into<String>, threshold: f64) -> Self {
        self.quality_gates.insert(name.into(), threshold);
        self
    }

    /// Specialization domains as an owned vector, in sorted order.
    pub fn domains(&self) -> Vec<String> {
        self.capability
            .specialization_domains
            .iter()
            .cloned()
            .collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.agent_id.is_empty() {
            return Err("Agent id cannot be empty".to_string());
        }
        if self.name.is_empty() {
            return Err("Agent name cannot be empty".to_string());
        }
        if self.coordination_priority == 0 || self.coordination_priority > 100 {
            return Err(format!(
                "Coordination priority {} out of range [1, 100]",
                self.coordination_priority
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("Temperature {} out of range", self.temperature));
        }
        Ok(())
    }
}
