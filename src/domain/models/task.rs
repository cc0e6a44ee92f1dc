//! Coordination task model.

use serde::{Deserialize, Serialize};

/// How a coordination request should be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationMode {
    /// Pure swarm coordination
    SwarmOnly,
    /// Pure hive intelligence
    HiveOnly,
    /// Hive planning, swarm execution, hive validation
    Hybrid,
    /// Auto-select the best mode from task features and history
    Adaptive,
}

impl CoordinationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwarmOnly => "swarm_only",
            Self::HiveOnly => "hive_only",
            Self::Hybrid => "hybrid",
            Self::Adaptive => "adaptive",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "swarm_only" | "swarm" => Some(Self::SwarmOnly),
            "hive_only" | "hive" => Some(Self::HiveOnly),
            "hybrid" => Some(Self::Hybrid),
            "adaptive" | "adaptive_selection" => Some(Self::Adaptive),
            _ => None,
        }
    }
}

/// A request for coordinated multi-agent work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationTask {
    /// Unique task identifier
    pub task_id: String,
    /// What needs to be done
    pub description: String,
    /// Estimated complexity in [0, 1]
    pub complexity: f64,
    /// Capability domains the task needs
    pub required_capabilities: Vec<String>,
    /// Whether latency matters more than thoroughness
    #[serde(default)]
    pub time_critical: bool,
    /// Requested mode; absent means adaptive selection
    #[serde(default)]
    pub coordination_mode: Option<CoordinationMode>,
    /// Free-form context carried through the phases
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl CoordinationTask {
    /// Create a task with defaults.
    pub fn new(task_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            complexity: 0.5,
            required_capabilities: Vec::new(),
            time_critical: false,
            coordination_mode: None,
            metadata: None,
        }
    }

    /// Set complexity, clamped to [0, 1].
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity.clamp(0.0, 1.0);
        self
    }

    /// Set required capabilities.
    pub fn with_capabilities<I, S>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = caps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the task as time critical.
    pub fn time_critical(mut self, value: bool) -> Self {
        self.time_critical = value;
        self
    }

    /// Pin a coordination mode.
    pub fn with_mode(mut self, mode: CoordinationMode) -> Self {
        self.coordination_mode = Some(mode);
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(CoordinationMode::parse_str("swarm"), Some(CoordinationMode::SwarmOnly));
        assert_eq!(CoordinationMode::parse_str("hive_only"), Some(CoordinationMode::HiveOnly));
        assert_eq!(
            CoordinationMode::parse_str("adaptive_selection"),
            Some(CoordinationMode::Adaptive)
        );
        assert_eq!(CoordinationMode::parse_str("psychic"), None);
    }

    #[test]
    fn test_complexity_clamped() {
        let task = CoordinationTask::new("t1", "overflow").with_complexity(1.7);
        assert!((task.complexity - 1.0).abs() < f64::EPSILON);

        let task = CoordinationTask::new("t2", "underflow").with_complexity(-0.3);
        assert!(task.complexity.abs() < f64::EPSILON);
    }
}
