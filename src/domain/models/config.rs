//! Configuration model for the coordination engine.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Waggle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Control bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Agent registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Swarm engine configuration
    #[serde(default)]
    pub swarm: SwarmConfig,

    /// Hive engine configuration
    #[serde(default)]
    pub hive: HiveConfig,

    /// Collective memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySettings,

    /// Circuit breaker configuration
    #[serde(default)]
    pub circuit: CircuitBreakerSettings,

    /// Coordinator configuration
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

/// Control bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Unix socket path the bridge listens on
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

fn default_socket_path() -> String {
    "/tmp/anf_python.sock".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for daily-rotated file output
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Agent registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryConfig {
    /// Optional YAML/JSON file overlaying the built-in agent catalog
    #[serde(default)]
    pub agents_file: Option<String>,
}

/// Swarm engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SwarmConfig {
    /// Maximum agents placed in a coordinator-formed swarm
    #[serde(default = "default_max_swarm_agents")]
    pub max_agents: usize,

    /// Hard deadline for one swarm coordination round, in seconds
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

const fn default_max_swarm_agents() -> usize {
    8
}

const fn default_task_timeout_secs() -> u64 {
    300
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_agents: default_max_swarm_agents(),
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

/// Hive engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HiveConfig {
    /// Vote share an option needs for consensus
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: f64,

    /// Maximum hive nodes initialized per coordination
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Lower bound of the per-node deliberation delay, in milliseconds
    #[serde(default = "default_deliberation_min_ms")]
    pub deliberation_min_ms: u64,

    /// Upper bound of the per-node deliberation delay, in milliseconds
    #[serde(default = "default_deliberation_max_ms")]
    pub deliberation_max_ms: u64,

    /// Default decision budget, in seconds
    #[serde(default = "default_decision_timeout_secs")]
    pub decision_timeout_secs: u64,

    /// Decision budget for time-critical tasks, in seconds
    #[serde(default = "default_decision_timeout_critical_secs")]
    pub decision_timeout_critical_secs: u64,

    /// Interval at which decision waits poll for resolution, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Seed for expertise noise and deliberation delays; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_consensus_threshold() -> f64 {
    0.75
}

const fn default_max_nodes() -> usize {
    10
}

const fn default_deliberation_min_ms() -> u64 {
    100
}

const fn default_deliberation_max_ms() -> u64 {
    2000
}

const fn default_decision_timeout_secs() -> u64 {
    300
}

const fn default_decision_timeout_critical_secs() -> u64 {
    120
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: default_consensus_threshold(),
            max_nodes: default_max_nodes(),
            deliberation_min_ms: default_deliberation_min_ms(),
            deliberation_max_ms: default_deliberation_max_ms(),
            decision_timeout_secs: default_decision_timeout_secs(),
            decision_timeout_critical_secs: default_decision_timeout_critical_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            seed: None,
        }
    }
}

impl HiveConfig {
    /// Fast deliberation and tight budgets for tests.
    pub fn fast() -> Self {
        Self {
            deliberation_min_ms: 5,
            deliberation_max_ms: 40,
            decision_timeout_secs: 5,
            decision_timeout_critical_secs: 3,
            poll_interval_ms: 20,
            ..Default::default()
        }
    }
}

/// Collective memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryConfig {
    /// Interval between decay daemon runs, in seconds
    #[serde(default = "default_decay_interval_secs")]
    pub decay_interval_secs: u64,

    /// Hourly decay multiplier applied to untouched fragments
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Fragments below this relevance are pruned
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
}

const fn default_decay_interval_secs() -> u64 {
    300
}

const fn default_decay_rate() -> f64 {
    0.95
}

const fn default_prune_threshold() -> f64 {
    0.1
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_interval_secs: default_decay_interval_secs(),
            decay_rate: default_decay_rate(),
            prune_threshold: default_prune_threshold(),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrySettings {
    /// Maximum attempts per invocation (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff cap, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier between attempts
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Whether to apply full jitter in [0.5, 1.5] x delay
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_jitter() -> bool {
    true
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before probing
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,

    /// Consecutive half-open successes before closing
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Per-call deadline, in seconds; expiry counts as a failure
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_recovery_timeout_secs() -> u64 {
    60
}

const fn default_success_threshold() -> u32 {
    3
}

const fn default_call_timeout_secs() -> u64 {
    30
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            success_threshold: default_success_threshold(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

/// Coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoordinatorConfig {
    /// EMA smoothing rate for performance learning
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Complexity threshold above which hybrid mode is preferred
    #[serde(default = "default_hybrid_threshold")]
    pub hybrid_threshold: f64,
}

const fn default_learning_rate() -> f64 {
    0.1
}

const fn default_hybrid_threshold() -> f64 {
    0.7
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            hybrid_threshold: default_hybrid_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bridge.socket_path, "/tmp/anf_python.sock");
        assert_eq!(config.swarm.max_agents, 8);
        assert_eq!(config.hive.max_nodes, 10);
        assert!((config.hive.consensus_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.circuit.failure_threshold, 5);
        assert!((config.coordinator.learning_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_yaml_deserializes_with_defaults() {
        let yaml = "hive:\n  max_nodes: 4\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.hive.max_nodes, 4);
        // Untouched sections fall back to defaults
        assert_eq!(config.hive.decision_timeout_secs, 300);
        assert_eq!(config.swarm.max_agents, 8);
    }

    #[test]
    fn test_fast_hive_preset() {
        let config = HiveConfig::fast();
        assert!(config.deliberation_max_ms < 100);
        assert!(config.decision_timeout_secs <= 5);
    }
}
