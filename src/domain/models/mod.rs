//! Domain models
//!
//! Pure domain entities with business logic and validation rules.
//! These models are framework-agnostic and contain no infrastructure
//! concerns.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod hive;
pub mod swarm;
pub mod task;

pub use agent::{AgentConfig, AgentStatus, AgentTier, Capability};
pub use catalog::builtin_agents;
pub use config::{
    BridgeConfig, CircuitBreakerSettings, Config, CoordinatorConfig, HiveConfig, LoggingConfig,
    MemoryConfig, RegistryConfig, RetrySettings, SwarmConfig,
};
pub use hive::{
    cosine_similarity, expertise_alignment, expertise_basis, DecisionMethod, DecisionOption,
    DecisionResolution, DecisionSignature, HiveDecision, HiveMemoryFragment, HiveNode,
    MemoryType, OptionScore, OptionTally, Vote, EXPERTISE_DIM, EXPERTISE_DOMAINS,
};
pub use swarm::{Proposal, Swarm, SwarmAgent, SwarmRole, SwarmTask, SwarmTaskReport, SwarmTopology};
pub use task::{CoordinationMode, CoordinationTask};
