//! Waggle - Swarm-Hive Coordination Engine
//!
//! A coordination engine for multi-agent work:
//! - Agent registry with activation bookkeeping and capability matching
//! - Swarm coordination across four topologies (hierarchical, mesh,
//!   collective, adaptive)
//! - Hive intelligence with four collective decision methods and a shared
//!   associative memory with relevance decay
//! - Adaptive swarm/hive/hybrid mode selection with EMA performance learning
//! - Line-delimited JSON control channel over a Unix socket
//! - Resilience layer: per-operation circuit breakers and retry with jitter

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export key types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentConfig, Capability, CoordinationMode, CoordinationTask, DecisionMethod, MemoryType,
    SwarmRole, SwarmTopology,
};
pub use services::coordinator::SwarmHiveCoordinator;
