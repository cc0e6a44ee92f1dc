//! Engine services for the Waggle coordination system.

pub mod agent_registry;
pub mod circuit_breaker;
pub mod coordinator;
pub mod health;
pub mod hive;
pub mod hive_memory;
pub mod memory_decay_daemon;
pub mod resilience;
pub mod retry;
pub mod swarm;

pub use agent_registry::AgentRegistryService;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerService, CircuitState, CircuitStats};
pub use coordinator::{CoordinationReport, SwarmHiveCoordinator};
pub use health::{HealthMonitor, HealthReport, HealthStatus};
pub use hive::HiveService;
pub use hive_memory::CollectiveMemory;
pub use memory_decay_daemon::{DaemonHandle, DaemonStatus, DecayDaemonConfig, MemoryDecayDaemon};
pub use resilience::{ResilienceKit, KNOWN_CIRCUITS};
pub use retry::RetryPolicy;
pub use swarm::SwarmService;
