//! Abstract ports the engine depends on.
//!
//! Traits defined here are implemented by infrastructure or supplied by the
//! embedding application: the agent worker that actually produces
//! proposals, the metrics sink, and the resource validator gating
//! activation.

pub mod metrics;
pub mod resource;
pub mod worker;

pub use metrics::{InMemoryMetrics, MetricsSink, NoopMetrics};
pub use resource::{AlwaysAvailable, ResourceValidator};
pub use worker::{AgentWorker, SimulatedWorker};
