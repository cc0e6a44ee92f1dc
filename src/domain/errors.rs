//! Domain errors for the Waggle coordination engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Domain-level errors that can occur in the coordination engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Swarm not found: {0}")]
    SwarmNotFound(String),

    #[error("Decision not found: {0}")]
    DecisionNotFound(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Coordination failed: {0}")]
    Coordination(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Circuit breaker open for {circuit}, retry after {retry_after}")]
    CircuitOpen {
        circuit: String,
        retry_after: DateTime<Utc>,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the resilience layer may retry an operation that failed with
    /// this error. Resource exhaustion, bad input and lookup failures are
    /// final; coordination, timeout and internal errors are transient.
    pub fn recoverable(&self) -> bool {
        match self {
            Self::Coordination(_) | Self::Timeout(_) | Self::Internal(_) => true,
            Self::AgentNotFound(_)
            | Self::SwarmNotFound(_)
            | Self::DecisionNotFound(_)
            | Self::UnknownAction(_)
            | Self::InvalidInput(_)
            | Self::ResourceExhausted(_)
            | Self::CircuitOpen { .. }
            | Self::Serialization(_) => false,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(DomainError::Coordination("fan-out failed".into()).recoverable());
        assert!(DomainError::Timeout("budget expired".into()).recoverable());
        assert!(DomainError::Internal("oops".into()).recoverable());

        assert!(!DomainError::ResourceExhausted("no slots".into()).recoverable());
        assert!(!DomainError::AgentNotFound("ghost".into()).recoverable());
        assert!(!DomainError::InvalidInput("bad enum".into()).recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = DomainError::AgentNotFound("ios_developer".into());
        assert_eq!(err.to_string(), "Agent not found: ios_developer");

        let err = DomainError::UnknownAction("swarm_fly".into());
        assert_eq!(err.to_string(), "Unknown action: swarm_fly");
    }
}
