use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Socket path cannot be empty")]
    EmptySocketPath,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid consensus threshold: {0}. Must be in (0, 1]")]
    InvalidConsensusThreshold(f64),

    #[error("Invalid swarm size: {0}. Must be between 1 and 64")]
    InvalidSwarmSize(usize),

    #[error("Invalid deliberation range: [{0}, {1}] ms")]
    InvalidDeliberationRange(u64, u64),

    #[error("Invalid max_attempts: {0}. Cannot be 0")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid backoff configuration: initial_delay_ms ({0}) must not exceed max_delay_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid decay rate: {0}. Must be in (0, 1)")]
    InvalidDecayRate(f64),

    #[error("Invalid learning rate: {0}. Must be in (0, 1]")]
    InvalidLearningRate(f64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .waggle/config.yaml (project config)
    /// 3. .waggle/local.yaml (project local overrides, optional)
    /// 4. Environment variables (WAGGLE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".waggle/config.yaml"))
            .merge(Yaml::file(".waggle/local.yaml"))
            .merge(Env::prefixed("WAGGLE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.bridge.socket_path.is_empty() {
            return Err(ConfigError::EmptySocketPath);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.swarm.max_agents == 0 || config.swarm.max_agents > 64 {
            return Err(ConfigError::InvalidSwarmSize(config.swarm.max_agents));
        }

        if !(config.hive.consensus_threshold > 0.0 && config.hive.consensus_threshold <= 1.0) {
            return Err(ConfigError::InvalidConsensusThreshold(
                config.hive.consensus_threshold,
            ));
        }

        if config.hive.deliberation_min_ms > config.hive.deliberation_max_ms {
            return Err(ConfigError::InvalidDeliberationRange(
                config.hive.deliberation_min_ms,
                config.hive.deliberation_max_ms,
            ));
        }

        if config.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.retry.max_attempts));
        }

        if config.retry.initial_delay_ms > config.retry.max_delay_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_delay_ms,
                config.retry.max_delay_ms,
            ));
        }

        if !(config.memory.decay_rate > 0.0 && config.memory.decay_rate < 1.0) {
            return Err(ConfigError::InvalidDecayRate(config.memory.decay_rate));
        }

        if !(config.coordinator.learning_rate > 0.0 && config.coordinator.learning_rate <= 1.0) {
            return Err(ConfigError::InvalidLearningRate(
                config.coordinator.learning_rate,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.bridge.socket_path, "/tmp/anf_python.sock");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = Config::default();
        config.hive.consensus_threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConsensusThreshold(_))
        ));
    }

    #[test]
    fn test_inverted_backoff_rejected() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 60_000;
        config.retry.max_delay_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(_, _))
        ));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = std::env::temp_dir().join(format!("waggle_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(&path, "swarm:\n  max_agents: 4\nlogging:\n  level: debug\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.swarm.max_agents, 4);
        assert_eq!(config.logging.level, "debug");
        // Untouched values keep their defaults
        assert_eq!(config.hive.max_nodes, 10);

        std::fs::remove_dir_all(&dir).ok();
    }
}
