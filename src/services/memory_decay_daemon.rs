//! Memory decay background daemon.
//!
//! Runs relevance decay for the collective memory store on a fixed cadence,
//! pruning fragments that have faded below the threshold.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, info};

use crate::services::hive_memory::CollectiveMemory;

/// Configuration for the memory decay daemon.
#[derive(Debug, Clone)]
pub struct DecayDaemonConfig {
    /// Interval between decay runs.
    pub decay_interval: Duration,
    /// Whether to run once on startup.
    pub run_on_startup: bool,
}

impl Default for DecayDaemonConfig {
    fn default() -> Self {
        Self {
            decay_interval: Duration::from_secs(300),
            run_on_startup: true,
        }
    }
}

impl DecayDaemonConfig {
    /// Create config with a custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            decay_interval: interval,
            ..Default::default()
        }
    }

    /// Frequent runs for testing.
    pub fn frequent() -> Self {
        Self {
            decay_interval: Duration::from_millis(50),
            run_on_startup: true,
        }
    }
}

/// Status of the decay daemon.
#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    /// Whether the daemon loop is running.
    pub running: bool,
    /// Total decay runs.
    pub total_runs: u64,
    /// Total fragments pruned across all runs.
    pub total_pruned: u64,
}

/// Handle to control a running daemon.
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request the daemon to stop after its current cycle.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Whether stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Current daemon status.
    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

/// Background daemon applying relevance decay to collective memory.
pub struct MemoryDecayDaemon {
    memory: Arc<CollectiveMemory>,
    config: DecayDaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
}

impl MemoryDecayDaemon {
    /// Create a new decay daemon.
    pub fn new(memory: Arc<CollectiveMemory>, config: DecayDaemonConfig) -> Self {
        Self {
            memory,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults(memory: Arc<CollectiveMemory>) -> Self {
        Self::new(memory, DecayDaemonConfig::default())
    }

    /// Get a handle to control the daemon.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            status: self.status.clone(),
        }
    }

    /// Spawn the daemon loop onto the runtime.
    pub fn spawn(self) -> DaemonHandle {
        let handle = self.handle();
        tokio::spawn(async move {
            self.run_loop().await;
        });
        handle
    }

    /// Main daemon loop.
    async fn run_loop(self) {
        {
            let mut status = self.status.write().await;
            status.running = true;
        }
        info!(interval_ms = self.config.decay_interval.as_millis() as u64, "decay_daemon_started");

        if self.config.run_on_startup {
            self.run_cycle().await;
        }

        let mut ticker = interval(self.config.decay_interval);
        ticker.tick().await; // first tick resolves immediately

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    self.run_cycle().await;
                }
            }

            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
        }

        {
            let mut status = self.status.write().await;
            status.running = false;
        }
        info!("decay_daemon_stopped");
    }

    /// Run a single decay cycle.
    async fn run_cycle(&self) {
        let pruned = self.memory.decay_memory().await;

        let mut status = self.status.write().await;
        status.total_runs += 1;
        status.total_pruned += pruned.len() as u64;
        debug!(run = status.total_runs, pruned = pruned.len(), "decay_cycle_completed");
    }

    /// Run decay once (manual invocation). Returns pruned fragment ids.
    pub async fn run_once(&self) -> Vec<String> {
        let pruned = self.memory.decay_memory().await;
        let mut status = self.status.write().await;
        status.total_runs += 1;
        status.total_pruned += pruned.len() as u64;
        pruned
    }

    /// Configuration in effect.
    pub fn config(&self) -> &DecayDaemonConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MemoryType;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn test_config_defaults() {
        let config = DecayDaemonConfig::default();
        assert_eq!(config.decay_interval, Duration::from_secs(300));
        assert!(config.run_on_startup);
    }

    #[test]
    fn test_config_with_interval() {
        let config = DecayDaemonConfig::with_interval(Duration::from_secs(60));
        assert_eq!(config.decay_interval, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_run_once_counts_runs() {
        let memory = Arc::new(CollectiveMemory::with_defaults());
        memory
            .store(
                json!("short lived note"),
                MemoryType::Working,
                BTreeSet::from(["a".to_string()]),
                0.8,
            )
            .await;

        let daemon = MemoryDecayDaemon::with_defaults(Arc::clone(&memory));
        let pruned = daemon.run_once().await;
        // Freshly stored fragment has no idle time to charge
        assert!(pruned.is_empty());

        let handle = daemon.handle();
        let status = handle.status().await;
        assert_eq!(status.total_runs, 1);
        assert_eq!(status.total_pruned, 0);
    }

    #[tokio::test]
    async fn test_spawn_and_stop() {
        let memory = Arc::new(CollectiveMemory::with_defaults());
        let daemon = MemoryDecayDaemon::new(Arc::clone(&memory), DecayDaemonConfig::frequent());
        let handle = daemon.spawn();

        // Let a few cycles run
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let status = handle.status().await;
        assert!(status.total_runs >= 1);
        assert!(!status.running);
    }
}
