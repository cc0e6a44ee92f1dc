//! Waggle daemon entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;

use waggle::domain::models::{builtin_agents, Config};
use waggle::infrastructure::bridge::ControlBridge;
use waggle::infrastructure::config::ConfigLoader;
use waggle::infrastructure::logging;
use waggle::services::{
    AgentRegistryService, DecayDaemonConfig, HealthMonitor, HiveService, MemoryDecayDaemon,
    ResilienceKit, SwarmHiveCoordinator, SwarmService,
};
use waggle::services::hive_memory::CollectiveMemory;

#[derive(Parser)]
#[command(name = "waggle", version, about = "Swarm-hive coordination engine")]
struct Cli {
    /// Path to a configuration file (defaults to .waggle/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordination daemon on the control socket
    Serve {
        /// Override the Unix socket path
        #[arg(long)]
        socket: Option<String>,
    },
    /// Print the built-in agent catalog
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };

    match cli.command {
        Commands::Agents => {
            print_agent_catalog();
            Ok(())
        }
        Commands::Serve { socket } => {
            if let Some(socket) = socket {
                config.bridge.socket_path = socket;
            }
            serve(config).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let _logger_guard =
        logging::init(&config.logging).context("Failed to initialize logging")?;

    // Registry first; both engines receive it by handle
    let registry = Arc::new(AgentRegistryService::with_builtin_catalog().await);
    if let Some(ref agents_file) = config.registry.agents_file {
        registry
            .overlay_from_file(agents_file)
            .await
            .with_context(|| format!("Failed to load agents file {agents_file}"))?;
    }

    let memory = Arc::new(CollectiveMemory::new(config.memory.clone()));
    let swarm = SwarmService::new(config.swarm.clone());
    let hive = HiveService::new(config.hive.clone(), Arc::clone(&memory));

    let coordinator = Arc::new(SwarmHiveCoordinator::new(
        config.coordinator.clone(),
        Arc::clone(&registry),
        swarm,
        hive,
    ));

    let resilience = ResilienceKit::new(config.circuit.clone(), config.retry.clone());
    resilience.register_known_circuits().await;

    let decay_daemon = MemoryDecayDaemon::new(
        Arc::clone(&memory),
        DecayDaemonConfig::with_interval(Duration::from_secs(config.memory.decay_interval_secs)),
    );
    let decay_handle = decay_daemon.spawn();

    let health = HealthMonitor::new(Arc::clone(&registry), Arc::clone(&coordinator));
    health.full_health_check().await;

    let bridge = Arc::new(ControlBridge::new(&config.bridge, Arc::clone(&coordinator)));
    let server = {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(bridge.serve())
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    bridge.stop().await;
    decay_handle.stop();
    registry.shutdown().await;
    server.abort();

    Ok(())
}

fn print_agent_catalog() {
    let mut table = Table::new();
    table.set_header(vec!["id", "name", "tier", "priority", "domains"]);

    for agent in builtin_agents() {
        table.add_row(vec![
            agent.agent_id.clone(),
            agent.name.clone(),
            agent.tier.as_str().to_string(),
            agent.coordination_priority.to_string(),
            agent.domains().join(", "),
        ]);
    }

    println!("{table}");
}
