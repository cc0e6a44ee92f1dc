//! End-to-end coordination: mode selection with EMA learning, the full
//! hybrid pipeline, and persistent swarm-hive groups.

use std::sync::Arc;

use serde_json::json;
use waggle::domain::models::{
    CoordinationMode, CoordinationTask, CoordinatorConfig, HiveConfig, SwarmTopology,
};
use waggle::services::hive_memory::CollectiveMemory;
use waggle::services::{AgentRegistryService, HiveService, SwarmHiveCoordinator, SwarmService};

async fn fast_coordinator(seed: u64) -> SwarmHiveCoordinator {
    let registry = Arc::new(AgentRegistryService::with_builtin_catalog().await);
    let hive_config = HiveConfig {
        seed: Some(seed),
        ..HiveConfig::fast()
    };
    SwarmHiveCoordinator::new(
        CoordinatorConfig::default(),
        registry,
        SwarmService::with_defaults(),
        HiveService::new(hive_config, Arc::new(CollectiveMemory::with_defaults())),
    )
}

#[tokio::test]
async fn adaptive_selection_tie_breaks_to_swarm_then_learns() {
    let coordinator = fast_coordinator(1).await;
    let task = CoordinationTask::new("t_simple", "small development chore")
        .with_complexity(0.2)
        .with_capabilities(["development"])
        .with_mode(CoordinationMode::Adaptive);

    // Empty EMA table: the swarm/hive tie breaks toward swarm
    assert_eq!(
        coordinator.select_coordination_mode(&task).await,
        CoordinationMode::SwarmOnly
    );

    // Ten rounds of hive outperforming swarm flip the choice
    for _ in 0..10 {
        coordinator
            .record_performance(CoordinationMode::HiveOnly, 0.95, 0.5)
            .await;
        coordinator
            .record_performance(CoordinationMode::SwarmOnly, 0.1, 0.5)
            .await;
    }
    assert_eq!(
        coordinator.select_coordination_mode(&task).await,
        CoordinationMode::HiveOnly
    );
}

#[tokio::test]
async fn full_adaptive_coordination_learns_from_outcome() {
    let coordinator = fast_coordinator(2).await;
    let task = CoordinationTask::new("t_urgent", "hotfix the gateway")
        .with_complexity(0.4)
        .with_capabilities(["backend", "api"])
        .time_critical(true);

    // Urgent with few capabilities resolves to a swarm run
    let report = coordinator.coordinate_task(task, None).await.unwrap();
    assert_eq!(report.coordination_mode, "swarm_only");
    assert_eq!(report.result["status"], "success");
    assert_eq!(report.result["topology_used"], "mesh");

    // The outcome landed in the EMA table
    assert!(coordinator.ema("swarm_only_avg_efficiency").await.is_some());
    assert!(coordinator.ema("swarm_only_avg_duration").await.is_some());

    // The ephemeral swarm was dissolved on the way out
    assert!(coordinator.swarm().swarm_ids().await.is_empty());
}

#[tokio::test]
async fn hybrid_pipeline_produces_three_phases() {
    let coordinator = fast_coordinator(3).await;
    let task = CoordinationTask::new("t_hybrid", "design and ship the ai feature")
        .with_complexity(0.75)
        .with_capabilities(["ai", "backend"]);

    let report = coordinator.coordinate_task(task, None).await.unwrap();
    assert_eq!(report.coordination_mode, "hybrid");

    let phases = &report.result["phases"];
    assert_eq!(phases["hive_planning"]["approach"], "hive_only");
    assert_eq!(phases["swarm_execution"]["approach"], "swarm_only");

    let alignment = phases["hive_validation"]["strategy_execution_alignment"]
        .as_f64()
        .unwrap();
    assert!((0.0..=1.0).contains(&alignment));

    // The validation fragment is recallable episodic memory
    let validation_id = phases["hive_validation"]["validation_memory_id"]
        .as_str()
        .unwrap();
    assert!(validation_id.starts_with("hive_memory_episodic_"));
    assert!(coordinator.hive().memory().get(validation_id).await.is_some());
}

#[tokio::test]
async fn persistent_group_survives_coordinations() {
    let coordinator = fast_coordinator(4).await;
    let agents = vec![
        "project_supervisor_orchestrator".to_string(),
        "ios_developer".to_string(),
        "ai_engineer".to_string(),
    ];

    coordinator
        .create_persistent_swarm_hive("mobile_team", &agents, json!({"swarm_topology": "hierarchical"}))
        .await
        .unwrap();

    let task = CoordinationTask::new("t_run", "iterate on the app")
        .with_complexity(0.4)
        .with_capabilities(["ios"])
        .time_critical(true);
    coordinator.coordinate_task(task, None).await.unwrap();

    // The persistent swarm is untouched by the ephemeral run
    let persistent = coordinator
        .swarm()
        .swarm_snapshot("persistent_mobile_team")
        .await
        .unwrap();
    assert_eq!(persistent.topology, SwarmTopology::Hierarchical);
    assert_eq!(persistent.agents.len(), 3);

    // Hive nodes for the group exist exactly once per agent
    assert_eq!(coordinator.hive().node_count().await, 3);
}

#[tokio::test]
async fn coordination_status_aggregates_components() {
    let coordinator = fast_coordinator(5).await;
    let task = CoordinationTask::new("t_status", "quick mesh run")
        .with_complexity(0.3)
        .with_capabilities(["ai"])
        .time_critical(true);
    coordinator.coordinate_task(task, None).await.unwrap();

    let status = coordinator.coordination_status().await;
    assert_eq!(status["coordinator"]["active_coordinations"], 0);
    assert_eq!(status["coordinator"]["coordination_history"], 1);
    assert!(status["system_health"]["swarm_efficiency"].as_f64().is_some());
    assert!(status["swarm_manager"]["active_swarms"].as_u64().is_some());
    assert!(status["hive_intelligence"]["nodes"].as_u64().is_some());
}
