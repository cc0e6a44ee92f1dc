//! Control channel over a real Unix socket: newline-framed JSON commands,
//! error envelopes, and concurrent connections.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use waggle::domain::models::{BridgeConfig, CoordinatorConfig, HiveConfig};
use waggle::infrastructure::bridge::ControlBridge;
use waggle::services::hive_memory::CollectiveMemory;
use waggle::services::{AgentRegistryService, HiveService, SwarmHiveCoordinator, SwarmService};

struct TestBridge {
    bridge: Arc<ControlBridge>,
    _dir: tempfile::TempDir,
}

impl TestBridge {
    fn socket_path(&self) -> &Path {
        self.bridge.socket_path()
    }
}

async fn start_bridge(seed: u64) -> TestBridge {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("waggle.sock");

    let registry = Arc::new(AgentRegistryService::with_builtin_catalog().await);
    let hive_config = HiveConfig {
        seed: Some(seed),
        ..HiveConfig::fast()
    };
    let coordinator = Arc::new(SwarmHiveCoordinator::new(
        CoordinatorConfig::default(),
        registry,
        SwarmService::with_defaults(),
        HiveService::new(hive_config, Arc::new(CollectiveMemory::with_defaults())),
    ));

    let config = BridgeConfig {
        socket_path: socket_path.to_string_lossy().into_owned(),
    };
    let bridge = Arc::new(ControlBridge::new(&config, coordinator));
    tokio::spawn(Arc::clone(&bridge).serve());

    // Wait for the listener to come up
    for _ in 0..100 {
        if socket_path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(socket_path.exists(), "bridge did not bind its socket");

    TestBridge { bridge, _dir: dir }
}

async fn connect(path: &Path) -> (BufReader<tokio::net::unix::OwnedReadHalf>, tokio::net::unix::OwnedWriteHalf) {
    let stream = UnixStream::connect(path).await.expect("connect to bridge");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half), write_half)
}

async fn round_trip(
    reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    command: Value,
) -> Value {
    let mut payload = serde_json::to_vec(&command).unwrap();
    payload.push(b'\n');
    writer.write_all(&payload).await.unwrap();
    writer.flush().await.unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    serde_json::from_str(line.trim()).unwrap()
}

#[tokio::test]
async fn hierarchical_single_task_flow() {
    let harness = start_bridge(11).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "swarm_create",
            "params": {
                "id": "s1",
                "topology": "hierarchical",
                "agents": ["project_supervisor_orchestrator", "ios_developer", "ai_engineer"],
            }
        }),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["swarm_id"], "s1");
    assert_eq!(response["topology"], "hierarchical");
    assert_eq!(response["status"], "created");

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "swarm_execute",
            "params": {"swarm_id": "s1", "task": "build ios ai app"}
        }),
    )
    .await;
    assert_eq!(response["success"], true);
    let result = &response["result"];
    assert_eq!(result["status"], "completed");
    assert_eq!(result["approach"], "hierarchical");
    assert_eq!(result["queen_agent"], "project_supervisor_orchestrator");

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "swarm_status", "params": {"swarm_id": "s1"}}),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["status"]["agent_count"], 3);
    assert_eq!(response["status"]["task_queue_size"], 1);

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "swarm_list", "params": {}}),
    )
    .await;
    assert_eq!(response["total"], 1);
    assert_eq!(response["swarms"][0]["id"], "s1");

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "swarm_dissolve", "params": {"swarm_id": "s1", "save_results": true}}),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["results_saved"], true);

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "swarm_status", "params": {"swarm_id": "s1"}}),
    )
    .await;
    assert_eq!(response["error"], "Swarm not found: s1");
}

#[tokio::test]
async fn malformed_json_keeps_connection_alive() {
    let harness = start_bridge(12).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    writer.write_all(b"{not json}\n").await.unwrap();
    writer.flush().await.unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let response: Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(response["error"], "Invalid JSON command");

    // Same connection still serves valid commands
    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "agent_list", "params": {}}),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["total"], 8);
}

#[tokio::test]
async fn unknown_action_is_reported_by_name() {
    let harness = start_bridge(13).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "swarm_teleport", "params": {}}),
    )
    .await;
    assert_eq!(response["error"], "Unknown action: swarm_teleport");
}

#[tokio::test]
async fn hive_memory_round_trip_over_socket() {
    let harness = start_bridge(14).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "hive_remember",
            "params": {
                "content": "AI development needs testing",
                "memory_type": "semantic",
                "contributors": ["ai_engineer"],
                "confidence": 0.9,
            }
        }),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["type"], "semantic");
    assert_eq!(response["contributors"], 1);

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "hive_recall",
            "params": {"query": "AI testing", "min_confidence": 0.8}
        }),
    )
    .await;
    assert_eq!(response["memories_found"], 1);
    assert_eq!(
        response["results"][0]["content_preview"],
        "AI development needs testing"
    );

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "hive_recall",
            "params": {"query": "unrelated topic", "min_confidence": 0.8}
        }),
    )
    .await;
    assert_eq!(response["memories_found"], 0);
}

#[tokio::test]
async fn hive_decision_lifecycle_over_socket() {
    let harness = start_bridge(15).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "hive_init",
            "params": {"agents": ["ai_engineer", "backend_architect", "research_orchestrator"]}
        }),
    )
    .await;
    assert_eq!(response["nodes_created"], 3);
    assert_eq!(response["node_ids"].as_array().unwrap().len(), 3);

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "hive_decide",
            "params": {
                "question": "Which development approach should we use?",
                "options": ["agile", "waterfall", "hybrid"],
                "method": "weighted",
                "timeout": 2,
            }
        }),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["method"], "weighted");
    assert_eq!(response["options"], 3);

    // Give the collectors time to vote and resolve
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({"action": "hive_status", "params": {"nodes": true}}),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["status"]["nodes"], 3);
    assert_eq!(response["status"]["active_decisions"], 0);
    assert_eq!(response["status"]["decision_history"], 1);
    assert_eq!(response["status"]["node_details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn collaborate_runs_end_to_end() {
    let harness = start_bridge(16).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    let response = round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "collaborate",
            "params": {
                "task": "assess the forestry data pipeline",
                "agents": "ios_developer,ai_engineer",
                "mode": "swarm",
            }
        }),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["mode"], "swarm_only");
    assert_eq!(response["agents"].as_array().unwrap().len(), 2);
    assert!(response["duration"].as_f64().unwrap() >= 0.0);
    assert_eq!(response["result"]["status"], "success");
}

#[tokio::test]
async fn concurrent_connections_are_served() {
    let harness = start_bridge(17).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let path = harness.socket_path().to_path_buf();
        tasks.push(tokio::spawn(async move {
            let (mut reader, mut writer) = connect(&path).await;
            round_trip(
                &mut reader,
                &mut writer,
                json!({"action": "agent_list", "params": {}}),
            )
            .await
        }));
    }

    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(response["total"], 8);
    }
}

#[tokio::test]
async fn stop_dissolves_swarms_and_removes_socket() {
    let harness = start_bridge(18).await;
    let (mut reader, mut writer) = connect(harness.socket_path()).await;

    round_trip(
        &mut reader,
        &mut writer,
        json!({
            "action": "swarm_create",
            "params": {"id": "s1", "topology": "mesh", "agents": ["ios_developer"]}
        }),
    )
    .await;

    harness.bridge.stop().await;
    assert!(!harness.socket_path().exists());
}
