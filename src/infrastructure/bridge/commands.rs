//! Control-channel command dispatch.
//!
//! One JSON object per line, shaped `{"action": "...", "params": {...}}`.
//! Unknown fields are ignored; enum values are validated explicitly.
//! Every command produces a JSON object: either `"success": true` plus
//! domain fields, or an `"error"` message.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CoordinationMode, CoordinationTask, DecisionMethod, DecisionOption, MemoryType, SwarmTask,
    SwarmTopology,
};
use crate::services::coordinator::SwarmHiveCoordinator;
use uuid::Uuid;

/// Dispatches control-channel commands onto the coordinator.
pub struct CommandDispatcher {
    coordinator: Arc<SwarmHiveCoordinator>,
}

impl CommandDispatcher {
    pub fn new(coordinator: Arc<SwarmHiveCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Handle one raw line from the control channel.
    pub async fn dispatch_line(&self, line: &str) -> Value {
        let command: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => return json!({"error": "Invalid JSON command"}),
        };

        let action = command
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = command.get("params").cloned().unwrap_or_else(|| json!({}));

        info!(action = %action, "processing_command");

        match self.dispatch(&action, &params).await {
            Ok(response) => response,
            Err(err) => json!({"error": err.to_string()}),
        }
    }

    /// Route an action to its handler.
    pub async fn dispatch(&self, action: &str, params: &Value) -> DomainResult<Value> {
        match action {
            "swarm_create" => self.handle_swarm_create(params).await,
            "swarm_execute" => self.handle_swarm_execute(params).await,
            "swarm_status" => self.handle_swarm_status(params).await,
            "swarm_dissolve" => self.handle_swarm_dissolve(params).await,
            "swarm_list" => self.handle_swarm_list(params).await,
            "hive_init" => self.handle_hive_init(params).await,
            "hive_decide" => self.handle_hive_decide(params).await,
            "hive_remember" => self.handle_hive_remember(params).await,
            "hive_recall" => self.handle_hive_recall(params).await,
            "hive_status" => self.handle_hive_status(params).await,
            "collaborate" => self.handle_collaborate(params).await,
            "agent_list" => self.handle_agent_list(params).await,
            "agent_info" => self.handle_agent_info(params).await,
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }

    // ------------------------------------------------------------------
    // Swarm handlers
    // ------------------------------------------------------------------

    async fn handle_swarm_create(&self, params: &Value) -> DomainResult<Value> {
        let swarm_id = str_param(params, "id")
            .map(String::from)
            .unwrap_or_else(|| format!("swarm_{}", &Uuid::new_v4().simple().to_string()[..8]));
        let topology_name = str_param(params, "topology").unwrap_or("adaptive");
        let topology = SwarmTopology::parse_str(topology_name)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown topology: {topology_name}")))?;
        let agents = string_list(params.get("agents"));
        let task_description = str_param(params, "task").unwrap_or_default();

        self.coordinator
            .swarm()
            .create_swarm(
                &swarm_id,
                topology,
                &agents,
                self.coordinator.registry(),
                json!({"description": task_description, "created_via": "control_channel"}),
            )
            .await;

        Ok(json!({
            "success": true,
            "swarm_id": swarm_id,
            "topology": topology.as_str(),
            "agents": agents.len(),
            "status": "created",
        }))
    }

    async fn handle_swarm_execute(&self, params: &Value) -> DomainResult<Value> {
        let swarm_id = require_str(params, "swarm_id")?;
        let task_description = str_param(params, "task").unwrap_or_default().to_string();
        let budget = params
            .get("timeout")
            .and_then(Value::as_u64)
            .map(Duration::from_secs);

        let task = SwarmTask {
            task_id: String::new(),
            description: task_description.clone(),
            complexity: 0.7,
            time_critical: false,
            required_capabilities: Vec::new(),
            metadata: None,
        };

        let report = self.coordinator.swarm().coordinate_task(swarm_id, task, budget).await?;

        Ok(json!({
            "success": true,
            "swarm_id": swarm_id,
            "task": task_description,
            "result": report,
        }))
    }

    async fn handle_swarm_status(&self, params: &Value) -> DomainResult<Value> {
        let swarm_id = require_str(params, "swarm_id")?;
        let status = self
            .coordinator
            .swarm()
            .swarm_status(swarm_id)
            .await
            .ok_or_else(|| DomainError::SwarmNotFound(swarm_id.to_string()))?;

        Ok(json!({"success": true, "status": status}))
    }

    async fn handle_swarm_dissolve(&self, params: &Value) -> DomainResult<Value> {
        let swarm_id = require_str(params, "swarm_id")?;
        let save_results = params
            .get("save_results")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        self.coordinator.swarm().dissolve_swarm(swarm_id).await?;

        Ok(json!({
            "success": true,
            "swarm_id": swarm_id,
            "results_saved": save_results,
        }))
    }

    async fn handle_swarm_list(&self, params: &Value) -> DomainResult<Value> {
        let detailed = params
            .get("detailed")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut swarms = Vec::new();
        for swarm_id in self.coordinator.swarm().swarm_ids().await {
            let Some(status) = self.coordinator.swarm().swarm_status(&swarm_id).await else {
                continue;
            };
            let mut entry = json!({
                "id": swarm_id,
                "topology": status.topology,
                "agents": status.agent_count,
                "status": "active",
            });
            if detailed {
                entry["detail"] = serde_json::to_value(&status)?;
            }
            swarms.push(entry);
        }

        Ok(json!({
            "success": true,
            "total": swarms.len(),
            "swarms": swarms,
        }))
    }

    // ------------------------------------------------------------------
    // Hive handlers
    // ------------------------------------------------------------------

    async fn handle_hive_init(&self, params: &Value) -> DomainResult<Value> {
        let agents = string_list(params.get("agents"));
        let fallback_capabilities = string_list(params.get("capabilities"));

        let mut node_ids = Vec::new();
        for agent_id in &agents {
            let capabilities = match self.coordinator.registry().get(agent_id).await {
                Some(config) => config.domains(),
                None => fallback_capabilities.clone(),
            };
            let node = self.coordinator.hive().init_node(agent_id, &capabilities).await;
            node_ids.push(node.node_id);
        }

        Ok(json!({
            "success": true,
            "nodes_created": node_ids.len(),
            "node_ids": node_ids,
        }))
    }

    async fn handle_hive_decide(&self, params: &Value) -> DomainResult<Value> {
        let question = require_str(params, "question")?.to_string();
        let raw_options = string_list(params.get("options"));
        if raw_options.is_empty() {
            return Err(DomainError::InvalidInput(
                "hive_decide needs at least one option".to_string(),
            ));
        }

        let method_name = str_param(params, "method").unwrap_or("consensus");
        let method = DecisionMethod::parse_str(method_name)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown decision method: {method_name}")))?;
        let timeout_secs = params.get("timeout").and_then(Value::as_u64).unwrap_or(300);

        let options: Vec<DecisionOption> = raw_options
            .iter()
            .enumerate()
            .map(|(i, description)| {
                DecisionOption::new(format!("option_{i}"), description)
                    .with_expertise(vec![i % 3])
            })
            .collect();

        let option_count = options.len();
        let decision_id = self
            .coordinator
            .hive()
            .initiate_decision(&question, options, method, Duration::from_secs(timeout_secs))
            .await?;

        Ok(json!({
            "success": true,
            "decision_id": decision_id,
            "question": question,
            "options": option_count,
            "method": method.as_str(),
        }))
    }

    async fn handle_hive_remember(&self, params: &Value) -> DomainResult<Value> {
        let content = params.get("content").cloned().unwrap_or(Value::Null);
        let type_name = str_param(params, "memory_type").unwrap_or("semantic");
        let memory_type = MemoryType::parse_str(type_name)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown memory type: {type_name}")))?;
        let contributors: std::collections::BTreeSet<String> =
            string_list(params.get("contributors")).into_iter().collect();
        let confidence = params
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.8);

        let contributor_count = contributors.len();
        let preview = content_preview(&content, 100);
        let memory_id = self
            .coordinator
            .hive()
            .store_memory(content, memory_type, contributors, confidence)
            .await;

        Ok(json!({
            "success": true,
            "memory_id": memory_id,
            "content_preview": preview,
            "type": memory_type.as_str(),
            "contributors": contributor_count,
        }))
    }

    async fn handle_hive_recall(&self, params: &Value) -> DomainResult<Value> {
        let query = require_str(params, "query")?.to_string();
        let memory_type = match str_param(params, "memory_type") {
            Some(name) => Some(MemoryType::parse_str(name).ok_or_else(|| {
                DomainError::InvalidInput(format!("unknown memory type: {name}"))
            })?),
            None => None,
        };
        let min_confidence = params
            .get("min_confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5);

        let memories = self
            .coordinator
            .hive()
            .memory()
            .recall(&query, memory_type, min_confidence)
            .await;

        let results: Vec<Value> = memories
            .iter()
            .map(|fragment| {
                json!({
                    "fragment_id": fragment.fragment_id,
                    "content_preview": content_preview(&fragment.content, 200),
                    "confidence": fragment.confidence_score,
                    "type": fragment.memory_type.as_str(),
                    "contributors": fragment.contributors.len(),
                    "access_count": fragment.access_count,
                })
            })
            .collect();

        Ok(json!({
            "success": true,
            "query": query,
            "memories_found": results.len(),
            "results": results,
        }))
    }

    async fn handle_hive_status(&self, params: &Value) -> DomainResult<Value> {
        let show_nodes = params.get("nodes").and_then(Value::as_bool).unwrap_or(false);

        let mut status = serde_json::to_value(self.coordinator.hive().status().await)?;

        if show_nodes {
            let nodes = self.coordinator.hive().nodes_snapshot().await;
            let details: Vec<Value> = nodes
                .iter()
                .take(10)
                .map(|node| {
                    json!({
                        "node_id": node.node_id,
                        "agent_id": node.agent_id,
                        "connections": node.connections.len(),
                        "influence_score": node.influence_score,
                    })
                })
                .collect();
            status["node_details"] = json!(details);
        }

        Ok(json!({"success": true, "status": status}))
    }

    // ------------------------------------------------------------------
    // General handlers
    // ------------------------------------------------------------------

    async fn handle_collaborate(&self, params: &Value) -> DomainResult<Value> {
        let task_description = require_str(params, "task")?.to_string();
        let agents = match params.get("agents") {
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            other => string_list(other),
        };
        let mode_name = str_param(params, "mode").unwrap_or("adaptive");
        let mode = CoordinationMode::parse_str(mode_name)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown coordination mode: {mode_name}")))?;

        let required = if agents.is_empty() {
            vec!["development".to_string(), "coordination".to_string()]
        } else {
            agents.clone()
        };

        let task = CoordinationTask::new(
            format!("collaborate_{}", &Uuid::new_v4().simple().to_string()[..8]),
            task_description.clone(),
        )
        .with_complexity(0.7)
        .with_capabilities(required)
        .with_mode(mode);

        let preferred = if agents.is_empty() { None } else { Some(agents.clone()) };
        let report = self.coordinator.coordinate_task(task, preferred).await?;

        Ok(json!({
            "success": true,
            "task": task_description,
            "agents": agents,
            "mode": report.coordination_mode,
            "duration": report.duration_seconds,
            "result": report.result,
        }))
    }

    async fn handle_agent_list(&self, params: &Value) -> DomainResult<Value> {
        let category = str_param(params, "category");
        let active_only = params.get("active").and_then(Value::as_bool).unwrap_or(false);

        let mut agents = Vec::new();
        if active_only {
            let active = self.coordinator.registry().active_snapshot().await;
            let mut entries: Vec<_> = active.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (agent_id, config) in entries {
                agents.push(json!({
                    "id": agent_id,
                    "name": config.name,
                    "tier": config.tier.as_str(),
                    "status": "active",
                }));
            }
        } else {
            let registry = self.coordinator.registry().registry_snapshot().await;
            let mut entries: Vec<_> = registry.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (agent_id, config) in entries {
                if let Some(category) = category {
                    if !config
                        .capability
                        .specialization_domains
                        .contains(category)
                    {
                        continue;
                    }
                }
                agents.push(json!({
                    "id": agent_id,
                    "name": config.name,
                    "tier": config.tier.as_str(),
                    "capabilities": config.domains(),
                    "status": "available",
                }));
            }
        }

        Ok(json!({
            "success": true,
            "total": agents.len(),
            "agents": agents,
            "filtered_by": category,
        }))
    }

    async fn handle_agent_info(&self, params: &Value) -> DomainResult<Value> {
        let agent_id = require_str(params, "agent")?;
        let show_capabilities = params
            .get("capabilities")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let show_status = params.get("status").and_then(Value::as_bool).unwrap_or(false);

        let config = self
            .coordinator
            .registry()
            .get(agent_id)
            .await
            .ok_or_else(|| DomainError::AgentNotFound(agent_id.to_string()))?;

        let mut info = json!({
            "id": agent_id,
            "name": config.name,
            "tier": config.tier.as_str(),
            "model": config.model_tag,
            "coordination_priority": config.coordination_priority,
        });

        if show_capabilities {
            info["capabilities"] = json!({
                "name": config.capability.name,
                "description": config.capability.description,
                "tools": config.capability.tools,
                "domains": config.capability.specialization_domains,
                "patterns": config.capability.coordination_patterns,
                "triggers": config.capability.activation_triggers,
            });
        }

        if show_status {
            let active = self.coordinator.registry().is_active(agent_id).await;
            info["status"] = json!({
                "active": active,
            });
        }

        Ok(json!({"success": true, "agent": info}))
    }
}

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn require_str<'a>(params: &'a Value, key: &str) -> DomainResult<&'a str> {
    str_param(params, key)
        .ok_or_else(|| DomainError::InvalidInput(format!("missing required parameter: {key}")))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn content_preview(content: &Value, limit: usize) -> String {
    let text = match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CoordinatorConfig, HiveConfig};
    use crate::services::agent_registry::AgentRegistryService;
    use crate::services::hive::HiveService;
    use crate::services::hive_memory::CollectiveMemory;
    use crate::services::swarm::SwarmService;

    async fn dispatcher() -> CommandDispatcher {
        let registry = Arc::new(AgentRegistryService::with_builtin_catalog().await);
        let hive_config = HiveConfig {
            seed: Some(3),
            ..HiveConfig::fast()
        };
        let coordinator = Arc::new(SwarmHiveCoordinator::new(
            CoordinatorConfig::default(),
            registry,
            SwarmService::with_defaults(),
            HiveService::new(hive_config, Arc::new(CollectiveMemory::with_defaults())),
        ));
        CommandDispatcher::new(coordinator)
    }

    #[tokio::test]
    async fn test_invalid_json_line() {
        let dispatcher = dispatcher().await;
        let response = dispatcher.dispatch_line("this is not json").await;
        assert_eq!(response["error"], "Invalid JSON command");
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .dispatch_line(r#"{"action": "swarm_fly", "params": {}}"#)
            .await;
        assert_eq!(response["error"], "Unknown action: swarm_fly");
    }

    #[tokio::test]
    async fn test_swarm_create_and_status_round_trip() {
        let dispatcher = dispatcher().await;

        let response = dispatcher
            .dispatch_line(
                r#"{"action":"swarm_create","params":{"id":"s1","topology":"mesh","agents":["ios_developer","ai_engineer"]}}"#,
            )
            .await;
        assert_eq!(response["success"], true);
        assert_eq!(response["swarm_id"], "s1");
        assert_eq!(response["status"], "created");

        let response = dispatcher
            .dispatch_line(r#"{"action":"swarm_status","params":{"swarm_id":"s1"}}"#)
            .await;
        assert_eq!(response["success"], true);
        assert_eq!(response["status"]["agent_count"], 2);
    }

    #[tokio::test]
    async fn test_swarm_create_rejects_bad_topology() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .dispatch_line(r#"{"action":"swarm_create","params":{"id":"s1","topology":"ring"}}"#)
            .await;
        assert!(response["error"].as_str().unwrap().contains("unknown topology"));
    }

    #[tokio::test]
    async fn test_hive_remember_and_recall() {
        let dispatcher = dispatcher().await;

        let response = dispatcher
            .dispatch_line(
                r#"{"action":"hive_remember","params":{"content":"AI development needs testing","memory_type":"semantic","contributors":["ai_engineer"],"confidence":0.9}}"#,
            )
            .await;
        assert_eq!(response["success"], true);
        let memory_id = response["memory_id"].as_str().unwrap();
        assert!(memory_id.starts_with("hive_memory_semantic_"));

        let response = dispatcher
            .dispatch_line(
                r#"{"action":"hive_recall","params":{"query":"AI testing","min_confidence":0.8}}"#,
            )
            .await;
        assert_eq!(response["memories_found"], 1);
        assert_eq!(response["results"][0]["fragment_id"], memory_id);

        let response = dispatcher
            .dispatch_line(
                r#"{"action":"hive_recall","params":{"query":"unrelated topic","min_confidence":0.8}}"#,
            )
            .await;
        assert_eq!(response["memories_found"], 0);
    }

    #[tokio::test]
    async fn test_agent_list_filters() {
        let dispatcher = dispatcher().await;

        let response = dispatcher
            .dispatch_line(r#"{"action":"agent_list","params":{}}"#)
            .await;
        assert_eq!(response["total"], 8);

        let response = dispatcher
            .dispatch_line(r#"{"action":"agent_list","params":{"category":"ai"}}"#)
            .await;
        assert_eq!(response["total"], 1);
        assert_eq!(response["agents"][0]["id"], "ai_engineer");

        let response = dispatcher
            .dispatch_line(r#"{"action":"agent_list","params":{"active":true}}"#)
            .await;
        assert_eq!(response["total"], 0);
    }

    #[tokio::test]
    async fn test_agent_info_detail_flags() {
        let dispatcher = dispatcher().await;

        let response = dispatcher
            .dispatch_line(
                r#"{"action":"agent_info","params":{"agent":"ios_developer","capabilities":true,"status":true}}"#,
            )
            .await;
        assert_eq!(response["agent"]["id"], "ios_developer");
        assert_eq!(response["agent"]["coordination_priority"], 80);
        assert!(response["agent"]["capabilities"]["domains"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d == "ios"));
        assert_eq!(response["agent"]["status"]["active"], false);

        let response = dispatcher
            .dispatch_line(r#"{"action":"agent_info","params":{"agent":"nobody"}}"#)
            .await;
        assert_eq!(response["error"], "Agent not found: nobody");
    }

    #[tokio::test]
    async fn test_hive_decide_validates_method() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .dispatch_line(
                r#"{"action":"hive_decide","params":{"question":"which way","options":["a","b"],"method":"coin_flip"}}"#,
            )
            .await;
        assert!(response["error"].as_str().unwrap().contains("unknown decision method"));
    }
}
