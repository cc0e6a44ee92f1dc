//! Hive intelligence engine.
//!
//! Maintains the node graph, runs collective decisions with concurrent
//! per-node vote collectors, resolves them by the configured method, and
//! tracks behavioral patterns across resolutions.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    cosine_similarity, expertise_alignment, expertise_basis, DecisionMethod, DecisionOption,
    DecisionSignature, HiveConfig, HiveDecision, HiveNode, MemoryType, OptionScore, Vote,
    EXPERTISE_DIM,
};
use crate::domain::ports::{MetricsSink, NoopMetrics};
use crate::services::hive_memory::CollectiveMemory;

/// Cosine similarity above which two nodes connect.
const CONNECTION_THRESHOLD: f64 = 0.6;

/// Resolved decisions kept in the bounded history.
const DECISION_HISTORY_LIMIT: usize = 100;

/// Signatures examined for behavioral emergence.
const PATTERN_WINDOW: usize = 3;

/// Compact answer to "what happened to this decision".
#[derive(Debug, Clone, Serialize)]
pub struct DecisionSummary {
    pub decision_id: String,
    pub consensus_reached: bool,
    pub confidence: f64,
    pub method_used: String,
    pub participants: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_option: Option<String>,
    /// True when the wait expired before the decision resolved.
    pub timeout: bool,
}

/// Snapshot of the hive for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct HiveStatus {
    pub nodes: usize,
    pub memory_fragments: usize,
    pub active_decisions: usize,
    pub decision_history: usize,
    pub collective_confidence: f64,
    pub behavioral_patterns: usize,
    pub average_node_connections: f64,
}

/// Collective intelligence engine over a graph of hive nodes.
#[derive(Clone)]
pub struct HiveService {
    config: HiveConfig,
    nodes: Arc<RwLock<HashMap<String, HiveNode>>>,
    memory: Arc<CollectiveMemory>,
    active_decisions: Arc<RwLock<HashMap<String, HiveDecision>>>,
    decision_history: Arc<RwLock<VecDeque<HiveDecision>>>,
    behavioral_patterns: Arc<RwLock<HashMap<String, Vec<DecisionSignature>>>>,
    rng: Arc<Mutex<StdRng>>,
    metrics: Arc<dyn MetricsSink>,
}

impl HiveService {
    /// Create a hive over the given collective memory.
    pub fn new(config: HiveConfig, memory: Arc<CollectiveMemory>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            nodes: Arc::new(RwLock::new(HashMap::new())),
            memory,
            active_decisions: Arc::new(RwLock::new(HashMap::new())),
            decision_history: Arc::new(RwLock::new(VecDeque::new())),
            behavioral_patterns: Arc::new(RwLock::new(HashMap::new())),
            rng: Arc::new(Mutex::new(rng)),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create with default configuration and a fresh memory store.
    pub fn with_defaults() -> Self {
        Self::new(HiveConfig::default(), Arc::new(CollectiveMemory::with_defaults()))
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The collective memory store backing this hive.
    pub fn memory(&self) -> &Arc<CollectiveMemory> {
        &self.memory
    }

    /// Configuration in effect.
    pub fn config(&self) -> &HiveConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Initialize a new hive node for an agent. The expertise vector is
    /// derived from the capabilities with clamped gaussian noise so that
    /// every node brings a unique perspective.
    pub async fn init_node(&self, agent_id: &str, capabilities: &[String]) -> HiveNode {
        let basis = expertise_basis(capabilities);
        let vector: Vec<f64> = {
            let mut rng = self.rng.lock().expect("hive rng poisoned");
            basis
                .iter()
                .map(|v| (v + gaussian_noise(&mut rng, 0.1)).clamp(0.0, 1.0))
                .collect()
        };
        self.insert_node(agent_id, vector).await
    }

    /// Initialize a node with an explicit expertise vector (no noise).
    pub async fn init_node_with_expertise(&self, agent_id: &str, expertise: Vec<f64>) -> HiveNode {
        let mut vector = expertise;
        vector.resize(EXPERTISE_DIM, 0.0);
        self.insert_node(agent_id, vector).await
    }

    /// Return the existing node for an agent, or initialize one.
    pub async fn ensure_node(&self, agent_id: &str, capabilities: &[String]) -> HiveNode {
        {
            let nodes = self.nodes.read().await;
            if let Some(node) = nodes.values().find(|n| n.agent_id == agent_id) {
                return node.clone();
            }
        }
        self.init_node(agent_id, capabilities).await
    }

    async fn insert_node(&self, agent_id: &str, vector: Vec<f64>) -> HiveNode {
        let node_id = format!(
            "hive_node_{}_{}",
            agent_id,
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let mut node = HiveNode::new(node_id.clone(), agent_id, vector);

        let mut nodes = self.nodes.write().await;
        // Connect to similar pre-existing nodes, both directions
        for existing in nodes.values_mut() {
            let similarity =
                cosine_similarity(&node.expertise_vector, &existing.expertise_vector);
            if similarity >= CONNECTION_THRESHOLD {
                node.connections.insert(existing.node_id.clone());
                existing.connections.insert(node.node_id.clone());
            }
        }
        nodes.insert(node_id.clone(), node.clone());
        let total = nodes.len();
        drop(nodes);

        info!(
            node_id = %node_id,
            agent_id,
            connections = node.connections.len(),
            total_nodes = total,
            "hive_node_created"
        );
        node
    }

    /// Snapshot of all nodes.
    pub async fn nodes_snapshot(&self) -> Vec<HiveNode> {
        let mut nodes: Vec<HiveNode> = self.nodes.read().await.values().cloned().collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        nodes
    }

    /// Number of nodes.
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    /// Store content in collective memory and record the contribution on
    /// each contributor's node.
    pub async fn store_memory(
        &self,
        content: serde_json::Value,
        memory_type: MemoryType,
        contributors: BTreeSet<String>,
        confidence: f64,
    ) -> String {
        let fragment_id = self
            .memory
            .store(content, memory_type, contributors.clone(), confidence)
            .await;

        let mut nodes = self.nodes.write().await;
        for node in nodes.values_mut() {
            if contributors.contains(&node.agent_id) {
                node.memory_contribution.insert(
                    fragment_id.clone(),
                    serde_json::json!({
                        "type": memory_type.as_str(),
                        "timestamp": Utc::now().to_rfc3339(),
                    }),
                );
            }
        }
        fragment_id
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Initiate a collective decision. Every current node's agent becomes a
    /// participant; vote collectors run concurrently under `timeout`, and
    /// resolution proceeds with whatever votes have landed when it expires.
    pub async fn initiate_decision(
        &self,
        question: &str,
        options: Vec<DecisionOption>,
        method: DecisionMethod,
        timeout: Duration,
    ) -> DomainResult<String> {
        if options.is_empty() {
            return Err(DomainError::InvalidInput(
                "decision needs at least one option".to_string(),
            ));
        }

        let decision_id = format!(
            "hive_decision_{}",
            &Uuid::new_v4().simple().to_string()[..12]
        );

        let voters = self.nodes_snapshot().await;
        let participants: BTreeSet<String> =
            voters.iter().map(|n| n.agent_id.clone()).collect();

        let decision = HiveDecision::new(
            decision_id.clone(),
            question,
            options,
            method,
            participants,
        );

        self.active_decisions
            .write()
            .await
            .insert(decision_id.clone(), decision);

        info!(
            decision_id = %decision_id,
            method = method.as_str(),
            voters = voters.len(),
            timeout_ms = timeout.as_millis() as u64,
            "hive_decision_initiated"
        );

        // Pre-draw deliberation delays so all randomness stays seedable
        let delays: Vec<Duration> = {
            let mut rng = self.rng.lock().expect("hive rng poisoned");
            voters
                .iter()
                .map(|_| {
                    let ms = rng.gen_range(
                        self.config.deliberation_min_ms..=self.config.deliberation_max_ms,
                    );
                    Duration::from_millis(ms)
                })
                .collect()
        };

        let engine = self.clone();
        let id = decision_id.clone();
        tokio::spawn(async move {
            engine.process_decision(&id, voters, delays, timeout).await;
        });

        Ok(decision_id)
    }

    /// Run the vote collectors under the decision budget, then resolve.
    async fn process_decision(
        &self,
        decision_id: &str,
        voters: Vec<HiveNode>,
        delays: Vec<Duration>,
        timeout: Duration,
    ) {
        let collectors = voters
            .into_iter()
            .zip(delays)
            .map(|(node, delay)| self.collect_node_vote(decision_id, node, delay));

        if tokio::time::timeout(timeout, join_all(collectors)).await.is_err() {
            warn!(decision_id, "hive_decision_timeout");
        }

        self.resolve_decision(decision_id).await;
    }

    /// One node's deliberation: sleep, score the options, cast a vote.
    /// Failures never abort sibling collectors.
    async fn collect_node_vote(&self, decision_id: &str, node: HiveNode, delay: Duration) {
        tokio::time::sleep(delay).await;

        let vote = {
            let decisions = self.active_decisions.read().await;
            let Some(decision) = decisions.get(decision_id) else {
                return; // already resolved
            };
            self.generate_node_vote(&node, decision)
        };

        let mut decisions = self.active_decisions.write().await;
        if let Some(decision) = decisions.get_mut(decision_id) {
            decision.votes.insert(node.node_id.clone(), vote.clone());
        } else {
            return;
        }
        drop(decisions);

        let mut nodes = self.nodes.write().await;
        if let Some(live_node) = nodes.get_mut(&node.node_id) {
            live_node.participation_history.push(serde_json::json!({
                "decision_id": decision_id,
                "timestamp": vote.vote_timestamp.to_rfc3339(),
                "chosen_option": vote.chosen_option,
                "confidence": vote.confidence,
            }));
        }
    }

    /// Score every option for a node and pick the best.
    fn generate_node_vote(&self, node: &HiveNode, decision: &HiveDecision) -> Vote {
        let mut scores = Vec::with_capacity(decision.options.len());

        for option in &decision.options {
            let expertise_score =
                expertise_alignment(&node.expertise_vector, &option.required_expertise);
            let influence_score = connection_influence(node, decision, &option.id);
            let total =
                (expertise_score * 0.7 + influence_score * 0.3) * node.influence_score;

            scores.push(OptionScore {
                option_id: option.id.clone(),
                score: total,
                confidence: (expertise_score + 0.2).min(1.0),
            });
        }

        let best = scores
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .expect("decision has at least one option");

        Vote {
            chosen_option: best.option_id.clone(),
            confidence: best.confidence,
            scores: scores.clone(),
            vote_timestamp: Utc::now(),
        }
    }

    /// Resolve an active decision and move it to the bounded history.
    pub async fn resolve_decision(&self, decision_id: &str) {
        let Some(mut decision) = self.active_decisions.write().await.remove(decision_id) else {
            return;
        };

        let influence: HashMap<String, f64> = {
            let nodes = self.nodes.read().await;
            nodes
                .values()
                .map(|n| (n.node_id.clone(), n.influence_score))
                .collect()
        };

        let resolution = decision.resolve(self.config.consensus_threshold, &influence);
        decision.consensus_reached = resolution.consensus_reached;
        decision.confidence = resolution.confidence;
        decision.resolved_at = Some(Utc::now());

        if resolution.emergence_pattern.is_some() {
            self.metrics
                .incr_counter("emergence_events_total", &[("type", "emergent_consensus")]);
        }

        let outcome = if decision.consensus_reached {
            "consensus"
        } else {
            "no_consensus"
        };
        self.metrics.incr_counter(
            "hive_decisions_total",
            &[("method", decision.method.as_str()), ("outcome", outcome)],
        );

        info!(
            decision_id,
            consensus_reached = decision.consensus_reached,
            confidence = decision.confidence,
            votes = decision.votes.len(),
            "hive_decision_resolved"
        );

        let signature = decision.signature();
        {
            let mut history = self.decision_history.write().await;
            history.push_back(decision);
            while history.len() > DECISION_HISTORY_LIMIT {
                history.pop_front();
            }
        }

        self.metrics
            .set_gauge("hive_collective_confidence", &[], self.collective_confidence().await);

        self.record_behavioral_signature(signature).await;
    }

    /// Record a resolution signature and detect behavioral emergence: three
    /// consecutive signatures for the same method/participant-count key with
    /// at least two high-confidence and two consensus outcomes.
    async fn record_behavioral_signature(&self, signature: DecisionSignature) {
        let key = format!("{}_{}", signature.method.as_str(), signature.participant_count);

        let mut patterns = self.behavioral_patterns.write().await;
        let entries = patterns.entry(key.clone()).or_default();
        entries.push(signature);

        if entries.len() >= PATTERN_WINDOW {
            let recent = &entries[entries.len() - PATTERN_WINDOW..];
            let high_confidence = recent.iter().filter(|s| s.confidence > 0.8).count();
            let consensus = recent.iter().filter(|s| s.consensus_reached).count();

            if high_confidence >= 2 && consensus >= 2 {
                self.metrics
                    .incr_counter("emergence_events_total", &[("type", "behavioral_pattern")]);
                info!(pattern_key = %key, occurrences = entries.len(), "emergent_pattern_detected");
            }
        }
    }

    /// Wait for a decision to resolve, polling at the configured interval.
    pub async fn wait_for_decision(
        &self,
        decision_id: &str,
        max_wait: Duration,
    ) -> DecisionSummary {
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let deadline = tokio::time::Instant::now() + max_wait;

        loop {
            // Resolution removes the decision from the active map before it
            // lands in history, so check history first and keep polling
            // through that window.
            if let Some(summary) = self.resolved_summary(decision_id).await {
                return summary;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(poll).await;
        }

        DecisionSummary {
            decision_id: decision_id.to_string(),
            consensus_reached: false,
            confidence: 0.0,
            method_used: String::new(),
            participants: 0,
            chosen_option: None,
            timeout: true,
        }
    }

    /// Summary of a resolved decision from the history.
    pub async fn resolved_summary(&self, decision_id: &str) -> Option<DecisionSummary> {
        let influence: HashMap<String, f64> = {
            let nodes = self.nodes.read().await;
            nodes
                .values()
                .map(|n| (n.node_id.clone(), n.influence_score))
                .collect()
        };
        let history = self.decision_history.read().await;
        history
            .iter()
            .find(|d| d.decision_id == decision_id)
            .map(|decision| {
                let chosen = decision
                    .resolve(self.config.consensus_threshold, &influence)
                    .chosen_option;
                DecisionSummary {
                    decision_id: decision.decision_id.clone(),
                    consensus_reached: decision.consensus_reached,
                    confidence: decision.confidence,
                    method_used: decision.method.as_str().to_string(),
                    participants: decision.participants.len(),
                    chosen_option: chosen,
                    timeout: false,
                }
            })
    }

    /// A resolved decision by id.
    pub async fn resolved_decision(&self, decision_id: &str) -> Option<HiveDecision> {
        let history = self.decision_history.read().await;
        history.iter().find(|d| d.decision_id == decision_id).cloned()
    }

    /// Whether a decision is still active.
    pub async fn is_decision_active(&self, decision_id: &str) -> bool {
        self.active_decisions.read().await.contains_key(decision_id)
    }

    /// Mean confidence over the last ten resolved decisions, 0.5 when none.
    pub async fn collective_confidence(&self) -> f64 {
        let history = self.decision_history.read().await;
        if history.is_empty() {
            return 0.5;
        }
        let recent: Vec<f64> = history.iter().rev().take(10).map(|d| d.confidence).collect();
        recent.iter().sum::<f64>() / recent.len() as f64
    }

    /// Current hive status.
    pub async fn status(&self) -> HiveStatus {
        let nodes = self.nodes.read().await;
        let node_count = nodes.len();
        let connection_sum: usize = nodes.values().map(|n| n.connections.len()).sum();
        drop(nodes);

        HiveStatus {
            nodes: node_count,
            memory_fragments: self.memory.len().await,
            active_decisions: self.active_decisions.read().await.len(),
            decision_history: self.decision_history.read().await.len(),
            collective_confidence: self.collective_confidence().await,
            behavioral_patterns: self.behavioral_patterns.read().await.len(),
            average_node_connections: if node_count == 0 {
                0.0
            } else {
                connection_sum as f64 / node_count as f64
            },
        }
    }
}

/// Influence on a node from connected nodes that already voted for the
/// option: their mean vote confidence, 0.5 when no connected vote exists.
fn connection_influence(node: &HiveNode, decision: &HiveDecision, option_id: &str) -> f64 {
    if node.connections.is_empty() {
        return 0.5;
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for connected in &node.connections {
        if let Some(vote) = decision.votes.get(connected) {
            if vote.chosen_option == option_id {
                sum += vote.confidence;
                count += 1;
            }
        }
    }

    if count == 0 {
        0.5
    } else {
        sum / count as f64
    }
}

/// Zero-mean gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, sigma: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
