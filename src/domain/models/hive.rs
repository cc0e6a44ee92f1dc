//! Hive intelligence domain model.
//!
//! Nodes carry expertise vectors over a fixed set of domains, connect to
//! similar peers, and vote on collective decisions. Memory fragments are
//! content-addressed and decay in relevance until pruned.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dimensionality of expertise vectors.
pub const EXPERTISE_DIM: usize = 10;

/// Canonical expertise domains, one per vector dimension.
pub const EXPERTISE_DOMAINS: [&str; EXPERTISE_DIM] = [
    "development",
    "ai_ml",
    "research",
    "design",
    "testing",
    "security",
    "deployment",
    "coordination",
    "analysis",
    "business",
];

/// Build the noise-free expertise vector for a capability list. A dimension
/// is 1.0 when any capability string contains the domain name
/// (case-insensitive substring).
pub fn expertise_basis(capabilities: &[String]) -> [f64; EXPERTISE_DIM] {
    let mut vector = [0.0; EXPERTISE_DIM];
    for capability in capabilities {
        let lowered = capability.to_lowercase();
        for (i, domain) in EXPERTISE_DOMAINS.iter().enumerate() {
            if lowered.contains(domain) {
                vector[i] = 1.0;
            }
        }
    }
    vector
}

/// Cosine similarity between two expertise vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// How expertise aligns with an option's requirements: the mean of the
/// addressed vector dimensions, 0.5 when the option names none.
pub fn expertise_alignment(vector: &[f64], required: &[usize]) -> f64 {
    if required.is_empty() {
        return 0.5;
    }
    let sum: f64 = required.iter().map(|r| vector[r % vector.len()]).sum();
    (sum / required.len() as f64).min(1.0)
}

/// Method used to resolve a collective decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    /// Require a qualified majority
    Consensus,
    /// Weight votes by node influence
    Weighted,
    /// Minimum participation, then consensus
    Quorum,
    /// Let temporal patterns decide, fall back to weighted
    Emergent,
}

impl DecisionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consensus => "consensus",
            Self::Weighted => "weighted",
            Self::Quorum => "quorum",
            Self::Emergent => "emergent",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "consensus" => Some(Self::Consensus),
            "weighted" | "weighted_voting" => Some(Self::Weighted),
            "quorum" => Some(Self::Quorum),
            "emergent" => Some(Self::Emergent),
            _ => None,
        }
    }
}

/// Kind of collective memory a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Short-term task memory
    Working,
    /// Experience-based memory
    Episodic,
    /// Knowledge and facts
    Semantic,
    /// Shared hive memory
    Collective,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Collective => "collective",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "working" => Some(Self::Working),
            "episodic" => Some(Self::Episodic),
            "semantic" => Some(Self::Semantic),
            "collective" => Some(Self::Collective),
            _ => None,
        }
    }
}

/// A node in the hive: one agent's presence in the collective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiveNode {
    /// Unique node id
    pub node_id: String,
    /// Owning agent id
    pub agent_id: String,
    /// Expertise over the canonical domains, each in [0, 1]
    pub expertise_vector: Vec<f64>,
    /// Voting weight
    pub influence_score: f64,
    /// Append-only record of decisions this node voted in
    pub participation_history: Vec<serde_json::Value>,
    /// Undirected edges to similar nodes; symmetry is maintained by the engine
    pub connections: BTreeSet<String>,
    /// Fragment ids this node contributed, with contribution metadata
    pub memory_contribution: BTreeMap<String, serde_json::Value>,
}

impl HiveNode {
    /// Create a node with the given expertise vector.
    pub fn new(
        node_id: impl Into<String>,
        agent_id: impl Into<String>,
        expertise_vector: Vec<f64>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            agent_id: agent_id.into(),
            expertise_vector,
            influence_score: 1.0,
            participation_history: Vec::new(),
            connections: BTreeSet::new(),
            memory_contribution: BTreeMap::new(),
        }
    }
}

/// One unit of collective memory, content-addressed by fragment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiveMemoryFragment {
    /// Id derived from the content hash, prefixed by the memory type
    pub fragment_id: String,
    /// Memory kind
    pub memory_type: MemoryType,
    /// Opaque content
    pub content: serde_json::Value,
    /// Agents that contributed this fragment
    pub contributors: BTreeSet<String>,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// How many times recall returned this fragment
    pub access_count: u64,
    /// Last access time; drives decay
    pub last_accessed: DateTime<Utc>,
    /// Relevance multiplier in [0, 1]; the fragment is pruned below 0.1
    pub relevance_decay: f64,
    /// Baseline for the next decay application. Refreshed on access and on
    /// every decay run so idle time is never charged twice.
    pub decay_reference: DateTime<Utc>,
}

impl HiveMemoryFragment {
    /// Create a fresh fragment.
    pub fn new(
        fragment_id: impl Into<String>,
        memory_type: MemoryType,
        content: serde_json::Value,
        contributors: BTreeSet<String>,
        confidence_score: f64,
    ) -> Self {
        Self {
            fragment_id: fragment_id.into(),
            memory_type,
            content,
            contributors,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            access_count: 0,
            last_accessed: Utc::now(),
            relevance_decay: 1.0,
            decay_reference: Utc::now(),
        }
    }

    /// Record a recall hit.
    pub fn record_access(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed = now;
        self.decay_reference = now;
    }

    /// Ranking key used by recall.
    pub fn ranking_score(&self) -> f64 {
        self.confidence_score * self.relevance_decay
    }
}

/// One selectable option of a collective decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOption {
    /// Option id, unique within the decision
    pub id: String,
    /// Human-readable description
    pub description: String,
    /// Expertise dimensions this option calls for
    #[serde(default)]
    pub required_expertise: Vec<usize>,
}

impl DecisionOption {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            required_expertise: Vec::new(),
        }
    }

    pub fn with_expertise(mut self, required: Vec<usize>) -> Self {
        self.required_expertise = required;
        self
    }
}

/// Per-option score computed during a node's deliberation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionScore {
    pub option_id: String,
    pub score: f64,
    pub confidence: f64,
}

/// A single node's vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// The option this node chose
    pub chosen_option: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Full per-option score breakdown
    pub scores: Vec<OptionScore>,
    /// When the vote landed
    pub vote_timestamp: DateTime<Utc>,
}

/// Tally of votes for one option.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionTally {
    pub count: usize,
    pub total_confidence: f64,
}

/// Outcome of resolving a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResolution {
    /// Whether the hive converged on an option
    pub consensus_reached: bool,
    /// The winning option, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_option: Option<String>,
    /// Confidence of the outcome in [0, 1]
    pub confidence: f64,
    /// Votes per option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_distribution: Option<BTreeMap<String, OptionTally>>,
    /// Failure reason (quorum shortfall)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Detected emergence pattern, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergence_pattern: Option<String>,
}

impl DecisionResolution {
    fn failed(confidence: f64) -> Self {
        Self {
            consensus_reached: false,
            chosen_option: None,
            confidence,
            vote_distribution: None,
            reason: None,
            emergence_pattern: None,
        }
    }
}

/// Behavioral signature recorded for every resolution; used for emergence
/// detection across decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSignature {
    pub method: DecisionMethod,
    pub participant_count: usize,
    pub consensus_reached: bool,
    pub confidence: f64,
}

/// A collective decision, active until resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiveDecision {
    /// Unique decision id
    pub decision_id: String,
    /// The question being decided
    pub question: String,
    /// Ordered options
    pub options: Vec<DecisionOption>,
    /// Resolution method
    pub method: DecisionMethod,
    /// Agent ids eligible to vote, frozen at initiation
    pub participants: BTreeSet<String>,
    /// Votes collected so far, keyed by node id
    pub votes: HashMap<String, Vote>,
    /// Whether the hive converged
    pub consensus_reached: bool,
    /// Confidence of the resolution
    pub confidence: f64,
    /// When the decision was initiated
    pub created_at: DateTime<Utc>,
    /// When it was resolved
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HiveDecision {
    /// Create a new active decision.
    pub fn new(
        decision_id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<DecisionOption>,
        method: DecisionMethod,
        participants: BTreeSet<String>,
    ) -> Self {
        Self {
            decision_id: decision_id.into(),
            question: question.into(),
            options,
            method,
            participants,
            votes: HashMap::new(),
            consensus_reached: false,
            confidence: 0.0,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Fraction of participants that have voted.
    pub fn participation_rate(&self) -> f64 {
        if self.participants.is_empty() {
            return 0.0;
        }
        self.votes.len() as f64 / self.participants.len() as f64
    }

    /// Votes grouped per option.
    pub fn vote_distribution(&self) -> BTreeMap<String, OptionTally> {
        let mut distribution: BTreeMap<String, OptionTally> = BTreeMap::new();
        for vote in self.votes.values() {
            let tally = distribution.entry(vote.chosen_option.clone()).or_default();
            tally.count += 1;
            tally.total_confidence += vote.confidence;
        }
        distribution
    }

    /// Resolve by the decision's own method.
    pub fn resolve(
        &self,
        collective_threshold: f64,
        influence: &HashMap<String, f64>,
    ) -> DecisionResolution {
        match self.method {
            DecisionMethod::Consensus => self.resolve_consensus(collective_threshold),
            DecisionMethod::Weighted => self.resolve_weighted(influence),
            DecisionMethod::Quorum => self.resolve_quorum(collective_threshold, influence),
            DecisionMethod::Emergent => self.resolve_emergent(influence),
        }
    }

    /// Consensus: an option wins when its vote count reaches
    /// `collective_threshold` of the total votes.
    pub fn resolve_consensus(&self, collective_threshold: f64) -> DecisionResolution {
        if self.votes.is_empty() {
            return DecisionResolution::failed(0.0);
        }

        let distribution = self.vote_distribution();
        let total_votes = self.votes.len();
        let majority = total_votes as f64 * collective_threshold;

        for (option_id, tally) in &distribution {
            if tally.count as f64 >= majority {
                return DecisionResolution {
                    consensus_reached: true,
                    chosen_option: Some(option_id.clone()),
                    confidence: tally.total_confidence / tally.count as f64,
                    vote_distribution: Some(distribution.clone()),
                    reason: None,
                    emergence_pattern: None,
                };
            }
        }

        let total_confidence: f64 = self.votes.values().map(|v| v.confidence).sum();
        DecisionResolution {
            consensus_reached: false,
            chosen_option: None,
            confidence: total_confidence / total_votes as f64,
            vote_distribution: Some(distribution),
            reason: None,
            emergence_pattern: None,
        }
    }

    /// Weighted: sum `influence x confidence` per option, highest sum wins.
    pub fn resolve_weighted(&self, influence: &HashMap<String, f64>) -> DecisionResolution {
        let mut option_scores: BTreeMap<String, f64> = BTreeMap::new();
        let mut total_weight = 0.0;

        for (node_id, vote) in &self.votes {
            let node_influence = influence.get(node_id).copied().unwrap_or(1.0);
            let weight = node_influence * vote.confidence;
            *option_scores.entry(vote.chosen_option.clone()).or_insert(0.0) += weight;
            total_weight += weight;
        }

        let winner = option_scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

        match winner {
            Some((option_id, score)) if total_weight > 0.0 => DecisionResolution {
                consensus_reached: true,
                chosen_option: Some(option_id.clone()),
                confidence: score / total_weight,
                vote_distribution: Some(self.vote_distribution()),
                reason: None,
                emergence_pattern: None,
            },
            _ => DecisionResolution::failed(0.0),
        }
    }

    /// Quorum: fail below 60% participation, otherwise apply consensus.
    pub fn resolve_quorum(
        &self,
        collective_threshold: f64,
        _influence: &HashMap<String, f64>,
    ) -> DecisionResolution {
        const QUORUM_THRESHOLD: f64 = 0.6;

        let participation = self.participation_rate();
        if participation < QUORUM_THRESHOLD {
            let mut resolution = DecisionResolution::failed(0.0);
            resolution.reason = Some(format!(
                "insufficient participation: {:.0}% < {:.0}%",
                participation * 100.0,
                QUORUM_THRESHOLD * 100.0
            ));
            return resolution;
        }

        self.resolve_consensus(collective_threshold)
    }

    /// Emergent: if votes land in rapid succession (mean sorted inter-arrival
    /// gap under one second), declare an emergent consensus with strength
    /// derived from the gap. Otherwise fall back to weighted voting.
    pub fn resolve_emergent(&self, influence: &HashMap<String, f64>) -> DecisionResolution {
        if let Some(mean_gap) = self.mean_vote_gap_seconds() {
            if mean_gap < 1.0 {
                return DecisionResolution {
                    consensus_reached: true,
                    chosen_option: Some("emergent_consensus".to_string()),
                    confidence: (2.0 - mean_gap).min(1.0),
                    vote_distribution: Some(self.vote_distribution()),
                    reason: None,
                    emergence_pattern: Some("rapid_convergence".to_string()),
                };
            }
        }

        self.resolve_weighted(influence)
    }

    /// Mean gap between consecutive votes in arrival order, in seconds.
    /// None with fewer than two votes.
    pub fn mean_vote_gap_seconds(&self) -> Option<f64> {
        if self.votes.len() < 2 {
            return None;
        }

        let mut times: Vec<f64> = self
            .votes
            .values()
            .map(|v| v.vote_timestamp.timestamp_millis() as f64 / 1000.0)
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let gaps: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
    }

    /// The behavioral signature of this decision after resolution.
    pub fn signature(&self) -> DecisionSignature {
        DecisionSignature {
            method: self.method,
            participant_count: self.participants.len(),
            consensus_reached: self.consensus_reached,
            confidence: self.confidence,
        }
    }
}
