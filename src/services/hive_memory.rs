//! Collective memory store.
//!
//! Fragments are content-addressed (blake3 of the serialized content),
//! recalled by token-overlap relevance, and fade through multiplicative
//! relevance decay until pruned.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::models::{HiveMemoryFragment, MemoryConfig, MemoryType};
use crate::domain::ports::{MetricsSink, NoopMetrics};

/// Minimum Jaccard overlap for a fragment to be considered relevant.
const RELEVANCE_THRESHOLD: f64 = 0.3;

/// Maximum fragments returned per recall.
const RECALL_LIMIT: usize = 10;

/// Shared associative memory for the hive.
pub struct CollectiveMemory {
    store: RwLock<HashMap<String, HiveMemoryFragment>>,
    config: MemoryConfig,
    metrics: Arc<dyn MetricsSink>,
}

impl CollectiveMemory {
    /// Create an empty store.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            config,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Store a fragment. The id derives from the content hash, so storing
    /// identical content overwrites in place.
    pub async fn store(
        &self,
        content: serde_json::Value,
        memory_type: MemoryType,
        contributors: BTreeSet<String>,
        confidence: f64,
    ) -> String {
        let fragment_id = fragment_id_for(&content, memory_type);
        let fragment = HiveMemoryFragment::new(
            fragment_id.clone(),
            memory_type,
            content,
            contributors,
            confidence,
        );

        let mut store = self.store.write().await;
        store.insert(fragment_id.clone(), fragment);
        let total = store.len();
        drop(store);

        self.metrics
            .incr_counter("hive_memory_operations_total", &[("operation", "store")]);
        self.metrics
            .set_gauge("hive_memory_fragments", &[], total as f64);

        debug!(fragment_id = %fragment_id, memory_type = memory_type.as_str(), "memory_stored");
        fragment_id
    }

    /// Recall fragments relevant to a query. Hits have their access count
    /// bumped and last-access refreshed; results are ranked by
    /// `confidence x relevance_decay`, capped at ten.
    pub async fn recall(
        &self,
        query: &str,
        memory_type: Option<MemoryType>,
        min_confidence: f64,
    ) -> Vec<HiveMemoryFragment> {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let mut hits: Vec<HiveMemoryFragment> = Vec::new();
        for fragment in store.values_mut() {
            if let Some(required_type) = memory_type {
                if fragment.memory_type != required_type {
                    continue;
                }
            }
            if fragment.confidence_score < min_confidence {
                continue;
            }
            if relevance(query, &fragment.content) < RELEVANCE_THRESHOLD {
                continue;
            }

            fragment.record_access(now);
            hits.push(fragment.clone());
        }
        drop(store);

        hits.sort_by(|a, b| {
            b.ranking_score()
                .partial_cmp(&a.ranking_score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.fragment_id.cmp(&b.fragment_id))
        });
        hits.truncate(RECALL_LIMIT);

        self.metrics
            .incr_counter("hive_memory_operations_total", &[("operation", "recall")]);
        hits
    }

    /// Fetch one fragment without access bookkeeping.
    pub async fn get(&self, fragment_id: &str) -> Option<HiveMemoryFragment> {
        self.store.read().await.get(fragment_id).cloned()
    }

    /// Apply relevance decay as of `now`: each fragment's decay is
    /// multiplied by `decay_rate ^ hours_since_access`, and fragments below
    /// the prune threshold are dropped. Returns the pruned fragment ids.
    pub async fn decay_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut store = self.store.write().await;

        let mut pruned = Vec::new();
        for fragment in store.values_mut() {
            let hours_idle =
                (now - fragment.decay_reference).num_milliseconds().max(0) as f64 / 3_600_000.0;
            fragment.relevance_decay *= self.config.decay_rate.powf(hours_idle);
            if now > fragment.decay_reference {
                fragment.decay_reference = now;
            }
            if fragment.relevance_decay < self.config.prune_threshold {
                pruned.push(fragment.fragment_id.clone());
            }
        }
        for fragment_id in &pruned {
            store.remove(fragment_id);
            self.metrics
                .incr_counter("hive_memory_operations_total", &[("operation", "decay")]);
        }
        let total = store.len();
        drop(store);

        self.metrics
            .set_gauge("hive_memory_fragments", &[], total as f64);
        if !pruned.is_empty() {
            info!(removed = pruned.len(), "memory_decay_applied");
        }
        pruned
    }

    /// Apply relevance decay as of now.
    pub async fn decay_memory(&self) -> Vec<String> {
        self.decay_at(Utc::now()).await
    }

    /// Number of live fragments.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Configuration in effect.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

/// Content-addressed fragment id: the memory-type tag plus the first twelve
/// hex characters of the content hash.
pub fn fragment_id_for(content: &serde_json::Value, memory_type: MemoryType) -> String {
    let serialized = serialize_content(content);
    let hash = blake3::hash(serialized.as_bytes()).to_hex();
    format!("hive_memory_{}_{}", memory_type.as_str(), &hash.as_str()[..12])
}

/// Serialize content for hashing and token matching. String content stays
/// raw text; structured content uses its JSON encoding.
pub fn serialize_content(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Jaccard similarity of lowercased whitespace tokens between the query and
/// the serialized content.
pub fn relevance(query: &str, content: &serde_json::Value) -> f64 {
    let query_tokens: BTreeSet<String> =
        query.to_lowercase().split_whitespace().map(String::from).collect();
    let content_tokens: BTreeSet<String> = serialize_content(content)
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();

    if query_tokens.is_empty() || content_tokens.is_empty() {
        return 0.0;
    }

    let intersection = query_tokens.intersection(&content_tokens).count();
    let union = query_tokens.union(&content_tokens).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contributors(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_store_is_content_addressed() {
        let memory = CollectiveMemory::with_defaults();

        let first = memory
            .store(json!("shared fact"), MemoryType::Semantic, contributors(&["a"]), 0.8)
            .await;
        let second = memory
            .store(json!("shared fact"), MemoryType::Semantic, contributors(&["b"]), 0.9)
            .await;

        assert_eq!(first, second);
        assert_eq!(memory.len().await, 1);
        // Overwrite in place: the later contributor set wins
        let fragment = memory.get(&first).await.unwrap();
        assert!(fragment.contributors.contains("b"));
        assert!(first.starts_with("hive_memory_semantic_"));
    }

    #[tokio::test]
    async fn test_recall_filters_and_ranks() {
        let memory = CollectiveMemory::with_defaults();
        memory
            .store(
                json!("AI development needs testing"),
                MemoryType::Semantic,
                contributors(&["agent_1"]),
                0.9,
            )
            .await;
        memory
            .store(
                json!("forestry pricing notes"),
                MemoryType::Semantic,
                contributors(&["agent_2"]),
                0.9,
            )
            .await;

        let hits = memory.recall("AI testing", None, 0.8).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, json!("AI development needs testing"));
        assert_eq!(hits[0].access_count, 1);

        // Unrelated query finds nothing
        let hits = memory.recall("unrelated topic", None, 0.8).await;
        assert!(hits.is_empty());

        // Confidence floor filters out the fragment
        let hits = memory.recall("AI testing", None, 0.95).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_recall_type_filter() {
        let memory = CollectiveMemory::with_defaults();
        memory
            .store(json!("deploy checklist steps"), MemoryType::Working, contributors(&["a"]), 0.9)
            .await;

        let hits = memory
            .recall("deploy checklist", Some(MemoryType::Semantic), 0.5)
            .await;
        assert!(hits.is_empty());

        let hits = memory
            .recall("deploy checklist", Some(MemoryType::Working), 0.5)
            .await;
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_decay_prunes_stale_fragments() {
        let memory = CollectiveMemory::with_defaults();
        memory
            .store(json!("ephemeral scratch data"), MemoryType::Working, contributors(&["a"]), 0.8)
            .await;

        // 0.95^45 < 0.1: 45 idle hours decay the fragment away
        let later = Utc::now() + chrono::Duration::hours(45);
        let pruned = memory.decay_at(later).await;
        assert_eq!(pruned.len(), 1);
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn test_decay_split_equals_single_run() {
        let memory_split = CollectiveMemory::with_defaults();
        let memory_single = CollectiveMemory::with_defaults();
        for memory in [&memory_split, &memory_single] {
            memory
                .store(json!("durable knowledge"), MemoryType::Semantic, contributors(&["a"]), 0.9)
                .await;
        }

        let start = Utc::now();
        let mid = start + chrono::Duration::hours(10);
        let end = start + chrono::Duration::hours(20);

        memory_split.decay_at(mid).await;
        memory_split.decay_at(end).await;
        memory_single.decay_at(end).await;

        let split = memory_split.get(&fragment_id_for(&json!("durable knowledge"), MemoryType::Semantic)).await;
        let single = memory_single.get(&fragment_id_for(&json!("durable knowledge"), MemoryType::Semantic)).await;

        match (split, single) {
            (Some(a), Some(b)) => {
                assert!((a.relevance_decay - b.relevance_decay).abs() < 1e-6);
            }
            (None, None) => {}
            other => panic!("divergent decay outcomes: {other:?}"),
        }
    }

    #[test]
    fn test_relevance_jaccard() {
        let content = json!("AI development needs testing");
        // {ai, testing} ∩ {ai, development, needs, testing} = 2; union = 4
        assert!((relevance("AI testing", &content) - 0.5).abs() < 1e-9);
        assert!(relevance("unrelated topic", &content).abs() < f64::EPSILON);
        assert!(relevance("", &content).abs() < f64::EPSILON);
    }

    #[test]
    fn test_string_content_serializes_raw() {
        assert_eq!(serialize_content(&json!("plain text")), "plain text");
        assert_eq!(serialize_content(&json!({"k": 1})), "{\"k\":1}");
    }
}
