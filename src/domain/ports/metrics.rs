//! Metrics sink port.
//!
//! The engine records counters, gauges and histograms through this trait so
//! the process-wide metrics backend stays out of the core. Label sets are
//! small and short-lived; sinks own their storage.

use std::collections::HashMap;
use std::sync::Mutex;

/// Abstract sink for operational metrics.
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by one.
    fn incr_counter(&self, name: &str, labels: &[(&str, &str)]);

    /// Set a gauge to an absolute value.
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64);

    /// Record one histogram observation.
    fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr_counter(&self, _name: &str, _labels: &[(&str, &str)]) {}
    fn set_gauge(&self, _name: &str, _labels: &[(&str, &str)], _value: f64) {}
    fn observe_histogram(&self, _name: &str, _labels: &[(&str, &str)], _value: f64) {}
}

fn series_key(name: &str, labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let mut sorted: Vec<(&str, &str)> = labels.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let rendered: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{name}{{{}}}", rendered.join(","))
}

/// In-memory sink for assertions in tests.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<HashMap<String, u64>>,
    gauges: Mutex<HashMap<String, f64>>,
    histograms: Mutex<HashMap<String, Vec<f64>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter series, zero when never written.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .lock()
            .expect("counter store poisoned")
            .get(&series_key(name, labels))
            .copied()
            .unwrap_or(0)
    }

    /// Current value of a gauge series.
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges
            .lock()
            .expect("gauge store poisoned")
            .get(&series_key(name, labels))
            .copied()
    }

    /// All observations of a histogram series.
    pub fn observations(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.histograms
            .lock()
            .expect("histogram store poisoned")
            .get(&series_key(name, labels))
            .cloned()
            .unwrap_or_default()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn incr_counter(&self, name: &str, labels: &[(&str, &str)]) {
        let mut counters = self.counters.lock().expect("counter store poisoned");
        *counters.entry(series_key(name, labels)).or_insert(0) += 1;
    }

    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        let mut gauges = self.gauges.lock().expect("gauge store poisoned");
        gauges.insert(series_key(name, labels), value);
    }

    fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        let mut histograms = self.histograms.lock().expect("histogram store poisoned");
        histograms
            .entry(series_key(name, labels))
            .or_default()
            .push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_counter_with_labels() {
        let sink = InMemoryMetrics::new();
        sink.incr_counter("agent_activations_total", &[("agent_id", "x"), ("status", "ok")]);
        sink.incr_counter("agent_activations_total", &[("status", "ok"), ("agent_id", "x")]);

        // Label order does not split the series
        assert_eq!(
            sink.counter("agent_activations_total", &[("agent_id", "x"), ("status", "ok")]),
            2
        );
        assert_eq!(sink.counter("agent_activations_total", &[("agent_id", "y")]), 0);
    }

    #[test]
    fn test_gauge_and_histogram() {
        let sink = InMemoryMetrics::new();
        sink.set_gauge("active_swarms_count", &[], 3.0);
        sink.observe_histogram("coordination_duration_seconds", &[], 0.25);
        sink.observe_histogram("coordination_duration_seconds", &[], 0.75);

        assert_eq!(sink.gauge("active_swarms_count", &[]), Some(3.0));
        assert_eq!(sink.observations("coordination_duration_seconds", &[]).len(), 2);
    }
}
