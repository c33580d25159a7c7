//! Prometheus-compatible registry metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::registry::MountedFs;

/// Type of metric for Prometheus compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    /// Monotonically increasing value.
    Counter,
    /// Value that can go up or down.
    Gauge,
}

/// Value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    /// Counter value.
    Counter(u64),
    /// Gauge value.
    Gauge(f64),
}

/// A single metric row with metadata and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Type of metric.
    pub metric_type: MetricType,
    /// Current value.
    pub value: MetricValue,
    /// Label key-value pairs.
    pub labels: Vec<(String, String)>,
}

/// Tallies of registry mutations.
///
/// Incremented with relaxed ordering; the counts are monitoring data,
/// not synchronization.
#[derive(Debug, Default)]
pub struct MutationCounters {
    adds: AtomicU64,
    removes: AtomicU64,
    enables: AtomicU64,
    disables: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of the mutation tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersSnapshot {
    /// Successful adds.
    pub adds: u64,
    /// Successful removes.
    pub removes: u64,
    /// Enables that changed state.
    pub enables: u64,
    /// Disables that changed state.
    pub disables: u64,
    /// Mutations rejected with an error.
    pub rejected: u64,
}

impl MutationCounters {
    pub(crate) fn record_add(&self) {
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_enable(&self) {
        self.enables.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disable(&self) {
        self.disables.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of the current tallies.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            adds: self.adds.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            enables: self.enables.load(Ordering::Relaxed),
            disables: self.disables.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

fn counter(name: &str, help: &str, value: u64) -> Metric {
    Metric {
        name: name.to_string(),
        help: help.to_string(),
        metric_type: MetricType::Counter,
        value: MetricValue::Counter(value),
        labels: vec![],
    }
}

fn gauge(name: &str, help: &str, value: f64, labels: Vec<(String, String)>) -> Metric {
    Metric {
        name: name.to_string(),
        help: help.to_string(),
        metric_type: MetricType::Gauge,
        value: MetricValue::Gauge(value),
        labels,
    }
}

impl MountedFs {
    /// Export registry metrics in Prometheus format.
    ///
    /// Gauges for the mountpath counts and the current utilization and
    /// queue-length sample of every available mountpath, counters for
    /// the mutation tallies. Reads the published snapshot; no registry
    /// lock is taken.
    pub fn export_metrics(&self) -> Vec<Metric> {
        let snapshot = self.get();
        let counters = self.counters().snapshot();
        let mut metrics = Vec::new();

        metrics.push(gauge(
            "strata_mountfs_available",
            "Number of available mountpaths",
            snapshot.available.len() as f64,
            vec![],
        ));
        metrics.push(gauge(
            "strata_mountfs_disabled",
            "Number of disabled mountpaths",
            snapshot.disabled.len() as f64,
            vec![],
        ));

        let mut paths: Vec<_> = snapshot.available.keys().collect();
        paths.sort();
        for path in paths {
            let record = &snapshot.available[path];
            let (util, queue) = record.get_iostats();
            let labels = vec![("mountpath".to_string(), path.clone())];
            metrics.push(gauge(
                "strata_mountfs_disk_util",
                "Latest disk utilization sample",
                util.curr,
                labels.clone(),
            ));
            metrics.push(gauge(
                "strata_mountfs_disk_queue_len",
                "Latest disk queue-length sample",
                queue.curr,
                labels,
            ));
        }

        metrics.push(counter(
            "strata_mountfs_adds_total",
            "Total successful mountpath adds",
            counters.adds,
        ));
        metrics.push(counter(
            "strata_mountfs_removes_total",
            "Total successful mountpath removes",
            counters.removes,
        ));
        metrics.push(counter(
            "strata_mountfs_enables_total",
            "Total mountpath enables that changed state",
            counters.enables,
        ));
        metrics.push(counter(
            "strata_mountfs_disables_total",
            "Total mountpath disables that changed state",
            counters.disables,
        ));
        metrics.push(counter(
            "strata_mountfs_rejected_total",
            "Total mutations rejected with an error",
            counters.rejected,
        ));

        metrics
    }
}
