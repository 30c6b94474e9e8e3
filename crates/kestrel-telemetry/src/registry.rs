//! In-memory metrics registry
//!
//! Backs both [`MetricController`] and [`EngineMetrics`]. Values live for the
//! process; `snapshot` hands out a serializable copy for upload or debugging.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::{EngineMetrics, Event, MetricController, TabKillLabel};

/// Raw nanosecond samples plus running aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingDistribution {
    pub samples: Vec<i64>,
    pub sum: i64,
}

impl TimingDistribution {
    fn accumulate(&mut self, nanos: i64) {
        self.samples.push(nanos);
        self.sum = self.sum.saturating_add(nanos);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub events: BTreeMap<Event, u64>,
    pub tab_kills: BTreeMap<TabKillLabel, u64>,
    pub kill_foreground_age: TimingDistribution,
    pub kill_background_age: TimingDistribution,
    pub taken_at: Option<DateTime<Utc>>,
}

pub struct MetricsRegistry {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn event_count(&self, event: Event) -> u64 {
        self.inner.lock().events.get(&event).copied().unwrap_or(0)
    }

    pub fn tab_kills(&self, label: TabKillLabel) -> u64 {
        self.inner.lock().tab_kills.get(&label).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = self.inner.lock().clone();
        snapshot.taken_at = Some(Utc::now());
        snapshot
    }

    /// Snapshot and reset, as done before an upload
    pub fn take(&self) -> MetricsSnapshot {
        let mut snapshot = std::mem::take(&mut *self.inner.lock());
        snapshot.taken_at = Some(Utc::now());
        snapshot
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricController for MetricsRegistry {
    fn track(&self, event: Event) {
        tracing::debug!(event = %event, "Tracking event");
        *self.inner.lock().events.entry(event).or_insert(0) += 1;
    }
}

impl EngineMetrics for MetricsRegistry {
    fn record_tab_kill(&self, label: TabKillLabel) {
        *self.inner.lock().tab_kills.entry(label).or_insert(0) += 1;
    }

    fn record_kill_age(&self, label: TabKillLabel, age_nanos: i64) {
        let mut inner = self.inner.lock();
        match label {
            TabKillLabel::Foreground => inner.kill_foreground_age.accumulate(age_nanos),
            TabKillLabel::Background => inner.kill_background_age.accumulate(age_nanos),
        }
    }
}
