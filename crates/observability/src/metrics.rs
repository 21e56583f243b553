//! Queue depth metrics
//!
//! Module-level counters (`daq_values_routed_total`, `daq_values_dropped_total`,
//! `daq_commands_total`, `daq_queue_push_timeouts_total`) are recorded where
//! they happen. This module samples queue state periodically: it exports
//! gauges and aggregates depth statistics for the end-of-run summary.

use std::collections::BTreeMap;
use std::fmt;

use metrics::gauge;
use queues::QueueSummary;

/// Export one sample of every queue as gauges
pub fn record_queue_summaries(summaries: &[QueueSummary]) {
    for summary in summaries {
        let queue = summary.name.clone();
        gauge!("daq_queue_depth", "queue" => queue.clone()).set(summary.len as f64);
        gauge!("daq_queue_capacity", "queue" => queue.clone()).set(summary.capacity as f64);
        gauge!("daq_queue_pushed", "queue" => queue.clone()).set(summary.metrics.pushed as f64);
        gauge!("daq_queue_popped", "queue" => queue).set(summary.metrics.popped as f64);
    }
}

/// Online mean / variance / min / max (Welford)
#[derive(Debug, Clone, Default)]
pub struct DepthStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl DepthStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[derive(Debug, Clone, Default)]
struct QueueTrack {
    capacity: usize,
    depth: DepthStats,
    full_samples: u64,
    pushed: u64,
    popped: u64,
    push_timeouts: u64,
}

/// Aggregates periodic queue samples over a run
#[derive(Debug, Clone, Default)]
pub struct QueueDepthAggregator {
    samples: u64,
    queues: BTreeMap<String, QueueTrack>,
}

impl QueueDepthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample of every queue
    pub fn update(&mut self, summaries: &[QueueSummary]) {
        self.samples += 1;
        for summary in summaries {
            let track = self.queues.entry(summary.name.clone()).or_default();
            track.capacity = summary.capacity;
            track.depth.push(summary.len as f64);
            if summary.len >= summary.capacity {
                track.full_samples += 1;
            }
            // Counters are cumulative, keep the latest
            track.pushed = summary.metrics.pushed;
            track.popped = summary.metrics.popped;
            track.push_timeouts = summary.metrics.push_timeouts;
        }
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            samples: self.samples,
            queues: self
                .queues
                .iter()
                .map(|(name, track)| QueueDepthSummary {
                    name: name.clone(),
                    capacity: track.capacity,
                    mean_depth: track.depth.mean(),
                    std_dev_depth: track.depth.std_dev(),
                    max_depth: track.depth.max(),
                    full_ratio: if track.depth.count() > 0 {
                        track.full_samples as f64 / track.depth.count() as f64 * 100.0
                    } else {
                        0.0
                    },
                    pushed: track.pushed,
                    popped: track.popped,
                    push_timeouts: track.push_timeouts,
                })
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueDepthSummary {
    pub name: String,
    pub capacity: usize,
    pub mean_depth: f64,
    pub std_dev_depth: f64,
    pub max_depth: f64,
    /// Percentage of samples in which the queue was full
    pub full_ratio: f64,
    pub pushed: u64,
    pub popped: u64,
    pub push_timeouts: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub samples: u64,
    pub queues: Vec<QueueDepthSummary>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Queue Summary ({} samples) ===", self.samples)?;
        for q in &self.queues {
            writeln!(
                f,
                "{}: capacity={}, depth mean={:.2} std={:.2} max={:.0}, full {:.1}%, pushed={}, popped={}, push timeouts={}",
                q.name,
                q.capacity,
                q.mean_depth,
                q.std_dev_depth,
                q.max_depth,
                q.full_ratio,
                q.pushed,
                q.popped,
                q.push_timeouts
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queues::QueueRegistry;
    use std::time::Duration;

    #[test]
    fn test_depth_stats() {
        let mut stats = DepthStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }
        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.std_dev() - 2.5f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_empty_stats() {
        let stats = DepthStats::default();
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);
    }

    #[test]
    fn test_aggregator_tracks_queue_samples() {
        let mut registry = QueueRegistry::new();
        let q = registry.create::<i64>("q", 2).unwrap();
        let mut aggregator = QueueDepthAggregator::new();

        aggregator.update(&registry.summaries());
        q.push(1, Duration::ZERO).unwrap();
        q.push(2, Duration::ZERO).unwrap();
        assert!(q.push(3, Duration::ZERO).is_err());
        aggregator.update(&registry.summaries());
        record_queue_summaries(&registry.summaries());

        let summary = aggregator.summary();
        assert_eq!(summary.samples, 2);
        let queue = &summary.queues[0];
        assert_eq!(queue.name, "q");
        assert_eq!(queue.capacity, 2);
        assert!((queue.mean_depth - 1.0).abs() < 1e-10);
        assert!((queue.full_ratio - 50.0).abs() < 1e-10);
        assert_eq!(queue.pushed, 2);
        assert_eq!(queue.push_timeouts, 1);
        assert!(summary.to_string().contains("q: capacity=2"));
    }
}
