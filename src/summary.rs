//! Derived per-series figures for a finalized window.
//!
//! Parsers hand back raw observations; this is where a harness turns them
//! into totals, rates and percentiles. Counters sharing a series name are
//! added, histogram observations stay independent samples, and gauges keep
//! the last value seen.

use crate::metric::MetricType;
use crate::window::WindowResult;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterSummary {
    pub total: f64,
    /// `total / duration`; absent for a zero-length window.
    pub per_second: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowSummary {
    pub duration_secs: f64,
    pub counters: BTreeMap<String, CounterSummary>,
    pub gauges: BTreeMap<String, f64>,
    pub histograms: BTreeMap<String, HistogramSummary>,
}

impl WindowResult {
    pub fn summarize(&self) -> WindowSummary {
        let duration = self.duration_secs();
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut gauges = BTreeMap::new();

        for obs in self.observations() {
            match obs.metric_type() {
                MetricType::Counter => {
                    *totals.entry(obs.name().to_string()).or_insert(0.0) += obs.value();
                }
                MetricType::Histogram => {
                    samples
                        .entry(obs.name().to_string())
                        .or_default()
                        .push(obs.value());
                }
                MetricType::Gauge => {
                    gauges.insert(obs.name().to_string(), obs.value());
                }
            }
        }

        let counters = totals
            .into_iter()
            .map(|(name, total)| {
                let per_second = (duration > 0.0).then(|| total / duration);
                (name, CounterSummary { total, per_second })
            })
            .collect();

        let histograms = samples
            .into_iter()
            .map(|(name, mut values)| {
                values.sort_by(f64::total_cmp);
                (name, histogram_summary(&values))
            })
            .collect();

        WindowSummary {
            duration_secs: duration,
            counters,
            gauges,
            histograms,
        }
    }
}

/// `sorted` must be non-empty and ascending.
fn histogram_summary(sorted: &[f64]) -> HistogramSummary {
    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    HistogramSummary {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        mean: sum / count as f64,
        p50: nearest_rank(sorted, 50.0),
        p90: nearest_rank(sorted, 90.0),
        p99: nearest_rank(sorted, 99.0),
    }
}

/// Nearest-rank percentile: the smallest value with at least `pct`% of
/// samples at or below it.
fn nearest_rank(sorted: &[f64], pct: f64) -> f64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
