use crate::metric::MetricObservation;
use std::collections::BTreeMap;

/// Per-window tallies and observations, owned by exactly one parser.
///
/// Tallies only ever grow and observations are append-only. There is no
/// reset; a new window means a new accumulator.
#[derive(Debug, Default)]
pub struct MetricAccumulator {
    tallies: BTreeMap<String, u64>,
    observations: Vec<MetricObservation>,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the tally for `key`, creating it at zero first.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &str, amount: u64) {
        let slot = self.tallies.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Current tally for `key`, zero if never incremented.
    pub fn tally(&self, key: &str) -> u64 {
        self.tallies.get(key).copied().unwrap_or(0)
    }

    pub fn tallies(&self) -> &BTreeMap<String, u64> {
        &self.tallies
    }

    pub fn push(&mut self, observation: MetricObservation) {
        self.observations.push(observation);
    }

    pub fn observations(&self) -> &[MetricObservation] {
        &self.observations
    }

    pub(crate) fn take_observations(&mut self) -> Vec<MetricObservation> {
        std::mem::take(&mut self.observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tally_is_zero() {
        let acc = MetricAccumulator::new();
        assert_eq!(acc.tally("http_2xx"), 0);
    }

    #[test]
    fn increments_accumulate() {
        let mut acc = MetricAccumulator::new();
        acc.increment("http_2xx");
        acc.increment("http_2xx");
        acc.add("http_5xx", 3);
        assert_eq!(acc.tally("http_2xx"), 2);
        assert_eq!(acc.tally("http_5xx"), 3);
        assert_eq!(acc.tallies().len(), 2);
    }

    #[test]
    fn add_saturates() {
        let mut acc = MetricAccumulator::new();
        acc.add("big", u64::MAX);
        acc.increment("big");
        assert_eq!(acc.tally("big"), u64::MAX);
    }

    #[test]
    fn observations_keep_insertion_order() {
        let mut acc = MetricAccumulator::new();
        acc.push(MetricObservation::counter("a", 1.0));
        acc.push(MetricObservation::histogram("b", 2.0));
        let names: Vec<&str> = acc.observations().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
