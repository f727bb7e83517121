use serde::Serialize;

/// How a publisher should aggregate an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    /// Single-letter statsd type code.
    pub fn code(self) -> &'static str {
        match self {
            MetricType::Counter => "c",
            MetricType::Gauge => "g",
            MetricType::Histogram => "h",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One named value produced from a log line.
///
/// The name carries its tags inline (`prefix,key=value,...`), see [`series_name`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricObservation {
    name: String,
    value: f64,
    units: String,
    #[serde(rename = "type")]
    metric_type: MetricType,
}

impl MetricObservation {
    pub fn new(name: impl Into<String>, value: f64, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            value,
            units: String::new(),
            metric_type,
        }
    }

    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, MetricType::Counter)
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, MetricType::Gauge)
    }

    pub fn histogram(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, MetricType::Histogram)
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }
}

/// Join a metric prefix with `key=value` tags, comma separated.
pub fn series_name(prefix: &str, tags: &[(&str, &str)]) -> String {
    let mut name = String::from(prefix);
    for (key, value) in tags {
        name.push(',');
        name.push_str(key);
        name.push('=');
        name.push_str(value);
    }
    name
}
