use super::LogParser;
use crate::convert::parse_decimal;
use crate::error::{ConfigError, ParseError, ParserError};
use crate::matcher::{LineMatcher, ParseOutcome};
use crate::metric::MetricObservation;
use crate::options::ParserOptions;
use crate::window::{Window, WindowResult};
use std::collections::BTreeMap;

pub const NAME: &str = "keyvalue";

const FIELD_KIND: &str = "kind";
const FIELD_METRIC: &str = "metric";
const FIELD_VALUE: &str = "value";
const FIELD_UNITS: &str = "units";

/// One `kind#name=value[units]` token.
const TOKEN_PATTERN: &str =
    r"(?P<kind>count|measure|sample)#(?P<metric>[A-Za-z0-9._-]+)=(?P<value>-?\d+(?:\.\d+)?)(?P<units>[A-Za-z%]+)?";

/// Parser for `count#`/`measure#`/`sample#` tokens embedded in free-form lines.
///
/// ```text
/// at=info count#jobs.done=1 measure#jobs.latency=35ms sample#queue.depth=12
/// ```
///
/// `count` becomes a counter, `measure` a histogram, `sample` a gauge. Other
/// tokens on the line are ignored, but a line with no metric token at all is a
/// parse error. Tallies record how many tokens of each kind were seen.
///
/// Options: `prefix=<name>` prepends `<name>.` to every metric name.
pub struct KeyValueParser {
    token: LineMatcher,
    prefix: Option<String>,
    window: Window,
}

impl KeyValueParser {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(mut options: ParserOptions) -> Result<Self, ConfigError> {
        let prefix = options.take("prefix");
        if let Some(p) = &prefix {
            if p.is_empty() || p.contains(',') {
                return Err(ConfigError::InvalidOptionValue {
                    key: "prefix".to_string(),
                    value: p.clone(),
                    reason: "must be non-empty and contain no commas".to_string(),
                });
            }
        }
        options.finish(NAME)?;

        Ok(Self {
            token: LineMatcher::new(TOKEN_PATTERN, &[FIELD_KIND, FIELD_METRIC, FIELD_VALUE])?,
            prefix,
            window: Window::new(),
        })
    }

    fn metric_name(&self, metric: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{metric}"),
            None => metric.to_string(),
        }
    }

    /// Metric carried by one token, with its tally key. Non-metric tokens yield `None`.
    fn observe_token(
        &self,
        token: &str,
    ) -> Result<Option<(&'static str, MetricObservation)>, ParseError> {
        let fields = match self.token.match_line(token) {
            ParseOutcome::Matched(fields) => fields,
            ParseOutcome::Unmatched => return Ok(None),
        };

        let raw = fields.require(FIELD_VALUE)?;
        let value = parse_decimal(raw).map_err(|reason| ParseError::InvalidField {
            field: FIELD_VALUE,
            value: raw.to_string(),
            reason: reason.to_string(),
        })?;
        let name = self.metric_name(fields.require(FIELD_METRIC)?);

        let (kind, observation) = match fields.require(FIELD_KIND)? {
            "count" => {
                if value < 0.0 {
                    return Err(ParseError::InvalidField {
                        field: FIELD_VALUE,
                        value: raw.to_string(),
                        reason: "counts cannot be negative".to_string(),
                    });
                }
                ("count", MetricObservation::counter(name, value))
            }
            "measure" => ("measure", MetricObservation::histogram(name, value)),
            _ => ("sample", MetricObservation::gauge(name, value)),
        };
        let observation = match fields.get(FIELD_UNITS) {
            Some(units) => observation.with_units(units),
            None => observation,
        };
        Ok(Some((kind, observation)))
    }
}

impl LogParser for KeyValueParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse_line(&mut self, line: &str) -> Result<(), ParserError> {
        self.window.ensure_accumulating()?;

        let mut found = Vec::new();
        for token in line.split_whitespace() {
            if let Some(entry) = self.observe_token(token)? {
                found.push(entry);
            }
        }
        if found.is_empty() {
            return Err(ParseError::Unmatched {
                line: line.trim_end_matches(['\n', '\r']).to_string(),
            }
            .into());
        }

        let accumulator = self.window.accumulator_mut()?;
        for (kind, observation) in found {
            accumulator.increment(kind);
            accumulator.push(observation);
        }
        Ok(())
    }

    fn get_state(&mut self, duration_secs: f64) -> Result<WindowResult, ParserError> {
        Ok(self.window.finalize(duration_secs)?)
    }

    fn tallies(&self) -> &BTreeMap<String, u64> {
        self.window.accumulator().tallies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use crate::metric::MetricType;

    #[test]
    fn extracts_each_token_kind() {
        let mut parser = KeyValueParser::new().unwrap();
        parser
            .parse_line(
                "at=info count#jobs.done=1 measure#jobs.latency=35ms sample#queue.depth=12",
            )
            .unwrap();
        let result = parser.get_state(10.0).unwrap();
        let obs = result.observations();
        assert_eq!(obs.len(), 3);

        assert_eq!(obs[0].name(), "jobs.done");
        assert_eq!(obs[0].metric_type(), MetricType::Counter);
        assert_eq!(obs[0].value(), 1.0);

        assert_eq!(obs[1].name(), "jobs.latency");
        assert_eq!(obs[1].metric_type(), MetricType::Histogram);
        assert_eq!(obs[1].value(), 35.0);
        assert_eq!(obs[1].units(), "ms");

        assert_eq!(obs[2].metric_type(), MetricType::Gauge);
        assert_eq!(obs[2].value(), 12.0);
        assert_eq!(obs[2].units(), "");

        assert_eq!(parser.tallies().get("count"), Some(&1));
        assert_eq!(parser.tallies().get("measure"), Some(&1));
        assert_eq!(parser.tallies().get("sample"), Some(&1));
    }

    #[test]
    fn prefix_option_is_applied() {
        let options = ParserOptions::parse(Some("prefix=worker")).unwrap();
        let mut parser = KeyValueParser::with_options(options).unwrap();
        parser.parse_line("count#jobs=3").unwrap();
        let result = parser.get_state(1.0).unwrap();
        assert_eq!(result.observations()[0].name(), "worker.jobs");
        assert_eq!(result.observations()[0].value(), 3.0);
    }

    #[test]
    fn invalid_prefix_rejected() {
        let options = ParserOptions::parse(Some("prefix=a,b")).unwrap();
        assert!(matches!(
            KeyValueParser::with_options(options),
            Err(ConfigError::InvalidOptionValue { .. })
        ));
    }

    #[test]
    fn unknown_option_rejected() {
        let options = ParserOptions::parse(Some("prefix=ok sufix=x")).unwrap();
        assert!(matches!(
            KeyValueParser::with_options(options),
            Err(ConfigError::UnknownOption { key, .. }) if key == "sufix"
        ));
    }

    #[test]
    fn line_without_tokens_is_parse_error() {
        let mut parser = KeyValueParser::new().unwrap();
        let err = parser.parse_line("at=info msg=hello").unwrap_err();
        assert!(matches!(err, ParserError::Parse(ParseError::Unmatched { .. })));
    }

    #[test]
    fn negative_count_rejects_whole_line() {
        let mut parser = KeyValueParser::new().unwrap();
        let err = parser
            .parse_line("sample#depth=4 count#jobs=-1")
            .unwrap_err();
        assert!(matches!(
            err,
            ParserError::Parse(ParseError::InvalidField { field: "value", .. })
        ));
        assert!(parser.tallies().is_empty());
        assert!(parser.get_state(1.0).unwrap().is_empty());
    }

    #[test]
    fn negative_sample_allowed() {
        let mut parser = KeyValueParser::new().unwrap();
        parser.parse_line("sample#temp=-2.5").unwrap();
        assert_eq!(parser.get_state(1.0).unwrap().observations()[0].value(), -2.5);
    }

    #[test]
    fn duplicate_counters_are_kept_as_separate_observations() {
        let mut parser = KeyValueParser::new().unwrap();
        parser.parse_line("count#jobs=1").unwrap();
        parser.parse_line("count#jobs=2").unwrap();
        assert_eq!(parser.tallies().get("count"), Some(&2));
        assert_eq!(parser.get_state(1.0).unwrap().len(), 2);
    }

    #[test]
    fn parse_after_finalize_is_state_error_even_for_bad_lines() {
        let mut parser = KeyValueParser::new().unwrap();
        parser.get_state(0.0).unwrap();
        let err = parser.parse_line("nothing here").unwrap_err();
        assert!(matches!(
            err,
            ParserError::State(StateError::AlreadyFinalized { .. })
        ));
    }
}
