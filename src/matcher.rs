/// Anchored named-group matching of a single log line.
///
/// A [`LineMatcher`] is a pure string-in, fields-out transform: it knows
/// nothing about numbers. The compiled pattern is immutable after
/// construction, so a matcher may be shared across threads.
use crate::error::{ConfigError, ParseError};
use regex::Regex;
use std::collections::HashMap;

/// Result of applying a matcher to one line. There are no partial matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Matched(Fields),
    Unmatched,
}

/// Named fields captured from a matched line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Fetch a field the parser cannot do without.
    ///
    /// Fields named in the matcher's required set are validated at
    /// construction, so a miss here means an optional group did not
    /// participate in the match.
    pub fn require(&self, name: &'static str) -> Result<&str, ParseError> {
        self.get(name).ok_or_else(|| ParseError::InvalidField {
            field: name,
            value: String::new(),
            reason: "field not captured".to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LineMatcher {
    regex: Regex,
}

impl LineMatcher {
    /// Compile `pattern` anchored at both ends and check that every name in
    /// `required` is a named capture group.
    pub fn new(pattern: &str, required: &[&str]) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        for field in required {
            if !regex.capture_names().flatten().any(|name| name == *field) {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(Self { regex })
    }

    /// Match one line. A trailing `\n` or `\r\n` is ignored.
    pub fn match_line(&self, line: &str) -> ParseOutcome {
        let line = line.trim_end_matches(['\n', '\r']);
        let Some(caps) = self.regex.captures(line) else {
            return ParseOutcome::Unmatched;
        };

        let values = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        ParseOutcome::Matched(Fields { values })
    }

    /// Names of all capture groups in the pattern.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv_matcher() -> LineMatcher {
        LineMatcher::new(r"(?P<key>\w+)=(?P<value>\d+)", &["key", "value"]).unwrap()
    }

    #[test]
    fn matches_full_line() {
        match kv_matcher().match_line("requests=42") {
            ParseOutcome::Matched(fields) => {
                assert_eq!(fields.get("key"), Some("requests"));
                assert_eq!(fields.get("value"), Some("42"));
                assert_eq!(fields.len(), 2);
            }
            ParseOutcome::Unmatched => panic!("expected match"),
        }
    }

    #[test]
    fn tolerates_trailing_newline() {
        let m = kv_matcher();
        assert!(matches!(m.match_line("a=1\n"), ParseOutcome::Matched(_)));
        assert!(matches!(m.match_line("a=1\r\n"), ParseOutcome::Matched(_)));
    }

    #[test]
    fn anchored_at_both_ends() {
        let m = kv_matcher();
        assert_eq!(m.match_line("x a=1"), ParseOutcome::Unmatched);
        assert_eq!(m.match_line("a=1 trailing"), ParseOutcome::Unmatched);
        assert_eq!(m.match_line(""), ParseOutcome::Unmatched);
    }

    #[test]
    fn values_stay_strings() {
        let m = LineMatcher::new(r"(?P<n>\S+)", &["n"]).unwrap();
        match m.match_line("not-a-number") {
            ParseOutcome::Matched(fields) => assert_eq!(fields.get("n"), Some("not-a-number")),
            ParseOutcome::Unmatched => panic!("expected match"),
        }
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        let err = LineMatcher::new(r"(?P<open", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn missing_required_field_fails_construction() {
        let err = LineMatcher::new(r"(?P<key>\w+)", &["key", "value"]).unwrap_err();
        match err {
            ConfigError::MissingField { field } => assert_eq!(field, "value"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_group_absent_from_fields() {
        let m = LineMatcher::new(r"(?P<a>\d+)(?:-(?P<b>\d+))?", &["a"]).unwrap();
        let ParseOutcome::Matched(fields) = m.match_line("7") else {
            panic!("expected match");
        };
        assert_eq!(fields.get("b"), None);
        assert!(fields.require("b").is_err());
        assert_eq!(fields.require("a").unwrap(), "7");
    }

    #[test]
    fn field_names_lists_groups() {
        let matcher = kv_matcher();
        let names: Vec<&str> = matcher.field_names().collect();
        assert_eq!(names, vec!["key", "value"]);
    }
}
