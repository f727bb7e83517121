/// Feed a log source through one parser for one window.
///
/// This is the minimal driver around the parser contract: lines go in order,
/// parse failures are tallied or abort per [`FailurePolicy`], and the caller
/// decides the window duration.
use crate::error::{ParseError, ParserError};
use crate::parser::LogParser;
use crate::window::WindowResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to do when a line fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Count the failure and keep going.
    #[default]
    TallyAndContinue,
    /// Stop at the first failure.
    FailFast,
}

/// Where the window duration comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowDuration {
    Fixed(f64),
    /// Wall-clock time spent feeding lines.
    Measured,
}

/// Errors that end a run before a window is produced.
#[derive(Debug)]
pub enum RunError {
    /// Reading from the log source failed.
    Io {
        line_number: u64,
        source: std::io::Error,
    },
    /// The parser returned an error the policy does not absorb.
    Parser {
        line_number: Option<u64>,
        source: ParserError,
    },
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Io {
                line_number,
                source,
            } => write!(f, "failed reading line {line_number}: {source}"),
            RunError::Parser {
                line_number: Some(n),
                source,
            } => write!(f, "line {n}: {source}"),
            RunError::Parser {
                line_number: None,
                source,
            } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Io { source, .. } => Some(source),
            RunError::Parser { source, .. } => Some(source),
        }
    }
}

/// Outcome of one window.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub parser: String,
    pub generated_at: DateTime<Utc>,
    pub lines_read: u64,
    pub parse_failures: u64,
    pub tallies: BTreeMap<String, u64>,
    #[serde(serialize_with = "serialize_window")]
    pub window: WindowResult,
}

fn serialize_window<S: serde::Serializer>(
    window: &WindowResult,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut s = serializer.serialize_struct("WindowResult", 3)?;
    s.serialize_field("duration_secs", &window.duration_secs())?;
    s.serialize_field("observations", window.observations())?;
    s.serialize_field("summary", &window.summarize())?;
    s.end()
}

/// Feed every line of `reader` to `parser`, then finalize the window.
pub fn feed_lines<R: BufRead>(
    parser: &mut dyn LogParser,
    mut reader: R,
    policy: FailurePolicy,
    duration: WindowDuration,
) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let mut lines_read = 0u64;
    let mut parse_failures = 0u64;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| RunError::Io {
                line_number: lines_read + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        lines_read += 1;

        // Undecodable bytes fail only this line, never the window.
        let outcome = match std::str::from_utf8(&buf) {
            Ok(line) => parser.parse_line(line),
            Err(_) => Err(ParseError::InvalidEncoding {
                line: String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string(),
            }
            .into()),
        };

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_parse_failure() && policy == FailurePolicy::TallyAndContinue => {
                parse_failures += 1;
                debug!(line_number = lines_read, error = %e, "skipping unparseable line");
            }
            Err(source) => {
                return Err(RunError::Parser {
                    line_number: Some(lines_read),
                    source,
                })
            }
        }
    }

    let duration_secs = match duration {
        WindowDuration::Fixed(secs) => secs,
        WindowDuration::Measured => started.elapsed().as_secs_f64(),
    };
    let window = parser
        .get_state(duration_secs)
        .map_err(|source| RunError::Parser {
            line_number: None,
            source,
        })?;

    if parse_failures > 0 {
        warn!(
            parser = parser.name(),
            parse_failures, lines_read, "some lines could not be parsed"
        );
    }
    info!(
        parser = parser.name(),
        lines_read,
        observations = window.len(),
        duration_secs,
        "window complete"
    );

    Ok(RunReport {
        parser: parser.name().to_string(),
        generated_at: Utc::now(),
        lines_read,
        parse_failures,
        tallies: parser.tallies().clone(),
        window,
    })
}

impl RunReport {
    /// Plain-text rendering: one `name value units type` line per observation,
    /// followed by the tallies.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for obs in self.window.observations() {
            out.push_str(&format!(
                "{} {} {} {}\n",
                obs.name(),
                obs.value(),
                obs.units(),
                obs.metric_type()
            ));
        }
        for (key, count) in &self.tallies {
            out.push_str(&format!("# {key} {count}\n"));
        }
        out.push_str(&format!(
            "# lines={} parse_failures={} duration_secs={}\n",
            self.lines_read,
            self.parse_failures,
            self.window.duration_secs()
        ));
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
