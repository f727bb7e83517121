use super::LogParser;
use crate::accumulator::MetricAccumulator;
use crate::convert::{parse_unsigned, seconds_to_millis};
use crate::error::{ConfigError, ParseError, ParserError};
use crate::matcher::{LineMatcher, ParseOutcome};
use crate::metric::{series_name, MetricObservation};
use crate::options::ParserOptions;
use crate::window::{Window, WindowResult};
use std::collections::BTreeMap;

pub const NAME: &str = "nginx";

pub const FIELD_REMOTE_ADDR: &str = "remote_addr";
pub const FIELD_TIME_LOCAL: &str = "time_local";
pub const FIELD_HOST: &str = "host";
pub const FIELD_REQUEST: &str = "request";
pub const FIELD_STATUS: &str = "http_status_code";
pub const FIELD_BYTES_SENT: &str = "bytes_sent";
pub const FIELD_REFERER: &str = "http_referer";
pub const FIELD_USER_AGENT: &str = "http_user_agent";
pub const FIELD_FORWARDED_FOR: &str = "http_x_forwarded_for";
pub const FIELD_RESPONSE_TIME: &str = "upstream_response_time";

const FIELDS: &[&str] = &[
    FIELD_REMOTE_ADDR,
    FIELD_TIME_LOCAL,
    FIELD_HOST,
    FIELD_REQUEST,
    FIELD_STATUS,
    FIELD_BYTES_SENT,
    FIELD_REFERER,
    FIELD_USER_AGENT,
    FIELD_FORWARDED_FOR,
    FIELD_RESPONSE_TIME,
];

/// nginx `log_format`:
///
/// ```text
/// $remote_addr - $remote_user [$time_local] $host "$request" $status $bytes_sent
///   "$http_referer" "$http_user_agent" "$http_x_forwarded_for" $upstream_response_time
/// ```
const LINE_PATTERN: &str = concat!(
    r"(?P<remote_addr>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}) - - ",
    r"\[(?P<time_local>.*)\] ",
    r"(?P<host>\S+) ",
    r#""(?P<request>\w{3,6}.* \w{0,4}/\d\.\d)" "#,
    r"(?P<http_status_code>\d+) ",
    r"(?P<bytes_sent>\d+) ",
    r#""(?P<http_referer>\S+)" "#,
    r#""(?P<http_user_agent>.*)" "#,
    r#""(?P<http_x_forwarded_for>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})" "#,
    r"(?P<upstream_response_time>\d+\.\d+)",
);

const CODE_METRIC: &str = "statsd.http.code";
const RESPONSE_TIME_METRIC: &str = "statsd.http.response_time";

/// HTTP response class.
///
/// Codes below 100 count as 1xx and anything from 500 up counts as 5xx, so
/// every parsed code lands in exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub const ALL: [StatusClass; 5] = [
        StatusClass::Informational,
        StatusClass::Success,
        StatusClass::Redirection,
        StatusClass::ClientError,
        StatusClass::ServerError,
    ];

    pub fn from_code(code: u64) -> Self {
        match code {
            0..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirection,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    /// Tally key, e.g. `http_2xx`.
    pub fn key(self) -> &'static str {
        match self {
            StatusClass::Informational => "http_1xx",
            StatusClass::Success => "http_2xx",
            StatusClass::Redirection => "http_3xx",
            StatusClass::ClientError => "http_4xx",
            StatusClass::ServerError => "http_5xx",
        }
    }
}

/// Parser for nginx access logs carrying host and upstream response time.
///
/// Per matched line: one counter `statsd.http.code,http_host=H,http_code=C`
/// with value 1, one histogram `statsd.http.response_time,http_host=H` with
/// the response time in milliseconds, and one status-class tally.
pub struct NginxParser {
    matcher: LineMatcher,
    window: Window,
}

impl NginxParser {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_options(ParserOptions::default())
    }

    /// This parser takes no options; any key is rejected.
    pub fn with_options(options: ParserOptions) -> Result<Self, ConfigError> {
        options.finish(NAME)?;
        Ok(Self {
            matcher: LineMatcher::new(LINE_PATTERN, FIELDS)?,
            window: Window::new(),
        })
    }

    pub fn status_count(&self, class: StatusClass) -> u64 {
        self.window.accumulator().tally(class.key())
    }

    fn record(
        accumulator: &mut MetricAccumulator,
        host: &str,
        code: &str,
        status: u64,
        response_ms: u64,
    ) {
        accumulator.increment(StatusClass::from_code(status).key());
        accumulator.push(MetricObservation::counter(
            series_name(CODE_METRIC, &[("http_host", host), ("http_code", code)]),
            1.0,
        ));
        // Exact for anything under 2^53 ms (about 285,000 years).
        accumulator.push(MetricObservation::histogram(
            series_name(RESPONSE_TIME_METRIC, &[("http_host", host)]),
            response_ms as f64,
        ));
    }
}

impl LogParser for NginxParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse_line(&mut self, line: &str) -> Result<(), ParserError> {
        let accumulator = self.window.accumulator_mut()?;

        let fields = match self.matcher.match_line(line) {
            ParseOutcome::Matched(fields) => fields,
            ParseOutcome::Unmatched => {
                return Err(ParseError::Unmatched {
                    line: line.trim_end_matches(['\n', '\r']).to_string(),
                }
                .into())
            }
        };

        let host = fields.require(FIELD_HOST)?;
        let code = fields.require(FIELD_STATUS)?;
        let status = parse_unsigned(code).map_err(|reason| ParseError::InvalidField {
            field: FIELD_STATUS,
            value: code.to_string(),
            reason: reason.to_string(),
        })?;
        let raw_time = fields.require(FIELD_RESPONSE_TIME)?;
        let response_ms =
            seconds_to_millis(raw_time).map_err(|reason| ParseError::InvalidField {
                field: FIELD_RESPONSE_TIME,
                value: raw_time.to_string(),
                reason: reason.to_string(),
            })?;

        Self::record(accumulator, host, code, status, response_ms);
        Ok(())
    }

    fn get_state(&mut self, duration_secs: f64) -> Result<WindowResult, ParserError> {
        Ok(self.window.finalize(duration_secs)?)
    }

    fn tallies(&self) -> &BTreeMap<String, u64> {
        self.window.accumulator().tallies()
    }
}
