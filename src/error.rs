/// Error taxonomy for line parsing, parser configuration, and window lifecycle.
///
/// Every parser operation returns one of these to its caller. Nothing in the
/// crate swallows them; the run driver decides whether a [`ParseError`] is
/// tallied or aborts the window.
use std::path::PathBuf;

/// A line did not match the expected structure, or a captured field could not
/// be converted to the type the parser needs. Recoverable: the next line can
/// still be fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line does not conform to the parser's pattern.
    Unmatched { line: String },
    /// The line is not valid UTF-8. Carries a lossy rendering of it.
    InvalidEncoding { line: String },
    /// A captured field failed numeric conversion.
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unmatched { line } => {
                write!(f, "line did not match expected format: {line:?}")
            }
            ParseError::InvalidEncoding { line } => {
                write!(f, "line is not valid UTF-8: {line:?}")
            }
            ParseError::InvalidField {
                field,
                value,
                reason,
            } => write!(f, "field {field} has invalid value {value:?}: {reason}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Invalid construction-time options, an invalid pattern, or an invalid
/// duration handed to finalization. Fatal for the parser instance.
#[derive(Debug)]
pub enum ConfigError {
    /// An option key the parser does not recognize.
    UnknownOption { parser: String, key: String },
    /// An option token that is not of the form `key=value`.
    MalformedOption { token: String },
    /// The same option key given more than once.
    DuplicateOption { key: String },
    /// A recognized option with an unusable value.
    InvalidOptionValue {
        key: String,
        value: String,
        reason: String,
    },
    /// The line pattern failed to compile.
    InvalidPattern(regex::Error),
    /// The line pattern lacks a named field the parser reads.
    MissingField { field: String },
    /// No parser is registered under this name.
    UnknownParser { name: String },
    /// Window duration was negative or not finite.
    InvalidDuration { duration: f64 },
    /// The run configuration file could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The run configuration file is not valid TOML for this schema.
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownOption { parser, key } => {
                write!(f, "parser {parser} does not accept option {key:?}")
            }
            ConfigError::MalformedOption { token } => {
                write!(f, "malformed parser option {token:?}, expected key=value")
            }
            ConfigError::DuplicateOption { key } => {
                write!(f, "parser option {key:?} given more than once")
            }
            ConfigError::InvalidOptionValue { key, value, reason } => {
                write!(f, "invalid value {value:?} for option {key}: {reason}")
            }
            ConfigError::InvalidPattern(e) => write!(f, "invalid line pattern: {e}"),
            ConfigError::MissingField { field } => {
                write!(f, "line pattern has no named group {field:?}")
            }
            ConfigError::UnknownParser { name } => write!(f, "unknown parser {name:?}"),
            ConfigError::InvalidDuration { duration } => write!(
                f,
                "window duration must be a non-negative finite number of seconds, got {duration}"
            ),
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPattern(e) => Some(e),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<regex::Error> for ConfigError {
    fn from(e: regex::Error) -> Self {
        ConfigError::InvalidPattern(e)
    }
}

/// An operation was invoked in the wrong lifecycle state. Indicates a caller bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    AlreadyFinalized { operation: &'static str },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::AlreadyFinalized { operation } => {
                write!(f, "cannot {operation}: window already finalized")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Any error a parser operation can return.
#[derive(Debug)]
pub enum ParserError {
    Parse(ParseError),
    Config(ConfigError),
    State(StateError),
}

impl ParserError {
    /// True for per-line failures a harness may tally and skip.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, ParserError::Parse(_))
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::Parse(e) => write!(f, "parse error: {e}"),
            ParserError::Config(e) => write!(f, "configuration error: {e}"),
            ParserError::State(e) => write!(f, "state error: {e}"),
        }
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParserError::Parse(e) => Some(e),
            ParserError::Config(e) => Some(e),
            ParserError::State(e) => Some(e),
        }
    }
}

impl From<ParseError> for ParserError {
    fn from(e: ParseError) -> Self {
        ParserError::Parse(e)
    }
}

impl From<ConfigError> for ParserError {
    fn from(e: ConfigError) -> Self {
        ParserError::Config(e)
    }
}

impl From<StateError> for ParserError {
    fn from(e: StateError) -> Self {
        ParserError::State(e)
    }
}
