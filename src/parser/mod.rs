pub mod keyvalue;
pub mod nginx;

use crate::error::{ConfigError, ParserError};
use crate::options::ParserOptions;
use crate::window::WindowResult;
use std::collections::BTreeMap;

/// Turns the lines of one log format into metric observations for a window.
///
/// One instance covers exactly one window: it accumulates from construction
/// until [`LogParser::get_state`] succeeds and is finalized afterwards. A new
/// window needs a new instance.
pub trait LogParser: Send {
    /// Registry name of this parser (e.g., "nginx").
    fn name(&self) -> &str;

    /// Digest one line.
    ///
    /// Fails with a parse error when the line does not match or a captured
    /// field cannot be converted, and with a state error after finalization.
    /// A failed line leaves the window unchanged.
    fn parse_line(&mut self, line: &str) -> Result<(), ParserError>;

    /// Finalize the window and return everything observed in it.
    ///
    /// `duration_secs` is supplied by the caller; parsers never read the clock.
    /// Repeated calls return the same observations.
    fn get_state(&mut self, duration_secs: f64) -> Result<WindowResult, ParserError>;

    /// Bucket tallies kept alongside the observations (e.g., status classes).
    fn tallies(&self) -> &BTreeMap<String, u64>;
}

/// Names accepted by [`build_parser`].
pub const PARSER_NAMES: &[&str] = &[nginx::NAME, keyvalue::NAME];

/// Construct a parser by name from an option string.
pub fn build_parser(
    name: &str,
    option_string: Option<&str>,
) -> Result<Box<dyn LogParser>, ConfigError> {
    let options = ParserOptions::parse(option_string)?;
    match name {
        nginx::NAME => Ok(Box::new(nginx::NginxParser::with_options(options)?)),
        keyvalue::NAME => Ok(Box::new(keyvalue::KeyValueParser::with_options(options)?)),
        _ => Err(ConfigError::UnknownParser {
            name: name.to_string(),
        }),
    }
}
