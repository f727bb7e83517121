//! Pattern-driven extraction of metrics from log lines.
//!
//! A [`parser::LogParser`] matches each line against its format, records
//! counters and histograms for the current window, and hands back an
//! immutable [`window::WindowResult`] when the caller closes the window.

pub mod accumulator;
pub mod config;
pub mod convert;
pub mod error;
pub mod matcher;
pub mod metric;
pub mod options;
pub mod parser;
pub mod run;
pub mod summary;
pub mod window;
