use clap::Parser;
use logtally::config::{OutputFormat, RunConfig};
use logtally::parser::{build_parser, PARSER_NAMES};
use logtally::run::{feed_lines, FailurePolicy, WindowDuration};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

/// Extract counters and histograms from a log file in a single pass and
/// print the window's observations.
#[derive(Parser, Debug)]
#[command(name = "logtally", version, about)]
pub struct Cli {
    /// Log file to read (default: stdin)
    #[arg(value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "logtally.toml")]
    config: PathBuf,

    /// Parser name (overrides config)
    #[arg(short, long)]
    parser: Option<String>,

    /// Parser option string, e.g. "prefix=app" (overrides config)
    #[arg(long)]
    parser_options: Option<String>,

    /// Window duration in seconds (default: measured)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Stop at the first unparseable line
    #[arg(long)]
    fail_fast: bool,

    /// Extra logging (per-line parse failures)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "logtally=debug"
    } else if cli.quiet {
        "logtally=warn"
    } else {
        "logtally=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RunConfig::load(&cli.config)?;
    if let Some(name) = cli.parser {
        config.parser.name = name;
    }
    if cli.parser_options.is_some() {
        config.parser.options = cli.parser_options;
    }
    if cli.duration.is_some() {
        config.run.duration_secs = cli.duration;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    config.run.fail_fast |= cli.fail_fast;
    tracing::debug!(?config, "resolved configuration");

    let mut parser = build_parser(&config.parser.name, config.parser.options.as_deref())
        .map_err(|e| {
            tracing::error!(available = ?PARSER_NAMES, "could not construct parser");
            e
        })?;

    let policy = if config.run.fail_fast {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::TallyAndContinue
    };
    let duration = config
        .run
        .duration_secs
        .map_or(WindowDuration::Measured, WindowDuration::Fixed);

    let reader: Box<dyn BufRead> = match &cli.log_file {
        Some(path) => Box::new(std::io::BufReader::new(std::fs::File::open(path).map_err(
            |e| format!("failed to open {}: {e}", path.display()),
        )?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let report = feed_lines(parser.as_mut(), reader, policy, duration)?;
    match config.output.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "logtally failed");
            ExitCode::FAILURE
        }
    }
}
