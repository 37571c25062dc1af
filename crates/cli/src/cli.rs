//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fanout - bounded-time concurrent HTTP fan-out
#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    author,
    version,
    about = "Bounded-time concurrent fan-out dispatcher",
    long_about = "Dispatches one request per target in parallel and collects whatever \n\
                  outcomes arrive before the deadline.\n\n\
                  Late results are discarded; the call never waits past the timeout."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FANOUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FANOUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch requests to every target and print the collected outcomes
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); optional when --url is given
    #[arg(short, long, env = "FANOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Additional target URL (repeatable)
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Override the collection deadline in milliseconds
    #[arg(long, env = "FANOUT_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Override the number of requests allowed in flight at once
    #[arg(long, env = "FANOUT_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Leave late requests running after the deadline instead of cancelling them
    #[arg(long)]
    pub abandon: bool,

    /// Number of dispatch rounds to run
    #[arg(long, default_value = "1", env = "FANOUT_REPEAT")]
    pub repeat: u32,

    /// Print outcomes as JSON
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FANOUT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "fanout.toml", env = "FANOUT_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "fanout.toml", env = "FANOUT_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_urls_only() {
        let cli = Cli::try_parse_from([
            "fanout",
            "run",
            "--url",
            "https://httpbin.org/ip",
            "-u",
            "https://httpbin.org/get",
            "--timeout-ms",
            "250",
            "--abandon",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.config.is_none());
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.timeout_ms, Some(250));
        assert!(args.abandon);
        assert_eq!(args.repeat, 1);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["fanout", "-q", "-v", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_maps_to_observability() {
        let format: observability::LogFormat = LogFormat::Compact.into();
        assert_eq!(format, observability::LogFormat::Compact);
    }
}
