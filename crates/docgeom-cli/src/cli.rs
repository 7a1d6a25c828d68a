use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default)
    Info,
    /// Debug messages, one line per group
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "docgeom")]
#[command(
    about = "docgeom - reads document location records, resolves their geometry and loads the points into a relational table"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (JSON or TOML). This option is mandatory
    #[arg(short = 'c', long, global = true, env = "DOCGEOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'info'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Level requested on the command line, if any
    pub fn requested_level(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the migration once: fetch, resolve, truncate and reload the output table
    Run(RunArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Truncate and insert in a single transaction (overrides config)
    #[arg(long)]
    pub atomic_replace: bool,

    /// Rows per insert batch (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_option_after_subcommand() {
        let cli = Cli::try_parse_from(["docgeom", "run", "-c", "docgeom.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("docgeom.json")));
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["docgeom", "-v", "-l", "warn", "run"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::WARN));

        let cli = Cli::try_parse_from(["docgeom", "-v", "run"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::DEBUG));

        let cli = Cli::try_parse_from(["docgeom", "run"]).unwrap();
        assert_eq!(cli.requested_level(), None);
    }

    #[test]
    fn test_run_overrides() {
        let cli =
            Cli::try_parse_from(["docgeom", "run", "--atomic-replace", "--batch-size", "50"])
                .unwrap();
        let Commands::Run(args) = cli.command;
        assert!(args.atomic_replace);
        assert_eq!(args.batch_size, Some(50));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(Cli::try_parse_from(["docgeom", "run", "--batch-size", "0"]).is_err());
    }
}
