use std::io;

use clap::{Parser, ValueEnum};
use qlfront::commands::Commands;
use tracing::info;

#[derive(Parser)]
#[clap(name = "qlfront", version, about = "Parse statements and query system tables")]
struct Cli {
    /// Log verbosity, repeat for more (-v info, -vv debug, -vvv trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for logs.
    #[clap(long, value_enum)]
    log_mode: Option<LoggingMode>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoggingMode {
    Pretty,
    Json,
    Compact,
}

impl From<LoggingMode> for logutil::LoggingMode {
    fn from(mode: LoggingMode) -> Self {
        match mode {
            LoggingMode::Pretty => logutil::LoggingMode::Pretty,
            LoggingMode::Json => logutil::LoggingMode::Json,
            LoggingMode::Compact => logutil::LoggingMode::Compact,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = cli.log_mode.map(logutil::LoggingMode::from).unwrap_or_default();
    logutil::init(cli.verbose, mode);

    info!(version = env!("CARGO_PKG_VERSION"), "starting...");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli.command.run(&mut out)
}
