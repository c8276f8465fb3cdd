//! `fj`: lowers class IR to JVM instructions.
//!
//! ```bash
//! # Lower a class and write Main.fjc next to it
//! fj lower Main.json
//!
//! # Lower on worker threads and print the listing
//! fj lower Main.json --parallel --listing
//!
//! # List an artifact written earlier
//! fj inspect Main.fjc
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use eyre::WrapErr;
use fj_cli::{
    commands::{self, InspectArgs, LowerArgs},
    config::FjConfig,
    diagnostics::{render_cli_error, setup_error_reporting},
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "fj",
    version = env!("CARGO_PKG_VERSION"),
    about = "Lowers typed class IR to JVM instructions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a class from its JSON IR and write an artifact
    Lower(LowerArgs),

    /// Print the listing of a lowered artifact
    Inspect(InspectArgs),
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    setup_error_reporting().wrap_err("failed to install the error handler")?;
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format);

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .wrap_err_with(|| format!("cannot enter {}", dir.display()))?;
    }

    let config = FjConfig::load(cli.config.as_deref()).wrap_err("failed to load configuration")?;

    let result = match cli.command {
        Commands::Lower(args) => commands::lower_command(args, &config).map(|summary| {
            if let Some(listing) = &summary.listing {
                print!("{}", listing);
            }
            if !summary.failed.is_empty() {
                error!(
                    "{} method(s) were not lowered: {}",
                    summary.failed.len(),
                    summary.failed.join(", ")
                );
            }
        }),
        Commands::Inspect(args) => commands::inspect_command(args).map(|listing| {
            print!("{}", listing);
        }),
    };

    match result {
        Ok(()) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            if !render_cli_error(&e) {
                error!("{}", e);
            }
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, log_level: Option<LogLevel>, log_format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }
}
