//! CyberSOC CLI - serves the mock SOC dashboard.
//!
//! Provides the `serve` command plus database and configuration helpers.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// CyberSOC: a mock security operations center dashboard
#[derive(Parser, Debug)]
#[command(name = "cybersoc", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the dashboard server and the background log generator
    Serve(ServeArgs),
    /// Create the database tables
    InitDb {
        /// Database file (overrides `storage.path`)
        #[arg(short, long)]
        database: Option<PathBuf>,
        /// Insert sample logs into an empty database
        #[arg(long)]
        seed: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
    /// Database file (overrides `storage.path`)
    #[arg(short, long)]
    database: Option<PathBuf>,
    /// Do not start the background log generator
    #[arg(long)]
    no_generator: bool,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration to the user config path
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "cybersoc", "cybersoc")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "cybersoc.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config_file = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => commands::handle_serve(args, config_file, cli.quiet).await,
        Commands::InitDb { database, seed } => {
            commands::handle_init_db(database, seed, config_file).await
        }
        Commands::Config { action } => commands::handle_config(action, config_file),
    }
}
