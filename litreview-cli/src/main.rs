//! litreview CLI: run the literature-review pipeline from a terminal.
//!
//! Drives a full run locally or against a remote stage gateway, serves the
//! gateway, or critiques an existing report.

mod commands;
mod output;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// litreview: retrieve, rank, analyze and report on research literature
#[derive(Parser, Debug)]
#[command(name = "litreview", version, about, long_about = None)]
struct Cli {
    /// LLM model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline for a research topic
    Run {
        /// Research topic
        topic: String,
        /// Critique the generated report afterwards
        #[arg(long)]
        challenge: bool,
        /// Write the report (and critique) to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Base URL of a running stage gateway to use instead of local stages
        #[arg(long)]
        remote: Option<String>,
        /// Print the final run snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the stage gateway over HTTP
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Critique an existing report
    Challenge {
        /// Research topic the report covers
        topic: String,
        /// Markdown report file
        #[arg(short, long)]
        report: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default workspace configuration file
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "litreview", "litreview")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "litreview.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let options = commands::GlobalOptions {
        model: cli.model,
        quiet: cli.quiet,
    };
    commands::handle_command(cli.command, &workspace, &options).await
}
