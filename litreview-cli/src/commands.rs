//! CLI subcommand handlers.

use crate::output::{ConsoleCallback, render_summary, report_document};
use crate::{Commands, ConfigAction};
use litreview_core::config::load_config;
use litreview_core::pipeline::ANALYSIS_TOP_N;
use litreview_core::{
    LitReviewConfig, LocalStages, PipelineOrchestrator, PipelineStages, RemoteStages,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Flags shared by every subcommand.
pub struct GlobalOptions {
    pub model: Option<String>,
    pub quiet: bool,
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace),
        Commands::Run {
            topic,
            challenge,
            output,
            remote,
            json,
        } => {
            let config = resolve_config(workspace, options)?;
            let run = RunOptions {
                challenge,
                output,
                remote,
                json,
                quiet: options.quiet,
            };
            handle_run(&topic, config, run).await
        }
        Commands::Serve { host, port } => {
            let mut config = resolve_config(workspace, options)?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            handle_serve(config).await
        }
        Commands::Challenge { topic, report } => {
            let config = resolve_config(workspace, options)?;
            handle_challenge(&topic, &report, config).await
        }
    }
}

/// Load layered configuration and apply CLI overrides.
fn resolve_config(workspace: &Path, options: &GlobalOptions) -> anyhow::Result<LitReviewConfig> {
    let mut config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(model) = &options.model {
        config.llm.model = model.clone();
    }
    Ok(config)
}

fn local_stages(config: &LitReviewConfig) -> anyhow::Result<Arc<dyn PipelineStages>> {
    let (arxiv, scholar) = litreview_sources::default_sources(&config.sources)?;
    Ok(Arc::new(LocalStages::new(
        arxiv,
        scholar,
        config.llm.clone(),
        config.pipeline.clone(),
    )))
}

struct RunOptions {
    challenge: bool,
    output: Option<PathBuf>,
    remote: Option<String>,
    json: bool,
    quiet: bool,
}

async fn handle_run(topic: &str, config: LitReviewConfig, opts: RunOptions) -> anyhow::Result<()> {
    let stages: Arc<dyn PipelineStages> = match &opts.remote {
        Some(url) => {
            info!(url = %url, "Using remote stage gateway");
            Arc::new(RemoteStages::new(url.as_str(), config.llm.request_timeout_secs)?)
        }
        None => local_stages(&config)?,
    };
    execute_run(stages, topic, &opts).await
}

/// Run the pipeline, then optionally critique it, and emit the results.
///
/// A failed critique is reported but the finished report is still written
/// and printed.
async fn execute_run(
    stages: Arc<dyn PipelineStages>,
    topic: &str,
    opts: &RunOptions,
) -> anyhow::Result<()> {
    let chatty = !opts.quiet && !opts.json;
    // JSON mode keeps stdout clean and the progress lines off.
    let callback = Arc::new(ConsoleCallback::new(!chatty));
    let orchestrator = PipelineOrchestrator::new(stages).with_callback(callback);

    orchestrator.run(topic).await?;
    if opts.challenge {
        if chatty {
            eprintln!("       challenging report...");
        }
        if let Err(e) = orchestrator.challenge().await {
            warn!(error = %e, "Challenge failed, keeping the report");
        }
    }

    let snapshot = orchestrator.snapshot();

    if let Some(ref path) = opts.output
        && let Some(ref report) = snapshot.run.report
    {
        std::fs::write(
            path,
            report_document(report, snapshot.run.critique.as_deref()),
        )?;
        if chatty {
            eprintln!("Report written to {}", path.display());
        }
    }

    if opts.json {
        let mut value = serde_json::to_value(&snapshot)?;
        value["confidence"] = serde_json::to_value(snapshot.confidence())?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render_summary(&snapshot, ANALYSIS_TOP_N));
    }
    Ok(())
}

async fn handle_serve(config: LitReviewConfig) -> anyhow::Result<()> {
    let stages = local_stages(&config)?;
    println!("Stage gateway listening on http://{}", config.gateway.bind_addr());

    tokio::select! {
        result = litreview_core::gateway::run(&config.gateway, stages) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down gateway");
        }
    }
    Ok(())
}

async fn handle_challenge(
    topic: &str,
    report_path: &Path,
    config: LitReviewConfig,
) -> anyhow::Result<()> {
    let report = std::fs::read_to_string(report_path).map_err(|e| {
        anyhow::anyhow!("Failed to read report {}: {}", report_path.display(), e)
    })?;
    let stages = local_stages(&config)?;
    let critique = stages.challenge(topic, &report).await?;
    println!("{}", critique.trim_end());
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".litreview");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&LitReviewConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(workspace), None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
