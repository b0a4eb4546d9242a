use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use instaflow_core::config::AppConfig;
use instaflow_core::traits::ActionProvider;
use instaflow_core::types::Flow;
use instaflow_engine::{match_flows, validate_flow, ActionRegistry, FlowExecutor};
use instaflow_providers::{flatten_webhook, DryRunProvider, InstagramClient, ReqwestHttpClient};

#[derive(Parser)]
#[command(name = "instaflow", version, about = "Run Instagram automation flows")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "instaflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one flow against a flattened event payload
    Run {
        /// Flow document (JSON)
        #[arg(long)]
        flow: PathBuf,
        /// Event payload (JSON)
        #[arg(long)]
        event: PathBuf,
        /// Log Instagram calls instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Route a raw webhook body to every matching flow in a directory
    Route {
        /// Directory of flow documents (*.json)
        #[arg(long)]
        flows: PathBuf,
        /// Webhook body (JSON)
        #[arg(long)]
        webhook: PathBuf,
        /// Log Instagram calls instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a flow document for structural errors
    Validate {
        #[arg(long)]
        flow: PathBuf,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("instaflow=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Validate { flow } => {
            let flow = read_flow(&flow)?;
            validate_flow(&flow, &ActionRegistry::with_builtins())?;
            println!("Flow '{}' is valid ({} nodes, {} edges)", flow.id, flow.nodes.len(), flow.edges.len());
        }
        Commands::Run { flow, event, dry_run } => {
            let flow = read_flow(&flow)?;
            let event = read_json(&event)?;
            let executor = build_executor(&config, dry_run)?;

            if let Err(e) = validate_flow(&flow, executor.registry()) {
                warn!(flow_id = %flow.id, error = %e, "Flow failed validation");
            }

            let result = executor.execute(&flow, event).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                anyhow::bail!("flow '{}' failed", flow.id);
            }
        }
        Commands::Route { flows, webhook, dry_run } => {
            let flows = read_flow_dir(&flows)?;
            let body = read_json(&webhook)?;
            let executor = Arc::new(build_executor(&config, dry_run)?);

            let events = flatten_webhook(&body);
            info!(events = events.len(), flows = flows.len(), "Routing webhook");

            let mut handles = Vec::new();
            for event in events {
                for flow in match_flows(&flows, &event) {
                    let flow = Arc::new(flow.clone());
                    let executor = executor.clone();
                    let data = event.data.clone();
                    let event_type = event.event_type;
                    handles.push(tokio::spawn(async move {
                        let result = executor.execute(&flow, data).await;
                        json!({
                            "flowId": flow.id,
                            "eventType": event_type,
                            "result": result,
                        })
                    }));
                }
            }

            if handles.is_empty() {
                info!("No flows matched");
            }

            let mut runs = Vec::new();
            for joined in join_all(handles).await {
                match joined {
                    Ok(run) => runs.push(run),
                    Err(e) => error!(error = %e, "Flow task panicked"),
                }
            }
            println!("{}", serde_json::to_string_pretty(&runs)?);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        info!(path = %path.display(), "Loading config");
        return Ok(AppConfig::load(path)?);
    }
    warn!(path = %path.display(), "No config file found, using defaults");
    Ok(AppConfig::default())
}

fn build_executor(config: &AppConfig, dry_run: bool) -> anyhow::Result<FlowExecutor> {
    let provider: Arc<dyn ActionProvider> = if dry_run {
        Arc::new(DryRunProvider)
    } else {
        let instagram = config
            .instagram()
            .context("set [instagram] in the config or pass --dry-run")?;
        Arc::new(InstagramClient::new(instagram)?)
    };
    let http = Arc::new(ReqwestHttpClient::new(&config.http)?);

    Ok(FlowExecutor::new(provider, http).with_config(config.engine.clone()))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn read_flow(path: &Path) -> anyhow::Result<Flow> {
    serde_json::from_value(read_json(path)?).with_context(|| format!("decoding flow {}", path.display()))
}

fn read_flow_dir(dir: &Path) -> anyhow::Result<Vec<Flow>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut flows = Vec::with_capacity(paths.len());
    for path in paths {
        match read_flow(&path) {
            Ok(flow) => flows.push(flow),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable flow"),
        }
    }
    Ok(flows)
}
