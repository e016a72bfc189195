//! SG Status Relay entry point.
//!
//! This binary is the composition root for the whole system:
//!
//! 1. **Parse configuration**: layer defaults, `config.json`, and environment
//!    variables through [`config::RelayConfig`], apply command-line overrides,
//!    then validate.
//! 2. **Wire observability**: install the JSON `tracing` subscriber and, when
//!    configured, the OpenTelemetry OTLP exporter ([`telemetry`]).
//! 3. **Construct infrastructure**: load the status mapping, authenticate the
//!    [`tracker::ShotGridClient`], and inject it into a
//!    [`handlers::Propagator`].
//! 4. **Serve**: bind the webhook listener until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use handlers::Propagator;
use listener::{ListenerState, SignatureVerifier};
use tracing::{error, info};
use tracker::{ShotGridClient, ShotGridConfig};

mod config;
mod telemetry;

use config::{load_mapping, RelayConfig, DEFAULT_CONFIG_PATH};

/// Relays ShotGrid status changes from Versions to Tasks to Shots.
#[derive(Debug, Parser)]
#[command(name = "sg-relay", version, about)]
struct Cli {
    /// JSON configuration file. Missing files are skipped.
    #[arg(long, env = "SG_RELAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Status mapping YAML file (overrides `mapping_path`).
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Listen address (overrides `bind_addr`).
    #[arg(long)]
    bind: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, mut config: RelayConfig) -> RelayConfig {
        if let Some(mapping) = &self.mapping {
            config.mapping_path = mapping.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_addr = bind.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli.apply_overrides(
        RelayConfig::load(&cli.config)
            .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?,
    );
    config.validate().context("invalid configuration")?;
    let addr = config.socket_addr()?;

    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;
    info!(
        shotgrid_host = %config.shotgrid_host(),
        script_name = %config.shotgrid_script_name,
        otlp = telemetry.exports_spans(),
        "Starting SG status relay"
    );

    let result = run(config, addr).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Relay stopped with an error");
    }
    telemetry.shutdown();
    result
}

async fn run(config: RelayConfig, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let mapping = load_mapping(&config.mapping_path)
        .with_context(|| format!("failed to load status mapping from {}", config.mapping_path.display()))?;
    info!(
        path = %config.mapping_path.display(),
        version_to_task = ?mapping.version_to_task,
        task_to_shot = ?mapping.task_to_shot,
        "Loaded status mappings"
    );

    let client = ShotGridClient::new(ShotGridConfig {
        base_url: config.shotgrid_url.clone(),
        script_name: config.shotgrid_script_name.clone(),
        api_key: config.shotgrid_api_key.clone(),
        timeout: config.request_timeout(),
    })?;
    info!(base_url = %client.base_url(), "Initializing ShotGrid connection");
    client
        .connect()
        .await
        .context("failed to authenticate with ShotGrid")?;
    info!("ShotGrid connection established");

    let propagator = Propagator::new(Arc::new(client), Arc::new(mapping));
    let verifier = SignatureVerifier::new(config.secret_token.as_bytes())?;

    listener::serve(addr, ListenerState::new(propagator, verifier)).await?;
    Ok(())
}
