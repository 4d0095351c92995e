//! # kubeview
//!
//! Read-only Kubernetes visualization backend.
//!
//! ## Overview
//!
//! Every scrape request:
//!
//! 1. **Collects** pods, services, endpoints, volumes, claims, workloads,
//!    ingresses, config maps and secrets for one namespace (or all)
//! 2. **Sanitizes** the result: Helm release secrets are dropped, secret values
//!    replaced, and PEM certificates redacted from annotations and config maps
//! 3. **Aggregates** everything into one JSON document for the frontend
//!
//! ## Configuration
//!
//! See [`kubeview::config::ServerConfig`] for the environment variables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kubeview::cluster::{KubeReader, NamespaceSelector};
use kubeview::config::ServerConfig;
use kubeview::observability;
use kubeview::scrape::{ScrapeOptions, ScrapePipeline};
use kubeview::server::{start_server, AppState};
use kubeview::status::{HealthFlag, BUILD};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "kubeview", version, about = "Read-only Kubernetes visualization backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Listen port, overrides PORT
        #[arg(long)]
        port: Option<u16>,
        /// Namespace scope reported to the frontend, overrides NAMESPACE_SCOPE
        #[arg(long)]
        namespace_scope: Option<String>,
    },
    /// Print one sanitized snapshot to stdout and exit
    Scrape {
        /// Namespace to scrape, `*` for all namespaces
        #[arg(default_value = "*")]
        namespace: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::logging::init_tracing();

    // Required for rustls 0.23+ when no default provider is set via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let mut config = ServerConfig::from_env();

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        namespace_scope: None,
    }) {
        Command::Serve {
            port,
            namespace_scope,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(scope) = namespace_scope {
                config.namespace_scope = scope;
            }
            serve(config).await
        }
        Command::Scrape { namespace, pretty } => {
            scrape_once(&config, &NamespaceSelector::parse(&namespace), pretty).await
        }
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    info!("Starting kubeview v{}", BUILD.version);
    info!(
        "Build info: {}, {}",
        BUILD.build_info, BUILD.rust_version
    );
    info!(?config, "Loaded configuration");

    observability::metrics::register_metrics()?;

    let health = Arc::new(HealthFlag::default());
    let reader = KubeReader::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let pipeline = ScrapePipeline::new(reader, ScrapeOptions::from(&config));
    let state = AppState::new(pipeline, Arc::clone(&health), &config.namespace_scope);

    health.set(true);
    start_server(config.port, state).await?;
    health.set(false);

    info!("kubeview stopped");
    Ok(())
}

async fn scrape_once(
    config: &ServerConfig,
    selector: &NamespaceSelector,
    pretty: bool,
) -> Result<()> {
    let reader = KubeReader::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let pipeline = ScrapePipeline::new(reader, ScrapeOptions::from(config));
    let response = pipeline
        .run(selector)
        .await
        .with_context(|| format!("Scrape of namespace '{selector}' failed"))?;

    let mut stdout = std::io::stdout().lock();
    if pretty {
        let tree: serde_json::Value = serde_json::from_slice(response.body())?;
        serde_json::to_writer_pretty(&mut stdout, &tree)?;
    } else {
        stdout.write_all(response.body())?;
    }
    writeln!(stdout)?;
    Ok(())
}
