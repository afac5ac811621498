//! registry-node binary
//!
//! Loads configuration, wires the resolution service, and serves the
//! REST API until terminated.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use registry_node::config::NodeConfig;
use registry_node::registry::RegistryService;
use registry_node::rpc::rest::RestApiServer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("registry_node=info")),
        )
        .init();

    // Optional config file path as the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut config = match &config_path {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    config.apply_env_overrides()?;

    info!(
        "starting registry-node v{} (upstream: {})",
        env!("CARGO_PKG_VERSION"),
        config.upstream.base_url
    );

    let service = Arc::new(RegistryService::new(&config)?);
    let server = RestApiServer::new(config.server.listen_addr, service);
    server.start().await
}
