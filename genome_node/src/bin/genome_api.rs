use anyhow::{Context, Result};
use clap::Parser;
use genome_node::api::start_api_server;
use genome_node::NodeConfig;
use log::info;
use std::path::PathBuf;

/// Genome API Arguments
#[derive(Parser)]
#[clap(name = "genome-api")]
#[clap(about = "Genome Node - sequence analysis and NFT minting API")]
struct Args {
    /// Path to node configuration file
    #[clap(long, default_value = "config/genome_node.yaml")]
    config_path: PathBuf,

    /// API port to listen on, overrides the configuration
    #[clap(long)]
    port: Option<u16>,

    /// Address to bind, overrides the configuration
    #[clap(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting Genome Node API...");
    info!("Config path: {:?}", args.config_path);

    let mut config = NodeConfig::load(Some(&args.config_path))
        .with_context(|| format!("loading configuration from {:?}", args.config_path))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    start_api_server(&config).await
}
