//! Jilo agent binary

use clap::Parser;
use jilo_agent::config::{Config, DEFAULT_CONFIG_PATH};
use jilo_agent::server;
use log::{error, info};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Remote agent for Jilo Web with an HTTP API")]
struct Cli {
    /// Agent config file
    #[arg(short, long, env = "JILO_AGENT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[actix_web::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Jilo agent v{} loading {}", env!("CARGO_PKG_VERSION"), cli.config.display());

    let config = Config::load(&cli.config).with_env_overrides();
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server::run(config).await {
        error!("Could not start the agent: {}", e);
        std::process::exit(1);
    }
}
