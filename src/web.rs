#![cfg(not(tarpaulin_include))]

use clap::Parser;
use gym_tracker::app;
use gym_tracker::config::{ServerConfig, parse_ttl};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Gym progress tracker REST server
///
/// Flags override the `GYM_TRACKER_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "gym-tracker", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Directory for users.json and workout logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Lifetime of access tokens in minutes
    #[arg(long)]
    token_ttl_minutes: Option<String>,
}

/// Main entry point for the web application
///
/// Reads the environment configuration, applies command line overrides and
/// runs the server until it is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;

    if let Some(addr) = args.addr {
        config.bind_addr = addr;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(ttl) = args.token_ttl_minutes {
        config.token_ttl_minutes = parse_ttl(&ttl)?;
    }

    app::run(config).await
}
