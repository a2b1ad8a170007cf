mod singleton;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventide_server::config::ServerConfig;
use eventide_server::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "eventide-server", version, about = "Calendar event server")]
struct Args {
    /// Configuration file (defaults to ~/.config/eventide/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the configuration)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    // Only one instance may own the data file
    let _lock = match &config.data_file {
        Some(path) => Some(singleton::acquire_lock(path)?),
        None => None,
    };

    let state = AppState::from_config(&config)?;
    let app = eventide_server::app(state, &config);

    let addr = config.socket_addr()?;
    info!(%addr, prefix = %config.api_prefix, "eventide-server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
