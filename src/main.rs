use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use bucket_links::{
    cli::{self, Cli},
    config::{ClientConfig, Config},
    create_router,
    storage::S3Store,
    utils::init_logger,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.is_serve() {
        init_logger("bucket_links=debug,tower_http=debug,axum=debug");
    } else {
        init_logger("bucket_links=warn");
    }

    if !cli.is_serve() {
        let client_config = ClientConfig::from_env()?;
        return cli::run_client(cli.command, cli.api_base, &client_config).await;
    }

    // Load configuration
    let config = Config::from_env()?;

    config.storage.validate()?;
    info!("Configuration loaded: {:?} {:?}", config.server, config.storage);

    let store = S3Store::new(&config.storage)
        .map_err(|e| anyhow::anyhow!("Failed to initialise storage: {}", e))?;

    let state = AppState::new(Arc::new(store), config.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
