// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gaslift_server::api;
use gaslift_server::chain::{ChainClient, ChainRpc, GasPayer};
use gaslift_server::config::RelayConfig;
use gaslift_server::gas::GasPolicy;
use gaslift_server::oracle::PriceOracle;
use gaslift_server::plugins::{PluginRegistry, TransferPlugin};
use gaslift_server::relay::{RelayEngine, RelayTiming};
use gaslift_server::security::SecurityStore;
use gaslift_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_env()?;

    let chain = Arc::new(ChainClient::new(&config.rpc_url)?);
    let chain_id = match config.chain_id {
        Some(id) => id,
        // No override configured: ask the node.
        None => chain.chain_id().await?,
    };

    let security = Arc::new(SecurityStore::open(&config.security.config_path)?);

    let oracle = config
        .oracle
        .enabled
        .then(|| Arc::new(PriceOracle::new(chain_id, config.oracle.cache_ttl)));

    let gas_payer = Arc::new(GasPayer::new(
        &config.rpc_url,
        config.gas_payer_contract_address,
    )?);

    let chain_rpc: Arc<dyn ChainRpc> = chain.clone();
    let engine = Arc::new(RelayEngine::new(
        chain_rpc.clone(),
        gas_payer,
        GasPolicy::new(config.gas.clone()),
        RelayTiming::default(),
        oracle,
    ));

    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(TransferPlugin))?;
    registry.initialize_all(&engine)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(security.clone().watch(shutdown.clone()));

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(
        Arc::new(config),
        chain_id,
        chain_rpc,
        security,
        Arc::new(registry),
        engine,
    );
    let app = api::router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!(%addr, chain_id, "gaslift relay listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    // Stop the config watcher on the way out.
    shutdown.cancel();
    Ok(())
}

/// Resolve on SIGINT or SIGTERM and trigger the shared shutdown token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
    token.cancel();
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
