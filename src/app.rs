//! Service construction and lifecycle: builds the storage, collaborator
//! clients, scanner and executor once at startup, spawns the periodic
//! tasks, and serves the API until interrupted.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::api::ws::{WalletUpdate, WsEvent};
use crate::api::{self, AppState};
use crate::config::Config;
use crate::domain::arbitrage::OpportunityScanner;
use crate::domain::execution::TradeExecutor;
use crate::infrastructure::chain::{ChainClient, ChainExecutionService};
use crate::infrastructure::dex::{OneInchClient, QuoteSource, ZeroExClient};
use crate::infrastructure::MemStorage;

pub async fn run(cfg: Config) -> Result<()> {
    info!("Starting flasharb with {} configured networks", cfg.networks.len());

    let storage = Arc::new(MemStorage::new(&cfg.networks));
    let chain: Arc<dyn ChainExecutionService> = Arc::new(ChainClient::new(&cfg));
    let source_a: Arc<dyn QuoteSource> = Arc::new(OneInchClient::new(
        cfg.quotes.one_inch_key(),
        cfg.quotes.timeout_ms,
    ));
    let source_b: Arc<dyn QuoteSource> = Arc::new(ZeroExClient::new(
        cfg.quotes.zero_x_key(),
        cfg.quotes.timeout_ms,
    ));

    let scanner = Arc::new(OpportunityScanner::new(
        cfg.scanner.clone(),
        cfg.networks.clone(),
        source_a,
        source_b,
        storage.clone(),
    ));
    let executor = Arc::new(TradeExecutor::new(storage.clone(), chain.clone()));
    let (events, _) = broadcast::channel::<WsEvent>(256);

    let state = AppState {
        storage: storage.clone(),
        executor,
        chain: chain.clone(),
        scanner: scanner.clone(),
        events: events.clone(),
        networks: Arc::new(cfg.networks.clone()),
    };

    let scan_task = scanner.clone().spawn();
    spawn_network_refresh(state.clone(), cfg.broadcast.network_refresh_ms);
    spawn_broadcast_tick(state.clone(), cfg.broadcast.tick_ms);

    let app = api::router(state).layer(CorsLayer::permissive());
    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("bind {}", cfg.server.bind))?;
    info!("🎯 API server listening on {}", cfg.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scanner.clone()))
        .await
        .context("Server error")?;

    scan_task.abort();
    Ok(())
}

/// Refresh every network's status from the chain collaborator on a
/// fixed cadence so the scanner can skip dead networks.
fn spawn_network_refresh(state: AppState, refresh_ms: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(refresh_ms));
        loop {
            ticker.tick().await;
            for network in state.networks.iter() {
                let health = state.chain.network_health(&network.name).await;
                state
                    .storage
                    .upsert_network_status(&network.name, health)
                    .await;
            }
        }
    });
}

/// Push opportunities, stats, networks and wallet info to all
/// subscribers on a fixed cadence. Send errors just mean nobody is
/// listening right now.
fn spawn_broadcast_tick(state: AppState, tick_ms: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(tick_ms));
        loop {
            ticker.tick().await;
            let _ = state
                .events
                .send(WsEvent::Opportunities(state.storage.active_opportunities().await));
            let _ = state.events.send(WsEvent::Stats(state.storage.trade_stats().await));
            let _ = state
                .events
                .send(WsEvent::Networks(state.storage.network_statuses().await));
            let _ = state.events.send(WsEvent::Wallet(WalletUpdate {
                wallet_address: state.chain.wallet_address(),
            }));
        }
    });
}

async fn shutdown_signal(scanner: Arc<OpportunityScanner>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
    scanner.stop();
}
