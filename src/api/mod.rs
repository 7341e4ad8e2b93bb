pub mod routes;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::NetworkCfg;
use crate::domain::arbitrage::OpportunityScanner;
use crate::domain::execution::TradeExecutor;
use crate::infrastructure::chain::ChainExecutionService;
use crate::infrastructure::MemStorage;

pub use ws::WsEvent;

/// Application state shared across all handlers and periodic tasks.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<MemStorage>,
    pub executor: Arc<TradeExecutor>,
    pub chain: Arc<dyn ChainExecutionService>,
    pub scanner: Arc<OpportunityScanner>,
    pub events: broadcast::Sender<WsEvent>,
    pub networks: Arc<Vec<NetworkCfg>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/opportunities", get(routes::get_opportunities))
        .route("/api/trades", get(routes::get_trades))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/networks", get(routes::get_networks))
        .route("/api/wallet", get(routes::get_wallet))
        .route("/api/execute-arbitrage/:id", post(routes::execute_arbitrage))
        .route(
            "/api/settings/:user_id",
            get(routes::get_settings).post(routes::update_settings),
        )
        .route("/ws", get(ws::websocket_handler))
        .with_state(state)
}
