//! Real-time fan-out to WebSocket subscribers.
//!
//! Delivery is at-most-once and best-effort: events flow through a
//! `tokio::sync::broadcast` channel, and a subscriber that lags or
//! disconnects is dropped without retry or buffering.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use super::AppState;
use crate::domain::arbitrage::Opportunity;
use crate::domain::execution::{Trade, TradeStats};
use crate::shared::types::NetworkStatus;

/// One-time payload pushed to a subscriber right after connecting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialSnapshot {
    pub opportunities: Vec<Opportunity>,
    pub recent_trades: Vec<Trade>,
    pub stats: TradeStats,
    pub networks: Vec<NetworkStatus>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdate {
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExecutedEvent {
    pub opportunity_id: Uuid,
    pub tx_hash: String,
}

/// Everything the server ever pushes, tagged the way the dashboard
/// expects: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WsEvent {
    Initial(InitialSnapshot),
    Opportunities(Vec<Opportunity>),
    Stats(TradeStats),
    Networks(Vec<NetworkStatus>),
    Wallet(WalletUpdate),
    TradeExecuted(TradeExecutedEvent),
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.events.subscribe();
    debug!("Client connected to WebSocket");

    let snapshot = InitialSnapshot {
        opportunities: state.storage.active_opportunities().await,
        recent_trades: state.storage.trades(10).await,
        stats: state.storage.trade_stats().await,
        networks: state.storage.network_statuses().await,
        wallet_address: state.chain.wallet_address(),
    };
    if send_event(&mut socket, &WsEvent::Initial(snapshot))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            event = next_event(&mut rx) => {
                match event {
                    Some(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    debug!("Client disconnected from WebSocket");
}

/// Next event for one subscriber. A subscriber that fell behind the
/// channel capacity skips ahead to the oldest retained event rather
/// than stalling; `None` means the channel itself is gone.
async fn next_event(rx: &mut broadcast::Receiver<WsEvent>) -> Option<WsEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("WebSocket subscriber lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &WsEvent) -> Result<(), axum::Error> {
    let message = serde_json::to_string(event).unwrap_or_else(|e| {
        warn!("Failed to serialize ws event: {}", e);
        "{}".to_string()
    });
    socket.send(Message::Text(message)).await
}
