//! REST handlers for the dashboard API.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::ws::{TradeExecutedEvent, WsEvent};
use super::AppState;
use crate::shared::errors::ExecuteError;
use crate::shared::types::SettingsPatch;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "scanning": state.scanner.is_scanning(),
    }))
}

pub async fn get_opportunities(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.active_opportunities().await)
}

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    pub limit: Option<usize>,
}

pub async fn get_trades(
    State(state): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> impl IntoResponse {
    Json(state.storage.trades(query.limit.unwrap_or(50)).await)
}

pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.trade_stats().await)
}

pub async fn get_networks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storage.network_statuses().await)
}

pub async fn get_wallet(State(state): State<AppState>) -> impl IntoResponse {
    let networks: Vec<_> = state
        .networks
        .iter()
        .map(|n| {
            json!({
                "network": n.name,
                "chainId": n.chain_id,
                "nativeCurrency": n.native_currency,
                "contractAddress": state.chain.contract_address(&n.name),
                "isDeployed": state.chain.is_deployed(&n.name),
            })
        })
        .collect();
    Json(json!({
        "walletAddress": state.chain.wallet_address(),
        "networks": networks,
    }))
}

/// Execute an opportunity by id. Business rejections (not found, profit
/// decayed, chain declined) come back as a structural 200 with
/// `success:false`; only unexpected faults are a 500.
pub async fn execute_arbitrage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.executor.execute(id).await {
        Ok(receipt) => {
            info!("Trade executed for opportunity {}", id);
            let _ = state.events.send(WsEvent::TradeExecuted(TradeExecutedEvent {
                opportunity_id: id,
                tx_hash: receipt.tx_hash.clone(),
            }));
            (
                StatusCode::OK,
                Json(json!({ "success": true, "txHash": receipt.tx_hash })),
            )
        }
        Err(ExecuteError::Internal(message)) => {
            error!("Internal error executing arbitrage: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Internal server error" })),
            )
        }
        Err(e) => (
            StatusCode::OK,
            Json(json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// Settings are created lazily with defaults on first read.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let settings = match state.storage.trading_settings(&user_id).await {
        Some(settings) => settings,
        None => {
            state
                .storage
                .update_trading_settings(&user_id, SettingsPatch::default())
                .await
        }
    };
    Json(settings)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let patch: SettingsPatch = match serde_json::from_value(body) {
        Ok(patch) => patch,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid settings data", "details": e.to_string() })),
            )
                .into_response();
        }
    };
    let updated = state.storage.update_trading_settings(&user_id, patch).await;
    Json(updated).into_response()
}
