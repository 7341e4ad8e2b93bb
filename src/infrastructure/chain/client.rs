//! HTTP-backed chain execution client.
//!
//! Network health comes straight from each network's JSON-RPC endpoint
//! (`eth_blockNumber` / `eth_gasPrice`); profit estimation and trade
//! submission go through the per-network execution service endpoint.
//! Networks without a configured executor report as not deployed.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use super::{ChainExecutionService, CommitRequest};
use crate::config::{Config, NetworkCfg};
use crate::shared::types::NetworkHealth;

#[derive(Debug, Clone)]
struct NetworkEndpoints {
    rpc_url: String,
    executor_url: Option<String>,
    contract_address: Option<String>,
}

pub struct ChainClient {
    client: Client,
    networks: HashMap<String, NetworkEndpoints>,
    wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    #[serde(rename = "estimatedProfit")]
    estimated_profit: f64,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(rename = "txHash")]
    tx_hash: Option<String>,
    error: Option<String>,
}

impl ChainClient {
    pub fn new(cfg: &Config) -> Self {
        let networks = cfg
            .networks
            .iter()
            .map(|n: &NetworkCfg| {
                (
                    n.name.clone(),
                    NetworkEndpoints {
                        rpc_url: n.rpc_url.clone(),
                        executor_url: n.executor_url.clone(),
                        contract_address: n.contract_address.clone(),
                    },
                )
            })
            .collect();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            networks,
            wallet_address: cfg.wallet.address.clone(),
        }
    }

    async fn rpc_u64(&self, rpc_url: &str, method: &str) -> Result<u64> {
        let response: JsonRpcResponse = self
            .client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": [],
                "id": 1,
            }))
            .send()
            .await?
            .json()
            .await
            .with_context(|| format!("decode {} response", method))?;
        let hex = response
            .result
            .ok_or_else(|| anyhow!("{} returned no result", method))?;
        parse_hex_u64(&hex)
    }

    fn endpoints(&self, network: &str) -> Option<&NetworkEndpoints> {
        self.networks.get(network)
    }
}

/// Decode a 0x-prefixed hex quantity as returned by JSON-RPC.
fn parse_hex_u64(hex: &str) -> Result<u64> {
    let trimmed = hex.trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16).with_context(|| format!("invalid hex quantity: {hex}"))
}

#[async_trait]
impl ChainExecutionService for ChainClient {
    fn is_deployed(&self, network: &str) -> bool {
        self.endpoints(network)
            .map(|e| e.executor_url.is_some() && e.contract_address.is_some())
            .unwrap_or(false)
    }

    fn contract_address(&self, network: &str) -> Option<String> {
        self.endpoints(network)?.contract_address.clone()
    }

    fn wallet_address(&self) -> Option<String> {
        self.wallet_address.clone()
    }

    async fn estimate_profit(
        &self,
        network: &str,
        token_a: &str,
        token_b: &str,
        amount: f64,
        buy_dex: &str,
        sell_dex: &str,
    ) -> Result<f64> {
        let endpoints = self
            .endpoints(network)
            .ok_or_else(|| anyhow!("unknown network: {network}"))?;
        let executor = endpoints
            .executor_url
            .as_deref()
            .ok_or_else(|| anyhow!("no executor configured on {network}"))?;

        let response: EstimateResponse = self
            .client
            .post(format!("{executor}/estimate"))
            .json(&json!({
                "tokenA": token_a,
                "tokenB": token_b,
                "amount": amount,
                "buyDex": buy_dex,
                "sellDex": sell_dex,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("decode estimate response")?;
        Ok(response.estimated_profit)
    }

    async fn commit(&self, request: &CommitRequest) -> Result<String> {
        let endpoints = self
            .endpoints(&request.network)
            .ok_or_else(|| anyhow!("unknown network: {}", request.network))?;
        let executor = endpoints
            .executor_url
            .as_deref()
            .ok_or_else(|| anyhow!("no executor configured on {}", request.network))?;

        let response: ExecuteResponse = self
            .client
            .post(format!("{executor}/execute"))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("decode execute response")?;

        match (response.tx_hash, response.error) {
            (Some(tx_hash), _) => Ok(tx_hash),
            (None, Some(error)) => Err(anyhow!(error)),
            (None, None) => Err(anyhow!("executor returned neither tx hash nor error")),
        }
    }

    async fn network_health(&self, network: &str) -> NetworkHealth {
        let Some(endpoints) = self.endpoints(network) else {
            return NetworkHealth::offline();
        };
        let block = self.rpc_u64(&endpoints.rpc_url, "eth_blockNumber").await;
        let gas = self.rpc_u64(&endpoints.rpc_url, "eth_gasPrice").await;
        match (block, gas) {
            (Ok(block_number), Ok(gas_price)) => NetworkHealth {
                is_active: true,
                block_number,
                gas_price,
            },
            (block, gas) => {
                if let Err(e) = block.and(gas) {
                    warn!("Health probe failed for {}: {}", network, e);
                }
                NetworkHealth::offline()
            }
        }
    }
}
