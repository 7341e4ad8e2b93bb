pub mod client;

use anyhow::Result;
use async_trait::async_trait;

use crate::shared::types::NetworkHealth;

pub use client::ChainClient;

/// Parameters of one arbitrage commit: buy on `buy_dex`, sell on
/// `sell_dex`, and abort on-chain unless at least `min_profit` is realized.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub network: String,
    pub token_a: String,
    pub token_b: String,
    pub amount: f64,
    pub buy_dex: String,
    pub sell_dex: String,
    pub min_profit: f64,
}

/// Boundary to the on-chain execution collaborator. Estimate and commit
/// both perform live network I/O and can be slow; callers must not hold
/// store locks across them.
#[async_trait]
pub trait ChainExecutionService: Send + Sync {
    /// Whether an execution endpoint is deployed and reachable on the
    /// given network.
    fn is_deployed(&self, network: &str) -> bool;

    fn contract_address(&self, network: &str) -> Option<String>;

    fn wallet_address(&self) -> Option<String>;

    /// Live re-quote of the expected profit for the given route.
    async fn estimate_profit(
        &self,
        network: &str,
        token_a: &str,
        token_b: &str,
        amount: f64,
        buy_dex: &str,
        sell_dex: &str,
    ) -> Result<f64>;

    /// Submit the trade and block until the external system confirms the
    /// outcome. Returns the transaction hash.
    async fn commit(&self, request: &CommitRequest) -> Result<String>;

    /// Liveness/height/gas probe for one network.
    async fn network_health(&self, network: &str) -> NetworkHealth;
}
