//! The commit protocol: revalidate a claimed opportunity against a live
//! profit estimate, then submit the trade and settle the ledger.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::execution::{NewTrade, TradeStatus};
use crate::infrastructure::chain::{ChainExecutionService, CommitRequest};
use crate::infrastructure::MemStorage;
use crate::shared::errors::ExecuteError;

/// The live estimate may decay to 80% of the advertised profit before
/// the trade is refused.
const PROFIT_DECAY_TOLERANCE: f64 = 0.8;

/// Outcome of a successfully committed trade.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub opportunity_id: Uuid,
    pub trade_id: Uuid,
    pub tx_hash: String,
}

pub struct TradeExecutor {
    storage: Arc<MemStorage>,
    chain: Arc<dyn ChainExecutionService>,
}

impl TradeExecutor {
    pub fn new(storage: Arc<MemStorage>, chain: Arc<dyn ChainExecutionService>) -> Self {
        Self { storage, chain }
    }

    /// Execute one opportunity end to end.
    ///
    /// The opportunity is claimed atomically up front, so concurrent
    /// calls on the same id cannot both reach the commit step; the loser
    /// sees `NotFound`. Pre-commit validation failures release the claim
    /// so a later call can retry from scratch. Once a pending trade has
    /// been recorded, every exit leaves it in a terminal status and the
    /// opportunity inactive, in that order.
    pub async fn execute(&self, id: Uuid) -> Result<ExecutionReceipt, ExecuteError> {
        let opportunity = self
            .storage
            .claim_opportunity(id)
            .await
            .ok_or(ExecuteError::NotFound)?;

        if !self.chain.is_deployed(&opportunity.network) {
            self.storage.release_claim(id).await;
            return Err(ExecuteError::NetworkUnavailable(opportunity.network));
        }

        // Live re-quote; the cached profit from the scan is only used as
        // the baseline the fresh estimate is measured against.
        let estimated = match self
            .chain
            .estimate_profit(
                &opportunity.network,
                &opportunity.token_a,
                &opportunity.token_b,
                opportunity.min_capital,
                &opportunity.dex_a,
                &opportunity.dex_b,
            )
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Profit estimation failed on {}: {}", opportunity.network, e);
                0.0
            }
        };

        let threshold = opportunity.profit_amount * PROFIT_DECAY_TOLERANCE;
        if estimated < threshold {
            self.storage.release_claim(id).await;
            return Err(ExecuteError::ProfitDecayed {
                estimated,
                threshold,
            });
        }

        let trade = self
            .storage
            .record_trade(NewTrade {
                opportunity_id: Some(opportunity.id),
                token_pair: opportunity.token_pair(),
                profit_amount: opportunity.profit_amount,
                gas_used: opportunity.gas_estimate,
                gas_cost: 0.0,
                network: opportunity.network.clone(),
                details: Some(json!({
                    "dexA": opportunity.dex_a,
                    "dexB": opportunity.dex_b,
                    "priceA": opportunity.price_a,
                    "priceB": opportunity.price_b,
                    "contractAddress": self.chain.contract_address(&opportunity.network),
                    "estimatedProfit": estimated,
                })),
            })
            .await;

        let request = CommitRequest {
            network: opportunity.network.clone(),
            token_a: opportunity.token_a.clone(),
            token_b: opportunity.token_b.clone(),
            amount: opportunity.min_capital,
            buy_dex: opportunity.dex_a.clone(),
            sell_dex: opportunity.dex_b.clone(),
            // On-chain guard: the contract reverts below this profit
            min_profit: threshold,
        };

        match self.chain.commit(&request).await {
            Ok(tx_hash) => {
                // Terminal status first, then the inactive flip, so no
                // reader sees an active opportunity with a settled trade.
                self.storage
                    .set_trade_status(trade.id, TradeStatus::Success, Some(tx_hash.clone()))
                    .await;
                self.storage.set_opportunity_active(id, false).await;
                info!("✅ Arbitrage executed successfully: {}", tx_hash);
                Ok(ExecutionReceipt {
                    opportunity_id: id,
                    trade_id: trade.id,
                    tx_hash,
                })
            }
            Err(e) => {
                self.storage
                    .set_trade_status(trade.id, TradeStatus::Failed, None)
                    .await;
                self.storage.set_opportunity_active(id, false).await;
                error!("Arbitrage execution failed: {}", e);
                Err(ExecuteError::from_commit_failure(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkCfg;
    use crate::domain::arbitrage::NewOpportunity;
    use crate::shared::types::NetworkHealth;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockChain {
        deployed: bool,
        estimate: Result<f64, String>,
        commit: Result<String, String>,
        commits: AtomicUsize,
    }

    impl MockChain {
        fn healthy(estimate: f64) -> Self {
            Self {
                deployed: true,
                estimate: Ok(estimate),
                commit: Ok("0xabc123".to_string()),
                commits: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainExecutionService for MockChain {
        fn is_deployed(&self, _network: &str) -> bool {
            self.deployed
        }

        fn contract_address(&self, _network: &str) -> Option<String> {
            Some("0xcontract".to_string())
        }

        fn wallet_address(&self) -> Option<String> {
            Some("0xwallet".to_string())
        }

        async fn estimate_profit(
            &self,
            _network: &str,
            _token_a: &str,
            _token_b: &str,
            _amount: f64,
            _buy_dex: &str,
            _sell_dex: &str,
        ) -> Result<f64> {
            self.estimate.clone().map_err(|e| anyhow!(e))
        }

        async fn commit(&self, _request: &CommitRequest) -> Result<String> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            self.commit.clone().map_err(|e| anyhow!(e))
        }

        async fn network_health(&self, _network: &str) -> NetworkHealth {
            NetworkHealth::offline()
        }
    }

    fn storage() -> Arc<MemStorage> {
        Arc::new(MemStorage::new(&[NetworkCfg {
            name: "ethereum".to_string(),
            chain_id: 1,
            rpc_url: "http://localhost:8545".to_string(),
            native_currency: "ETH".to_string(),
            executor_url: None,
            contract_address: None,
            pairs: vec![],
        }]))
    }

    /// profit_amount 200, so the decay threshold is 160.
    async fn seed_opportunity(storage: &MemStorage) -> Uuid {
        storage
            .create_opportunity(NewOpportunity {
                network: "ethereum".to_string(),
                token_a: "0xaaa".to_string(),
                token_b: "0xbbb".to_string(),
                symbol_a: "ETH".to_string(),
                symbol_b: "USDC".to_string(),
                dex_a: "1inch".to_string(),
                dex_b: "0x Protocol".to_string(),
                price_a: 100.0,
                price_b: 102.0,
                profit_amount: 200.0,
                profit_percent: 1.98,
                min_capital: 10000.0,
                gas_estimate: 200000,
                ttl: Duration::seconds(30),
            })
            .await
            .id
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let storage = storage();
        let executor = TradeExecutor::new(storage, Arc::new(MockChain::healthy(200.0)));
        let result = executor.execute(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ExecuteError::NotFound)));
    }

    #[tokio::test]
    async fn test_undeployed_network_is_unavailable_and_releases_claim() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let chain = MockChain {
            deployed: false,
            ..MockChain::healthy(200.0)
        };
        let executor = TradeExecutor::new(storage.clone(), Arc::new(chain));

        let result = executor.execute(id).await;
        assert!(matches!(result, Err(ExecuteError::NetworkUnavailable(_))));
        // Claim was released, a retry can still take it
        assert!(storage.claim_opportunity(id).await.is_some());
        assert!(storage.trades(50).await.is_empty());
    }

    #[tokio::test]
    async fn test_decay_boundary_exactly_eighty_percent_passes() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let executor = TradeExecutor::new(storage.clone(), Arc::new(MockChain::healthy(160.0)));

        let receipt = executor.execute(id).await.unwrap();
        assert_eq!(receipt.tx_hash, "0xabc123");
    }

    #[tokio::test]
    async fn test_decayed_estimate_fails_and_releases_claim() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let executor = TradeExecutor::new(storage.clone(), Arc::new(MockChain::healthy(159.99)));

        match executor.execute(id).await {
            Err(ExecuteError::ProfitDecayed {
                estimated,
                threshold,
            }) => {
                assert_eq!(estimated, 159.99);
                assert_eq!(threshold, 160.0);
            }
            other => panic!("expected ProfitDecayed, got {:?}", other),
        }
        // No trade was recorded and the opportunity stays retryable
        assert!(storage.trades(50).await.is_empty());
        assert!(storage.claim_opportunity(id).await.is_some());
    }

    #[tokio::test]
    async fn test_estimate_error_counts_as_zero() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let chain = MockChain {
            estimate: Err("estimator offline".to_string()),
            ..MockChain::healthy(0.0)
        };
        let executor = TradeExecutor::new(storage, Arc::new(chain));

        assert!(matches!(
            executor.execute(id).await,
            Err(ExecuteError::ProfitDecayed { .. })
        ));
    }

    #[tokio::test]
    async fn test_success_settles_trade_then_deactivates() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let executor = TradeExecutor::new(storage.clone(), Arc::new(MockChain::healthy(200.0)));

        let receipt = executor.execute(id).await.unwrap();

        let trades = storage.trades(50).await;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, receipt.trade_id);
        assert_eq!(trades[0].status, TradeStatus::Success);
        assert_eq!(trades[0].tx_hash.as_deref(), Some("0xabc123"));
        assert_eq!(trades[0].opportunity_id, Some(id));
        assert!(storage.active_opportunities().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_revert_is_rejection_with_terminal_trade() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let chain = MockChain {
            commit: Err("execution reverted: insufficient profit".to_string()),
            ..MockChain::healthy(200.0)
        };
        let executor = TradeExecutor::new(storage.clone(), Arc::new(chain));

        let result = executor.execute(id).await;
        assert!(matches!(result, Err(ExecuteError::Rejected(_))));

        let trades = storage.trades(50).await;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].status, TradeStatus::Failed);
        assert!(trades[0].tx_hash.is_none());
        // A commit was attempted, so the opportunity is finished
        assert!(storage.active_opportunities().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_generic_failure_is_execution_error() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let chain = MockChain {
            commit: Err("nonce too low".to_string()),
            ..MockChain::healthy(200.0)
        };
        let executor = TradeExecutor::new(storage.clone(), Arc::new(chain));

        assert!(matches!(
            executor.execute(id).await,
            Err(ExecuteError::Execution(_))
        ));
        assert_eq!(storage.trades(50).await[0].status, TradeStatus::Failed);
    }

    #[tokio::test]
    async fn test_concurrent_execution_commits_at_most_once() {
        let storage = storage();
        let id = seed_opportunity(&storage).await;
        let chain = Arc::new(MockChain::healthy(200.0));
        let executor = Arc::new(TradeExecutor::new(storage.clone(), chain.clone()));

        let (a, b) = tokio::join!(
            {
                let executor = executor.clone();
                tokio::spawn(async move { executor.execute(id).await })
            },
            {
                let executor = executor.clone();
                tokio::spawn(async move { executor.execute(id).await })
            }
        );
        let results = [a.unwrap(), b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let not_found = results
            .iter()
            .filter(|r| matches!(r, Err(ExecuteError::NotFound)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(not_found, 1);
        assert_eq!(chain.commits.load(Ordering::SeqCst), 1);
        assert_eq!(storage.trades(50).await.len(), 1);
    }
}
