//! Volatile in-process storage for opportunities, trades, settings and
//! network statuses.
//!
//! All maps sit behind `tokio::sync::RwLock`; every mutation completes
//! under a single lock acquisition so concurrent readers never observe a
//! partial write, and no lock is ever held across I/O.

use chrono::{Local, TimeZone, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::NetworkCfg;
use crate::domain::arbitrage::{NewOpportunity, Opportunity};
use crate::domain::execution::{NewTrade, Trade, TradeStats, TradeStatus};
use crate::shared::types::{NetworkHealth, NetworkStatus, SettingsPatch, TradingSettings};

/// Stored opportunity plus the exclusive-execution marker. The claim
/// flag never leaves the store; it exists so at most one execution
/// attempt per opportunity can reach the commit step.
#[derive(Debug, Clone)]
struct OpportunitySlot {
    opportunity: Opportunity,
    claimed: bool,
}

pub struct MemStorage {
    opportunities: RwLock<HashMap<Uuid, OpportunitySlot>>,
    trades: RwLock<HashMap<Uuid, Trade>>,
    settings: RwLock<HashMap<String, TradingSettings>>,
    network_statuses: RwLock<HashMap<String, NetworkStatus>>,
}

impl MemStorage {
    /// Create storage with a seeded status row per configured network.
    pub fn new(networks: &[NetworkCfg]) -> Self {
        let mut statuses = HashMap::new();
        for network in networks {
            let gas_price = if network.name == "ethereum" {
                42_000_000_000
            } else {
                1_000_000_000
            };
            statuses.insert(
                network.name.clone(),
                NetworkStatus {
                    id: Uuid::new_v4(),
                    network: network.name.clone(),
                    is_active: true,
                    block_number: 0,
                    gas_price,
                    last_update: Utc::now(),
                },
            );
        }
        Self {
            opportunities: RwLock::new(HashMap::new()),
            trades: RwLock::new(HashMap::new()),
            settings: RwLock::new(HashMap::new()),
            network_statuses: RwLock::new(statuses),
        }
    }

    // --- Opportunities ---

    /// All opportunities that are active and unexpired, best profit first.
    pub async fn active_opportunities(&self) -> Vec<Opportunity> {
        let now = Utc::now();
        let map = self.opportunities.read().await;
        let mut active: Vec<Opportunity> = map
            .values()
            .filter(|slot| slot.opportunity.is_live(now))
            .map(|slot| slot.opportunity.clone())
            .collect();
        active.sort_by(|a, b| {
            b.profit_amount
                .partial_cmp(&a.profit_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        active
    }

    pub async fn create_opportunity(&self, new: NewOpportunity) -> Opportunity {
        let opportunity = new.into_opportunity(Uuid::new_v4(), Utc::now());
        let mut map = self.opportunities.write().await;
        map.insert(
            opportunity.id,
            OpportunitySlot {
                opportunity: opportunity.clone(),
                claimed: false,
            },
        );
        opportunity
    }

    /// No-op when the id is unknown. Opportunities are never reactivated
    /// by any caller; the execution path only ever passes `false`.
    pub async fn set_opportunity_active(&self, id: Uuid, is_active: bool) {
        let mut map = self.opportunities.write().await;
        if let Some(slot) = map.get_mut(&id) {
            slot.opportunity.is_active = is_active;
        }
    }

    /// Atomically claim an opportunity for execution. Returns the record
    /// only if it is active, unexpired and not already claimed; the
    /// check and the flip of the claim marker happen under one write
    /// lock, so two racing callers cannot both succeed.
    pub async fn claim_opportunity(&self, id: Uuid) -> Option<Opportunity> {
        let now = Utc::now();
        let mut map = self.opportunities.write().await;
        let slot = map.get_mut(&id)?;
        if slot.claimed || !slot.opportunity.is_live(now) {
            return None;
        }
        slot.claimed = true;
        Some(slot.opportunity.clone())
    }

    /// Undo a claim after a pre-commit validation failure so the caller
    /// can retry while the opportunity is still live.
    pub async fn release_claim(&self, id: Uuid) {
        let mut map = self.opportunities.write().await;
        if let Some(slot) = map.get_mut(&id) {
            slot.claimed = false;
        }
    }

    // --- Trades ---

    pub async fn record_trade(&self, new: NewTrade) -> Trade {
        let trade = Trade {
            id: Uuid::new_v4(),
            opportunity_id: new.opportunity_id,
            tx_hash: None,
            token_pair: new.token_pair,
            profit_amount: new.profit_amount,
            gas_used: new.gas_used,
            gas_cost: new.gas_cost,
            status: TradeStatus::Pending,
            network: new.network,
            executed_at: Utc::now(),
            details: new.details,
        };
        let mut map = self.trades.write().await;
        map.insert(trade.id, trade.clone());
        trade
    }

    /// No-op when the id is unknown.
    pub async fn set_trade_status(&self, id: Uuid, status: TradeStatus, tx_hash: Option<String>) {
        let mut map = self.trades.write().await;
        if let Some(trade) = map.get_mut(&id) {
            trade.status = status;
            if tx_hash.is_some() {
                trade.tx_hash = tx_hash;
            }
        }
    }

    /// Most recent trades first, truncated to `limit`.
    pub async fn trades(&self, limit: usize) -> Vec<Trade> {
        let map = self.trades.read().await;
        let mut all: Vec<Trade> = map.values().cloned().collect();
        all.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        all.truncate(limit);
        all
    }

    pub async fn trade_stats(&self) -> TradeStats {
        let map = self.trades.read().await;
        let total_trades = map.len();
        let successful: Vec<&Trade> = map
            .values()
            .filter(|t| t.status == TradeStatus::Success)
            .collect();

        let midnight_utc = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| Local.from_local_datetime(&midnight).single())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let total_profit: f64 = successful.iter().map(|t| t.profit_amount).sum();
        let daily_profit: f64 = successful
            .iter()
            .filter(|t| t.executed_at >= midnight_utc)
            .map(|t| t.profit_amount)
            .sum();
        let success_rate = if total_trades > 0 {
            successful.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        TradeStats {
            total_profit,
            total_trades,
            success_rate,
            daily_profit,
        }
    }

    // --- Trading settings ---

    pub async fn trading_settings(&self, user_id: &str) -> Option<TradingSettings> {
        let map = self.settings.read().await;
        map.get(user_id).cloned()
    }

    /// Merge a partial update onto the existing record, or onto the
    /// hard-coded defaults when the user has none yet.
    pub async fn update_trading_settings(
        &self,
        user_id: &str,
        patch: SettingsPatch,
    ) -> TradingSettings {
        let mut map = self.settings.write().await;
        let settings = map
            .entry(user_id.to_string())
            .or_insert_with(|| TradingSettings::defaults_for(user_id));
        settings.apply(patch);
        settings.clone()
    }

    // --- Network statuses ---

    pub async fn network_statuses(&self) -> Vec<NetworkStatus> {
        let map = self.network_statuses.read().await;
        let mut all: Vec<NetworkStatus> = map.values().cloned().collect();
        all.sort_by(|a, b| a.network.cmp(&b.network));
        all
    }

    pub async fn network_is_active(&self, network: &str) -> bool {
        let map = self.network_statuses.read().await;
        map.get(network).map(|s| s.is_active).unwrap_or(false)
    }

    pub async fn upsert_network_status(&self, network: &str, health: NetworkHealth) -> NetworkStatus {
        let mut map = self.network_statuses.write().await;
        let status = map
            .entry(network.to_string())
            .or_insert_with(|| NetworkStatus {
                id: Uuid::new_v4(),
                network: network.to_string(),
                is_active: true,
                block_number: 0,
                gas_price: 1_000_000_000,
                last_update: Utc::now(),
            });
        status.is_active = health.is_active;
        status.block_number = health.block_number;
        status.gas_price = health.gas_price;
        status.last_update = Utc::now();
        status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn network_cfgs() -> Vec<NetworkCfg> {
        vec![
            NetworkCfg {
                name: "ethereum".to_string(),
                chain_id: 1,
                rpc_url: "http://localhost:8545".to_string(),
                native_currency: "ETH".to_string(),
                executor_url: None,
                contract_address: None,
                pairs: vec![],
            },
            NetworkCfg {
                name: "base".to_string(),
                chain_id: 8453,
                rpc_url: "http://localhost:8546".to_string(),
                native_currency: "ETH".to_string(),
                executor_url: None,
                contract_address: None,
                pairs: vec![],
            },
        ]
    }

    fn new_opportunity(profit_amount: f64, ttl_secs: i64) -> NewOpportunity {
        NewOpportunity {
            network: "ethereum".to_string(),
            token_a: "0xaaa".to_string(),
            token_b: "0xbbb".to_string(),
            symbol_a: "ETH".to_string(),
            symbol_b: "USDC".to_string(),
            dex_a: "1inch".to_string(),
            dex_b: "0x Protocol".to_string(),
            price_a: 100.0,
            price_b: 102.0,
            profit_amount,
            profit_percent: 1.96,
            min_capital: 10000.0,
            gas_estimate: 200000,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    fn new_trade(profit_amount: f64) -> NewTrade {
        NewTrade {
            opportunity_id: None,
            token_pair: "ETH/USDC".to_string(),
            profit_amount,
            gas_used: 200000,
            gas_cost: 0.0,
            network: "ethereum".to_string(),
            details: None,
        }
    }

    #[tokio::test]
    async fn test_active_opportunities_sorted_and_filtered() {
        let storage = MemStorage::new(&network_cfgs());
        storage.create_opportunity(new_opportunity(50.0, 30)).await;
        let best = storage.create_opportunity(new_opportunity(200.0, 30)).await;
        storage.create_opportunity(new_opportunity(120.0, 30)).await;
        // Zero TTL expires immediately and must never be listed
        storage.create_opportunity(new_opportunity(999.0, 0)).await;

        let active = storage.active_opportunities().await;
        assert_eq!(active.len(), 3);
        assert_eq!(active[0].id, best.id);
        assert!(active[0].profit_amount >= active[1].profit_amount);
        assert!(active[1].profit_amount >= active[2].profit_amount);
    }

    #[tokio::test]
    async fn test_deactivated_opportunity_not_listed() {
        let storage = MemStorage::new(&network_cfgs());
        let opp = storage.create_opportunity(new_opportunity(50.0, 30)).await;
        storage.set_opportunity_active(opp.id, false).await;
        assert!(storage.active_opportunities().await.is_empty());

        // Unknown id is a no-op
        storage.set_opportunity_active(Uuid::new_v4(), false).await;
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let storage = MemStorage::new(&network_cfgs());
        let opp = storage.create_opportunity(new_opportunity(50.0, 30)).await;

        assert!(storage.claim_opportunity(opp.id).await.is_some());
        assert!(storage.claim_opportunity(opp.id).await.is_none());

        storage.release_claim(opp.id).await;
        assert!(storage.claim_opportunity(opp.id).await.is_some());
    }

    #[tokio::test]
    async fn test_claim_refuses_expired_and_inactive() {
        let storage = MemStorage::new(&network_cfgs());
        let expired = storage.create_opportunity(new_opportunity(50.0, 0)).await;
        assert!(storage.claim_opportunity(expired.id).await.is_none());

        let deactivated = storage.create_opportunity(new_opportunity(50.0, 30)).await;
        storage.set_opportunity_active(deactivated.id, false).await;
        assert!(storage.claim_opportunity(deactivated.id).await.is_none());

        assert!(storage.claim_opportunity(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_trade_status_transition() {
        let storage = MemStorage::new(&network_cfgs());
        let trade = storage.record_trade(new_trade(10.0)).await;
        assert_eq!(trade.status, TradeStatus::Pending);
        assert!(trade.tx_hash.is_none());

        storage
            .set_trade_status(trade.id, TradeStatus::Success, Some("0xdead".to_string()))
            .await;
        let listed = storage.trades(50).await;
        assert_eq!(listed[0].status, TradeStatus::Success);
        assert_eq!(listed[0].tx_hash.as_deref(), Some("0xdead"));

        // Unknown id is a no-op
        storage
            .set_trade_status(Uuid::new_v4(), TradeStatus::Failed, None)
            .await;
    }

    #[tokio::test]
    async fn test_trades_limit() {
        let storage = MemStorage::new(&network_cfgs());
        for i in 0..5 {
            storage.record_trade(new_trade(i as f64)).await;
        }
        assert_eq!(storage.trades(3).await.len(), 3);
        assert_eq!(storage.trades(50).await.len(), 5);
    }

    #[tokio::test]
    async fn test_trade_stats() {
        let storage = MemStorage::new(&network_cfgs());
        let stats = storage.trade_stats().await;
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.success_rate, 0.0);

        let a = storage.record_trade(new_trade(10.0)).await;
        let b = storage.record_trade(new_trade(5.0)).await;
        let c = storage.record_trade(new_trade(20.0)).await;
        storage.set_trade_status(a.id, TradeStatus::Success, None).await;
        storage.set_trade_status(b.id, TradeStatus::Failed, None).await;
        storage.set_trade_status(c.id, TradeStatus::Success, None).await;

        let stats = storage.trade_stats().await;
        assert_eq!(stats.total_profit, 30.0);
        assert_eq!(stats.total_trades, 3);
        assert!((stats.success_rate - 66.67).abs() < 0.01);
        // All three executed just now, so the daily slice matches
        assert_eq!(stats.daily_profit, 30.0);
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let storage = MemStorage::new(&network_cfgs());
        assert!(storage.trading_settings("user-1").await.is_none());

        let created = storage
            .update_trading_settings("user-1", SettingsPatch::default())
            .await;
        assert_eq!(created.min_profit_threshold, 1.5);

        let updated = storage
            .update_trading_settings(
                "user-1",
                SettingsPatch {
                    min_profit_threshold: Some(2.0),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(updated.min_profit_threshold, 2.0);
        assert_eq!(updated.max_gas_price, 50.0);
        assert_eq!(updated.id, created.id);

        let read_back = storage.trading_settings("user-1").await.unwrap();
        assert_eq!(read_back.min_profit_threshold, 2.0);
    }

    #[tokio::test]
    async fn test_network_status_seeded_and_upserted() {
        let storage = MemStorage::new(&network_cfgs());
        let statuses = storage.network_statuses().await;
        assert_eq!(statuses.len(), 2);
        assert!(storage.network_is_active("ethereum").await);
        assert!(!storage.network_is_active("unknown").await);

        let updated = storage
            .upsert_network_status(
                "ethereum",
                NetworkHealth {
                    is_active: false,
                    block_number: 19_000_000,
                    gas_price: 30_000_000_000,
                },
            )
            .await;
        assert!(!updated.is_active);
        assert_eq!(updated.block_number, 19_000_000);
        assert!(!storage.network_is_active("ethereum").await);
    }
}
