//! Trade ledger records and aggregate statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal-or-pending status of one execution attempt. `Pending` is set
/// at record creation and left exactly once, for success or failure;
/// it is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Success,
    Failed,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Pending)
    }
}

/// One attempt to realize an opportunity. Owned exclusively by the
/// ledger after creation; only the execution path transitions its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Uuid,
    /// Captured at attempt time; never rewritten, even if the referenced
    /// opportunity later disappears from the store.
    pub opportunity_id: Option<Uuid>,
    pub tx_hash: Option<String>,
    pub token_pair: String,
    pub profit_amount: f64,
    pub gas_used: u64,
    pub gas_cost: f64,
    pub status: TradeStatus,
    pub network: String,
    pub executed_at: DateTime<Utc>,
    /// Audit payload: quotes, sources, contract address, live estimate.
    pub details: Option<serde_json::Value>,
}

/// Trade data captured by the executor before the ledger assigns id,
/// timestamp and the initial `Pending` status.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub opportunity_id: Option<Uuid>,
    pub token_pair: String,
    pub profit_amount: f64,
    pub gas_used: u64,
    pub gas_cost: f64,
    pub network: String,
    pub details: Option<serde_json::Value>,
}

/// Aggregates over the full ledger. Profit sums count successful trades
/// only; the daily figure is restricted to trades since local midnight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub total_profit: f64,
    pub total_trades: usize,
    pub success_rate: f64,
    pub daily_profit: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(TradeStatus::Success.is_terminal());
        assert!(TradeStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TradeStatus::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&TradeStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
