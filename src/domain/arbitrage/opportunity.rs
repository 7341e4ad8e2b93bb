//! Detected, time-bounded price discrepancies

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A price discrepancy between two quote sources for one token pair on
/// one network. `dex_a` is always the buy side (the cheaper quote),
/// `dex_b` the sell side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub network: String,
    pub token_a: String,
    pub token_b: String,
    pub symbol_a: String,
    pub symbol_b: String,
    pub dex_a: String,
    pub dex_b: String,
    pub price_a: f64,
    pub price_b: f64,
    pub profit_amount: f64,
    pub profit_percent: f64,
    pub min_capital: f64,
    pub gas_estimate: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Opportunity {
    /// Currently executable: still flagged active and not past its TTL.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    pub fn token_pair(&self) -> String {
        format!("{}/{}", self.symbol_a, self.symbol_b)
    }
}

/// Opportunity data as produced by the scanner, before the store assigns
/// an id and lifecycle fields.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub network: String,
    pub token_a: String,
    pub token_b: String,
    pub symbol_a: String,
    pub symbol_b: String,
    pub dex_a: String,
    pub dex_b: String,
    pub price_a: f64,
    pub price_b: f64,
    pub profit_amount: f64,
    pub profit_percent: f64,
    pub min_capital: f64,
    pub gas_estimate: u64,
    pub ttl: Duration,
}

impl NewOpportunity {
    pub fn into_opportunity(self, id: Uuid, now: DateTime<Utc>) -> Opportunity {
        Opportunity {
            id,
            network: self.network,
            token_a: self.token_a,
            token_b: self.token_b,
            symbol_a: self.symbol_a,
            symbol_b: self.symbol_b,
            dex_a: self.dex_a,
            dex_b: self.dex_b,
            price_a: self.price_a,
            price_b: self.price_b,
            profit_amount: self.profit_amount,
            profit_percent: self.profit_percent,
            min_capital: self.min_capital,
            gas_estimate: self.gas_estimate,
            is_active: true,
            created_at: now,
            expires_at: now + self.ttl,
        }
    }
}
