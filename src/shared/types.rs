//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user trading settings. Read and replaced (merge-on-write) by the
/// settings endpoint; created lazily with these defaults on first read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSettings {
    pub id: Uuid,
    pub user_id: String,
    pub min_profit_threshold: f64,
    pub max_gas_price: f64,
    pub auto_execute: bool,
    pub enabled_networks: Vec<String>,
    pub max_trade_amount: f64,
    pub updated_at: DateTime<Utc>,
}

impl TradingSettings {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            min_profit_threshold: 1.5,
            max_gas_price: 50.0,
            auto_execute: false,
            enabled_networks: vec!["ethereum".to_string(), "base".to_string()],
            max_trade_amount: 10000.0,
            updated_at: Utc::now(),
        }
    }

    /// Merge a partial update onto this record. Absent fields keep their
    /// current value; `updated_at` always advances.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.min_profit_threshold {
            self.min_profit_threshold = v;
        }
        if let Some(v) = patch.max_gas_price {
            self.max_gas_price = v;
        }
        if let Some(v) = patch.auto_execute {
            self.auto_execute = v;
        }
        if let Some(v) = patch.enabled_networks {
            self.enabled_networks = v;
        }
        if let Some(v) = patch.max_trade_amount {
            self.max_trade_amount = v;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial settings payload accepted by `POST /api/settings/:user_id`.
/// Unknown fields are rejected so malformed payloads surface as 400s.
/// The dashboard posts its numeric fields as JSON strings; both forms
/// are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "de_number_or_string")]
    pub min_profit_threshold: Option<f64>,
    #[serde(default, deserialize_with = "de_number_or_string")]
    pub max_gas_price: Option<f64>,
    pub auto_execute: Option<bool>,
    pub enabled_networks: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de_number_or_string")]
    pub max_trade_amount: Option<f64>,
}

fn de_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(v)) => Ok(Some(v)),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid numeric string: {s}"))),
    }
}

/// One row per configured network, upserted from the chain collaborator
/// on a fixed cadence and read by the scanner to skip inactive networks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub id: Uuid,
    pub network: String,
    pub is_active: bool,
    pub block_number: u64,
    pub gas_price: u64,
    pub last_update: DateTime<Utc>,
}

/// Snapshot returned by the chain collaborator's health probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkHealth {
    pub is_active: bool,
    pub block_number: u64,
    pub gas_price: u64,
}

impl NetworkHealth {
    pub fn offline() -> Self {
        Self {
            is_active: false,
            block_number: 0,
            gas_price: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_patch_merges_onto_defaults() {
        let mut settings = TradingSettings::defaults_for("user-1");
        assert_eq!(settings.min_profit_threshold, 1.5);
        assert_eq!(settings.max_gas_price, 50.0);
        assert!(!settings.auto_execute);

        settings.apply(SettingsPatch {
            min_profit_threshold: Some(2.0),
            ..Default::default()
        });

        assert_eq!(settings.min_profit_threshold, 2.0);
        // Everything else retains its prior value
        assert_eq!(settings.max_gas_price, 50.0);
        assert!(!settings.auto_execute);
        assert_eq!(settings.enabled_networks, vec!["ethereum", "base"]);
        assert_eq!(settings.max_trade_amount, 10000.0);
    }

    #[test]
    fn test_settings_patch_accepts_string_numbers() {
        let patch: SettingsPatch = serde_json::from_str(
            r#"{"minProfitThreshold": "2.0", "maxGasPrice": 75, "maxTradeAmount": "5000"}"#,
        )
        .unwrap();
        assert_eq!(patch.min_profit_threshold, Some(2.0));
        assert_eq!(patch.max_gas_price, Some(75.0));
        assert_eq!(patch.max_trade_amount, Some(5000.0));

        let result: Result<SettingsPatch, _> =
            serde_json::from_str(r#"{"minProfitThreshold": "not-a-number"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_patch_rejects_unknown_fields() {
        let result: Result<SettingsPatch, _> =
            serde_json::from_str(r#"{"minProfitThreshold": 2.0, "bogus": true}"#);
        assert!(result.is_err());
    }
}
