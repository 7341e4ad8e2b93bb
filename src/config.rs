use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerCfg {
    /// Cadence of full scan cycles.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Minimum spread (percent) for a quote pair to qualify, inclusive.
    #[serde(default = "default_min_profit_percent")]
    pub min_profit_percent: f64,
    /// How long a detected opportunity stays executable.
    #[serde(default = "default_opportunity_ttl_secs")]
    pub opportunity_ttl_secs: i64,
    /// Raw token amount sent to the quote APIs for price comparison.
    #[serde(default = "default_probe_amount")]
    pub probe_amount: String,
}

fn default_scan_interval_ms() -> u64 {
    5000
}

fn default_min_profit_percent() -> f64 {
    0.5
}

fn default_opportunity_ttl_secs() -> i64 {
    30
}

fn default_probe_amount() -> String {
    // 1 token at 18 decimals
    "1000000000000000000".to_string()
}

impl Default for ScannerCfg {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
            min_profit_percent: default_min_profit_percent(),
            opportunity_ttl_secs: default_opportunity_ttl_secs(),
            probe_amount: default_probe_amount(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastCfg {
    /// Cadence of the opportunities/stats/networks push to subscribers.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Cadence of the network-status refresh from the chain collaborator.
    #[serde(default = "default_network_refresh_ms")]
    pub network_refresh_ms: u64,
}

fn default_tick_ms() -> u64 {
    3000
}

fn default_network_refresh_ms() -> u64 {
    10000
}

impl Default for BroadcastCfg {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            network_refresh_ms: default_network_refresh_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotesCfg {
    pub one_inch_api_key: Option<String>,
    pub zero_x_api_key: Option<String>,
    #[serde(default = "default_quote_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_quote_timeout_ms() -> u64 {
    10000
}

impl Default for QuotesCfg {
    fn default() -> Self {
        Self {
            one_inch_api_key: None,
            zero_x_api_key: None,
            timeout_ms: default_quote_timeout_ms(),
        }
    }
}

impl QuotesCfg {
    pub fn one_inch_key(&self) -> Option<String> {
        self.one_inch_api_key
            .clone()
            .or_else(|| std::env::var("ONEINCH_API_KEY").ok())
    }

    pub fn zero_x_key(&self) -> Option<String> {
        self.zero_x_api_key
            .clone()
            .or_else(|| std::env::var("ZEROX_API_KEY").ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletCfg {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPairCfg {
    pub symbol_a: String,
    pub symbol_b: String,
    pub address_a: String,
    pub address_b: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkCfg {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub native_currency: String,
    /// Endpoint of the execution service for this network. Networks
    /// without one are treated as having no deployed executor.
    pub executor_url: Option<String>,
    pub contract_address: Option<String>,
    #[serde(default)]
    pub pairs: Vec<TokenPairCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerCfg,
    #[serde(default)]
    pub scanner: ScannerCfg,
    #[serde(default)]
    pub broadcast: BroadcastCfg,
    #[serde(default)]
    pub quotes: QuotesCfg,
    #[serde(default)]
    pub wallet: WalletCfg,
    pub networks: Vec<NetworkCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let cfg: Config = toml::from_str(
            r#"
            [[networks]]
            name = "ethereum"
            chain_id = 1
            rpc_url = "https://eth.llamarpc.com"
            native_currency = "ETH"

            [[networks.pairs]]
            symbol_a = "ETH"
            symbol_b = "USDC"
            address_a = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            address_b = "0xA0b86a33E6417faCf2bDc6e5Bd3dd1c83c4E8d5a"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.scanner.scan_interval_ms, 5000);
        assert_eq!(cfg.scanner.min_profit_percent, 0.5);
        assert_eq!(cfg.scanner.opportunity_ttl_secs, 30);
        assert_eq!(cfg.broadcast.tick_ms, 3000);
        assert_eq!(cfg.networks.len(), 1);
        assert_eq!(cfg.networks[0].pairs.len(), 1);
        assert!(cfg.networks[0].executor_url.is_none());
    }
}
