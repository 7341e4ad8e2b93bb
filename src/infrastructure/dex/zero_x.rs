//! 0x Protocol swap quote client (v1 API)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Quote, QuoteSource, DEFAULT_GAS_ESTIMATE};
use crate::shared::errors::QuoteError;

/// Response shape of `GET /swap/v1/quote`.
#[derive(Debug, Deserialize)]
struct ZeroExQuoteResponse {
    #[serde(rename = "buyAmount")]
    buy_amount: String,
    #[serde(rename = "estimatedGas")]
    estimated_gas: Option<String>,
}

pub struct ZeroExClient {
    client: Client,
    api_key: Option<String>,
}

impl ZeroExClient {
    pub fn new(api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    fn base_url(&self, chain_id: u64) -> String {
        match chain_id {
            137 => "https://polygon.api.0x.org".to_string(),
            8453 => "https://base.api.0x.org".to_string(),
            _ => "https://api.0x.org".to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for ZeroExClient {
    fn label(&self) -> &str {
        "0x Protocol"
    }

    async fn quote(
        &self,
        chain_id: u64,
        token_in: &str,
        token_out: &str,
        amount: &str,
    ) -> Result<Quote, QuoteError> {
        let url = format!("{}/swap/v1/quote", self.base_url(chain_id));
        let mut request = self.client.get(&url).query(&[
            ("sellToken", token_in),
            ("buyToken", token_out),
            ("sellAmount", amount),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("0x-api-key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::ApiError(format!(
                "0x returned {}",
                response.status()
            )));
        }

        let body: ZeroExQuoteResponse = response.json().await?;
        let output_amount: f64 = body
            .buy_amount
            .parse()
            .map_err(|_| QuoteError::InvalidResponse(body.buy_amount.clone()))?;
        let gas_estimate = body
            .estimated_gas
            .as_deref()
            .and_then(|g| g.parse().ok())
            .unwrap_or(DEFAULT_GAS_ESTIMATE);

        debug!(chain_id, token_in, token_out, output_amount, "0x quote");
        Ok(Quote {
            output_amount,
            gas_estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_per_chain() {
        let client = ZeroExClient::new(None, 1000);
        assert_eq!(client.base_url(1), "https://api.0x.org");
        assert_eq!(client.base_url(137), "https://polygon.api.0x.org");
        assert_eq!(client.base_url(8453), "https://base.api.0x.org");
        assert_eq!(client.base_url(424242), "https://api.0x.org");
    }
}
