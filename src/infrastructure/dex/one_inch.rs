//! 1inch aggregator quote client (v5 API)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Quote, QuoteSource, DEFAULT_GAS_ESTIMATE};
use crate::shared::errors::QuoteError;

/// Response shape of `GET /v5.0/{chain}/quote`.
#[derive(Debug, Deserialize)]
struct OneInchQuoteResponse {
    #[serde(rename = "toTokenAmount")]
    to_token_amount: String,
    #[serde(rename = "estimatedGas")]
    estimated_gas: Option<u64>,
}

pub struct OneInchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OneInchClient {
    pub fn new(api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            base_url: "https://api.1inch.io/v5.0".to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl QuoteSource for OneInchClient {
    fn label(&self) -> &str {
        "1inch"
    }

    async fn quote(
        &self,
        chain_id: u64,
        token_in: &str,
        token_out: &str,
        amount: &str,
    ) -> Result<Quote, QuoteError> {
        let url = format!("{}/{}/quote", self.base_url, chain_id);
        let mut request = self.client.get(&url).query(&[
            ("fromTokenAddress", token_in),
            ("toTokenAddress", token_out),
            ("amount", amount),
        ]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::ApiError(format!(
                "1inch returned {}",
                response.status()
            )));
        }

        let body: OneInchQuoteResponse = response.json().await?;
        let output_amount: f64 = body
            .to_token_amount
            .parse()
            .map_err(|_| QuoteError::InvalidResponse(body.to_token_amount.clone()))?;

        debug!(chain_id, token_in, token_out, output_amount, "1inch quote");
        Ok(Quote {
            output_amount,
            gas_estimate: body.estimated_gas.unwrap_or(DEFAULT_GAS_ESTIMATE),
        })
    }
}
