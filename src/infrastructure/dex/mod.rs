pub mod one_inch;
pub mod zero_x;

use async_trait::async_trait;

use crate::shared::errors::QuoteError;

pub use one_inch::OneInchClient;
pub use zero_x::ZeroExClient;

/// Quoted output for a fixed input amount, as returned by an aggregator.
#[derive(Debug, Clone)]
pub struct Quote {
    /// Output amount in the buy token's raw units, used as the price
    /// signal for spread computation.
    pub output_amount: f64,
    pub gas_estimate: u64,
}

/// One independent price-quoting service.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Display label, also recorded on opportunities as the buy/sell side.
    fn label(&self) -> &str;

    /// Quote swapping `amount` (raw units, decimal string) of `token_in`
    /// for `token_out` on the given chain.
    async fn quote(
        &self,
        chain_id: u64,
        token_in: &str,
        token_out: &str,
        amount: &str,
    ) -> Result<Quote, QuoteError>;
}

pub(crate) const DEFAULT_GAS_ESTIMATE: u64 = 200000;
