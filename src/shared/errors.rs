//! Error handling for the application

use thiserror::Error;

/// Quote-fetch errors. A failed quote only skips the pair for the
/// current scan cycle, it never stops the scanner.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Quote API request failed: {0}")]
    ApiError(String),

    #[error("Quote request timed out")]
    Timeout,

    #[error("Invalid quote response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QuoteError::Timeout
        } else {
            QuoteError::ApiError(err.to_string())
        }
    }
}

/// Execution errors surfaced to the caller of `execute`. `ProfitDecayed`
/// and `Rejected` are deliberately distinct so a client can explain
/// "price moved" vs "the chain declined the trade".
#[derive(Error, Debug, Clone)]
pub enum ExecuteError {
    #[error("Opportunity not found or expired")]
    NotFound,

    #[error("Smart contract not deployed on {0}")]
    NetworkUnavailable(String),

    #[error("Profit dropped below threshold")]
    ProfitDecayed { estimated: f64, threshold: f64 },

    #[error("Transaction would fail - insufficient profit or liquidity")]
    Rejected(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExecuteError {
    /// Classify a commit failure: markers of a simulated revert or
    /// insufficient profit/liquidity mean the chain declined the trade.
    pub fn from_commit_failure(err: anyhow::Error) -> Self {
        let message = err.to_string();
        let lower = message.to_lowercase();
        if lower.contains("revert") || lower.contains("insufficient") {
            ExecuteError::Rejected(message)
        } else {
            ExecuteError::Execution(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_failure_classification() {
        let rejected = ExecuteError::from_commit_failure(anyhow::anyhow!(
            "execution reverted: FlashArbitrage: profit below minimum"
        ));
        assert!(matches!(rejected, ExecuteError::Rejected(_)));

        let rejected = ExecuteError::from_commit_failure(anyhow::anyhow!(
            "Insufficient liquidity in pool"
        ));
        assert!(matches!(rejected, ExecuteError::Rejected(_)));

        let generic = ExecuteError::from_commit_failure(anyhow::anyhow!("nonce too low"));
        assert!(matches!(generic, ExecuteError::Execution(_)));
    }
}
