//! Flasharb - Cross-DEX arbitrage scanner and execution service
//! Built with Domain-Driven Design principles

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use domain::arbitrage::{Opportunity, OpportunityScanner};
pub use domain::execution::{Trade, TradeExecutor, TradeStatus};
pub use infrastructure::MemStorage;
