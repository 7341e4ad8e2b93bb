pub mod executor;
pub mod trade;

pub use executor::{ExecutionReceipt, TradeExecutor};
pub use trade::{NewTrade, Trade, TradeStats, TradeStatus};
