pub mod arbitrage;
pub mod execution;
