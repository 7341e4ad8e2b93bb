pub mod chain;
pub mod dex;
pub mod storage;

pub use storage::MemStorage;
