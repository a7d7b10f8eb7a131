//! # Stock Ledger Engine
//!
//! 批次庫存帳與 FEFO/FIFO 分配引擎

pub mod ledger;
pub mod planner;
pub mod store;

// Re-export 主要類型
pub use ledger::StockLedger;
pub use planner::AllocationPlanner;
pub use store::{BatchCredit, BatchStore};
