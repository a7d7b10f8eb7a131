//! # Stock Report
//!
//! 由庫存帳推導的唯讀視圖：效期分級、到期警示、彙總投影。
//! 所有輸出皆可隨時重算，絕不回寫帳本。

pub mod alerts;
pub mod expiry;
pub mod summary;

// Re-export 主要類型
pub use alerts::{list_expiry_alerts, ExpiryAlert};
pub use expiry::{classify, days_until, is_within_look_ahead, ExpiryStatus};
pub use summary::{ProductTransferTotal, StockSummary, SummaryOptions, SummaryProjector};
