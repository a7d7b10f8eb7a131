//! # Stock Cache
//!
//! 推導視圖的快取與失效追蹤。
//! 帳本永遠是事實來源；此處只存可隨時丟棄重算的副本。

pub mod dirty_tracking;
pub mod summary_cache;

// Re-export 主要類型
pub use dirty_tracking::{DirtyTracker, StockKey};
pub use summary_cache::SummaryCache;
