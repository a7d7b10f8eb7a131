//! # Stock
//!
//! 批次庫存帳與 FEFO/FIFO 分配引擎的統一入口。
//!
//! - `stock-core`：資料模型與錯誤類型
//! - `stock-ledger`：批次存放區、分配規劃器、帳務操作
//! - `stock-report`：效期分級、到期警示、彙總投影
//! - `stock-cache`：推導視圖的失效追蹤與快取

pub use stock_cache::{DirtyTracker, StockKey, SummaryCache};
pub use stock_core::{
    AllocationLine, Batch, BatchSource, ReceiveLine, RecordState, ReturnLine, ReturnRecord,
    ReturnRequestLine, ReturnSource, StockError, StockInLine, StockInRecord, TransferLine,
    TransferRecord, TransferRequestLine,
};
pub use stock_ledger::{AllocationPlanner, BatchCredit, BatchStore, StockLedger};
pub use stock_report::{
    classify, days_until, is_within_look_ahead, list_expiry_alerts, ExpiryAlert, ExpiryStatus,
    ProductTransferTotal, StockSummary, SummaryOptions, SummaryProjector,
};

pub use stock_core::Result;
