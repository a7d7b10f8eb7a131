//! # Stock Core
//!
//! 批次庫存帳核心資料模型與類型定義

pub mod batch;
pub mod record;

// Re-export 主要類型
pub use batch::{AllocationLine, Batch, BatchSource};
pub use record::{
    ReceiveLine, RecordState, ReturnLine, ReturnRecord, ReturnRequestLine, ReturnSource,
    StockInLine, StockInRecord, TransferLine, TransferRecord, TransferRequestLine,
};

use rust_decimal::Decimal;
use uuid::Uuid;

/// 庫存帳錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// 調撥分配時倉庫可用量不足（規劃階段，零副作用）
    #[error("庫存不足：{product_id}@{warehouse_id} 需求 {requested}，可用 {available}")]
    InsufficientStock {
        product_id: String,
        warehouse_id: String,
        requested: Decimal,
        available: Decimal,
    },

    /// 機台退貨量超過其推導庫存
    #[error("機台庫存不足：{machine_id} 的 {product_id} 退貨 {requested}，可退 {available}")]
    InsufficientSourceStock {
        product_id: String,
        machine_id: String,
        requested: Decimal,
        available: Decimal,
    },

    /// 沖銷量超過批次當前剩餘量
    #[error("批次數量不足：批次 {batch_id} 剩餘 {remaining}，沖銷需求 {requested}")]
    InsufficientQuantity {
        batch_id: Uuid,
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("無效的請求: {0}")]
    InvalidRequest(String),

    #[error("找不到單據: {0}")]
    RecordNotFound(Uuid),

    #[error("單據 {record_id} 中找不到商品明細: {product_id}")]
    LineNotFound { record_id: Uuid, product_id: String },
}

pub type Result<T> = std::result::Result<T, StockError>;
