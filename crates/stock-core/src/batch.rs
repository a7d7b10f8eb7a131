//! 批次模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 批次來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSource {
    /// 入庫單
    StockIn,
    /// 退貨單
    StockReturn,
}

/// 批次（庫存的最小單位）
///
/// 一個批次對應一個 (商品, 倉庫, 來源單據) 組合；
/// 數量歸零後保留為歷史記錄，供稽核與沖銷查詢，不做實體刪除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// 批次ID
    pub id: Uuid,

    /// 商品ID
    pub product_id: String,

    /// 倉庫ID
    pub warehouse_id: String,

    /// 批次來源
    pub source: BatchSource,

    /// 來源單據編號（同時作為批次代碼，如 STK-IN-0001）
    pub source_ref: String,

    /// 剩餘數量（恆 >= 0；分配遞減、入帳/沖銷遞增）
    pub quantity_remaining: Decimal,

    /// 效期（無效期的批次不參與 FEFO 排序，退至 FIFO 排在有效期批次之後）
    pub expiry_date: Option<NaiveDate>,

    /// 入庫日期（FIFO 決勝與無效期時的排序依據）
    pub date_in: NaiveDate,
}

impl Batch {
    /// 創建新的批次
    pub fn new(
        product_id: String,
        warehouse_id: String,
        source: BatchSource,
        source_ref: String,
        quantity: Decimal,
        date_in: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            source,
            source_ref,
            quantity_remaining: quantity,
            expiry_date: None,
            date_in,
        }
    }

    /// 建構器模式：設置效期
    pub fn with_expiry_date(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// 批次代碼（人可讀，取自來源單據編號）
    pub fn batch_code(&self) -> &str {
        &self.source_ref
    }

    /// 檢查批次是否已耗盡
    pub fn is_drained(&self) -> bool {
        self.quantity_remaining <= Decimal::ZERO
    }

    /// 檢查是否可參與分配
    pub fn is_eligible(&self) -> bool {
        self.quantity_remaining > Decimal::ZERO
    }

    /// 檢查是否為退貨批次
    pub fn is_return_credit(&self) -> bool {
        self.source == BatchSource::StockReturn
    }
}

/// 分配明細：一次分配中從單一批次取用的數量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// 批次ID
    pub batch_id: Uuid,

    /// 取用數量
    pub quantity: Decimal,
}

impl AllocationLine {
    /// 創建新的分配明細
    pub fn new(batch_id: Uuid, quantity: Decimal) -> Self {
        Self { batch_id, quantity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_batch() {
        let batch = Batch::new(
            "PROD-001".to_string(),
            "WH-01".to_string(),
            BatchSource::StockIn,
            "STK-IN-0001".to_string(),
            Decimal::from(100),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );

        assert_eq!(batch.product_id, "PROD-001");
        assert_eq!(batch.quantity_remaining, Decimal::from(100));
        assert_eq!(batch.batch_code(), "STK-IN-0001");
        assert!(batch.expiry_date.is_none());
        assert!(batch.is_eligible());
        assert!(!batch.is_drained());
        assert!(!batch.is_return_credit());
    }

    #[test]
    fn test_batch_builder() {
        let batch = Batch::new(
            "PROD-002".to_string(),
            "WH-01".to_string(),
            BatchSource::StockReturn,
            "RTN-0003".to_string(),
            Decimal::from(20),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        )
        .with_expiry_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        assert_eq!(
            batch.expiry_date,
            Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        );
        assert!(batch.is_return_credit());
    }

    #[test]
    fn test_drained_batch_kept_as_history() {
        let mut batch = Batch::new(
            "PROD-003".to_string(),
            "WH-01".to_string(),
            BatchSource::StockIn,
            "STK-IN-0002".to_string(),
            Decimal::from(10),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );

        batch.quantity_remaining = Decimal::ZERO;
        assert!(batch.is_drained());
        assert!(!batch.is_eligible());
        // 批次代碼仍可查詢（稽核用途）
        assert_eq!(batch.batch_code(), "STK-IN-0002");
    }
}
