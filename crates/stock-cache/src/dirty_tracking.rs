//! 髒標記追蹤
//!
//! 以 (商品, 倉庫) 為粒度記錄哪些庫存鍵已變動，
//! 供嵌入方對單鍵可用量等細粒度快取做選擇性重算。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stock_core::{ReturnRecord, StockInRecord, TransferRecord};

/// 庫存鍵：(商品, 倉庫)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: String,
    pub warehouse_id: String,
}

impl StockKey {
    pub fn new(product_id: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            warehouse_id: warehouse_id.into(),
        }
    }
}

/// 髒標記追蹤器
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_keys: HashSet<StockKey>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記庫存鍵為髒
    pub fn mark_dirty(&mut self, key: StockKey) {
        self.dirty_keys.insert(key);
    }

    /// 標記一張入庫單觸及的全部庫存鍵
    pub fn mark_stock_in(&mut self, record: &StockInRecord) {
        for line in &record.lines {
            self.mark_dirty(StockKey::new(line.product_id.clone(), record.warehouse_id.clone()));
        }
    }

    /// 標記一張調撥單觸及的全部庫存鍵（來源倉庫側）
    pub fn mark_transfer(&mut self, record: &TransferRecord) {
        for line in &record.lines {
            self.mark_dirty(StockKey::new(
                line.product_id.clone(),
                record.from_warehouse_id.clone(),
            ));
        }
    }

    /// 標記一張退貨單觸及的全部庫存鍵（目的倉庫側）
    pub fn mark_return(&mut self, record: &ReturnRecord) {
        for line in &record.lines {
            self.mark_dirty(StockKey::new(line.product_id.clone(), record.warehouse_id.clone()));
        }
    }

    /// 檢查庫存鍵是否為髒
    pub fn is_dirty(&self, key: &StockKey) -> bool {
        self.dirty_keys.contains(key)
    }

    /// 檢查是否有任何髒標記
    pub fn has_dirty(&self) -> bool {
        !self.dirty_keys.is_empty()
    }

    /// 取出並清空全部髒標記
    pub fn drain(&mut self) -> Vec<StockKey> {
        self.dirty_keys.drain().collect()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_keys.clear();
    }
}
