//! 批次存放區
//!
//! 以 (商品, 倉庫) 為主鍵、來源單據編號為次索引的批次集合。
//! 此為儲存契約的記憶體內參考實現；持久化後端屬外部協作者。

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stock_core::{Batch, BatchSource, StockError};
use uuid::Uuid;

/// 批次入帳描述
#[derive(Debug, Clone)]
pub struct BatchCredit {
    /// 商品ID
    pub product_id: String,
    /// 倉庫ID
    pub warehouse_id: String,
    /// 批次來源
    pub source: BatchSource,
    /// 來源單據編號
    pub source_ref: String,
    /// 效期
    pub expiry_date: Option<NaiveDate>,
    /// 入庫日期
    pub date_in: NaiveDate,
}

/// 批次存放區
#[derive(Debug, Default)]
pub struct BatchStore {
    /// 全部批次
    batches: HashMap<Uuid, Batch>,

    /// (商品, 倉庫) → 批次ID
    by_key: HashMap<(String, String), Vec<Uuid>>,

    /// 來源單據編號 → 批次ID（沖銷查詢用）
    by_source_ref: HashMap<String, Vec<Uuid>>,
}

/// FEFO 排序：有效期者優先、效期早者優先；
/// 無效期者殿後、依入庫日排序；同位次依入庫日再依批次ID決勝（完全確定性）。
pub fn fefo_order(a: &Batch, b: &Batch) -> Ordering {
    match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x
            .cmp(&y)
            .then_with(|| a.date_in.cmp(&b.date_in))
            .then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .date_in
            .cmp(&b.date_in)
            .then_with(|| a.id.cmp(&b.id)),
    }
}

impl BatchStore {
    /// 創建空的存放區
    pub fn new() -> Self {
        Self::default()
    }

    /// 批次總數（含已耗盡的歷史批次）
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// 檢查是否為空
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// 以ID查找批次
    pub fn get(&self, batch_id: Uuid) -> Option<&Batch> {
        self.batches.get(&batch_id)
    }

    /// 遍歷全部批次（含歷史批次）
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// 以來源單據編號查找批次
    pub fn find_by_source_ref(&self, source_ref: &str) -> Vec<&Batch> {
        self.by_source_ref
            .get(source_ref)
            .map(|ids| ids.iter().filter_map(|id| self.batches.get(id)).collect())
            .unwrap_or_default()
    }

    /// 查找可分配批次（剩餘量 > 0），依 FEFO 順序返回
    ///
    /// 無符合批次時返回空序列，不視為錯誤。
    pub fn find_eligible(&self, product_id: &str, warehouse_id: &str) -> Vec<&Batch> {
        let key = (product_id.to_string(), warehouse_id.to_string());
        let mut eligible: Vec<&Batch> = self
            .by_key
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.batches.get(id))
                    .filter(|b| b.is_eligible())
                    .collect()
            })
            .unwrap_or_default();

        eligible.sort_by(|&a, &b| fefo_order(a, b));
        eligible
    }

    /// 入帳：合併至同 (商品, 倉庫, 來源單據, 效期) 的既有批次，否則建立新批次
    ///
    /// 返回入帳批次的ID。
    pub fn credit(&mut self, credit: BatchCredit, quantity: Decimal) -> Uuid {
        let key = (credit.product_id.clone(), credit.warehouse_id.clone());

        if let Some(ids) = self.by_key.get(&key) {
            let existing = ids.iter().copied().find(|id| {
                self.batches.get(id).is_some_and(|b| {
                    b.source_ref == credit.source_ref && b.expiry_date == credit.expiry_date
                })
            });
            if let Some(id) = existing {
                if let Some(batch) = self.batches.get_mut(&id) {
                    batch.quantity_remaining += quantity;
                    return id;
                }
            }
        }

        let mut batch = Batch::new(
            credit.product_id,
            credit.warehouse_id,
            credit.source,
            credit.source_ref,
            quantity,
            credit.date_in,
        );
        if let Some(expiry) = credit.expiry_date {
            batch = batch.with_expiry_date(expiry);
        }

        let id = batch.id;
        self.by_key.entry(key).or_default().push(id);
        self.by_source_ref
            .entry(batch.source_ref.clone())
            .or_default()
            .push(id);
        self.batches.insert(id, batch);
        id
    }

    /// 扣帳：遞減批次剩餘量
    ///
    /// 數量超過剩餘量時失敗（無部分效果），剩餘量恆不為負。
    pub fn debit(&mut self, batch_id: Uuid, quantity: Decimal) -> stock_core::Result<()> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| StockError::InvalidRequest(format!("找不到批次: {batch_id}")))?;

        if quantity > batch.quantity_remaining {
            return Err(StockError::InsufficientQuantity {
                batch_id,
                requested: quantity,
                remaining: batch.quantity_remaining,
            });
        }

        batch.quantity_remaining -= quantity;
        Ok(())
    }

    /// 回帳：遞增批次剩餘量（沖銷用）
    ///
    /// 不設上限——沖銷只會回復先前成功扣帳的等量或更少數量。
    pub fn restore(&mut self, batch_id: Uuid, quantity: Decimal) -> stock_core::Result<()> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| StockError::InvalidRequest(format!("找不到批次: {batch_id}")))?;

        batch.quantity_remaining += quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit_desc(product: &str, expiry: Option<NaiveDate>, source_ref: &str) -> BatchCredit {
        BatchCredit {
            product_id: product.to_string(),
            warehouse_id: "WH-01".to_string(),
            source: BatchSource::StockIn,
            source_ref: source_ref.to_string(),
            expiry_date: expiry,
            date_in: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_credit_creates_and_merges() {
        let mut store = BatchStore::new();
        let expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let id1 = store.credit(credit_desc("PROD-001", Some(expiry), "STK-IN-0001"), Decimal::from(100));
        // 同 (商品, 倉庫, 單據, 效期) → 合併
        let id2 = store.credit(credit_desc("PROD-001", Some(expiry), "STK-IN-0001"), Decimal::from(50));
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(id1).unwrap().quantity_remaining,
            Decimal::from(150)
        );

        // 效期不同 → 新批次
        let id3 = store.credit(credit_desc("PROD-001", None, "STK-IN-0001"), Decimal::from(30));
        assert_ne!(id1, id3);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_debit_rejects_overdraw() {
        let mut store = BatchStore::new();
        let id = store.credit(credit_desc("PROD-001", None, "STK-IN-0001"), Decimal::from(10));

        let err = store.debit(id, Decimal::from(11)).unwrap_err();
        assert!(matches!(err, StockError::InsufficientQuantity { .. }));
        // 無部分效果
        assert_eq!(store.get(id).unwrap().quantity_remaining, Decimal::from(10));

        store.debit(id, Decimal::from(10)).unwrap();
        assert_eq!(store.get(id).unwrap().quantity_remaining, Decimal::ZERO);
    }

    #[test]
    fn test_restore_is_uncapped() {
        let mut store = BatchStore::new();
        let id = store.credit(credit_desc("PROD-001", None, "STK-IN-0001"), Decimal::from(10));

        store.debit(id, Decimal::from(10)).unwrap();
        store.restore(id, Decimal::from(10)).unwrap();
        assert_eq!(store.get(id).unwrap().quantity_remaining, Decimal::from(10));
    }

    #[test]
    fn test_find_eligible_fefo_order() {
        let mut store = BatchStore::new();
        let d = |m: u32, day: u32| NaiveDate::from_ymd_opt(2025, m, day).unwrap();

        // 晚效期
        store.credit(credit_desc("PROD-001", Some(d(3, 10)), "STK-IN-0001"), Decimal::from(100));
        // 早效期（應排最前）
        store.credit(credit_desc("PROD-001", Some(d(3, 5)), "STK-IN-0002"), Decimal::from(50));
        // 無效期（應排最後）
        store.credit(credit_desc("PROD-001", None, "STK-IN-0003"), Decimal::from(30));

        let eligible = store.find_eligible("PROD-001", "WH-01");
        assert_eq!(eligible.len(), 3);
        assert_eq!(eligible[0].expiry_date, Some(d(3, 5)));
        assert_eq!(eligible[1].expiry_date, Some(d(3, 10)));
        assert_eq!(eligible[2].expiry_date, None);
    }

    #[test]
    fn test_find_eligible_skips_drained() {
        let mut store = BatchStore::new();
        let id = store.credit(credit_desc("PROD-001", None, "STK-IN-0001"), Decimal::from(10));
        store.debit(id, Decimal::from(10)).unwrap();

        assert!(store.find_eligible("PROD-001", "WH-01").is_empty());
        // 歷史批次仍在
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_eligible_unknown_key_is_empty() {
        let store = BatchStore::new();
        assert!(store.find_eligible("PROD-404", "WH-404").is_empty());
    }

    #[test]
    fn test_find_by_source_ref() {
        let mut store = BatchStore::new();
        store.credit(credit_desc("PROD-001", None, "STK-IN-0001"), Decimal::from(10));
        store.credit(credit_desc("PROD-002", None, "STK-IN-0001"), Decimal::from(20));

        assert_eq!(store.find_by_source_ref("STK-IN-0001").len(), 2);
        assert!(store.find_by_source_ref("STK-IN-0404").is_empty());
    }

    #[test]
    fn test_fefo_order_tiebreaks() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut a = Batch::new(
            "P".into(),
            "W".into(),
            BatchSource::StockIn,
            "A".into(),
            Decimal::ONE,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .with_expiry_date(d);
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        // 同效期：入庫早者優先
        b.date_in = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(fefo_order(&a, &b), Ordering::Less);

        // 同效期同入庫日：以ID決勝，排序可重現
        b.date_in = a.date_in;
        let expected = a.id.cmp(&b.id);
        assert_eq!(fefo_order(&a, &b), expected);

        // 自反性
        a.id = b.id;
        assert_eq!(fefo_order(&a, &b), Ordering::Equal);
    }
}
