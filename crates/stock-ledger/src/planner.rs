//! 分配規劃器
//!
//! 依 FEFO（效期先出）、FIFO 決勝的順序，決定以哪些批次滿足出庫需求。
//! 規劃為純計算，不修改任何狀態；扣帳在整張單據規劃成功後才執行。

use std::collections::HashMap;

use rust_decimal::Decimal;
use stock_core::{AllocationLine, StockError};
use uuid::Uuid;

use crate::store::BatchStore;

/// 分配規劃器
pub struct AllocationPlanner;

impl AllocationPlanner {
    /// 規劃分配
    ///
    /// # 參數
    /// * `reserved` - 同一次提交中先行明細已預佔的批次數量，
    ///   使同商品多明細在單一一致快照上規劃，避免重複計數
    ///
    /// 全有或全無：可用量不足時返回 `InsufficientStock`（攜帶需求與可用量），
    /// 不產生任何部分分配。
    pub fn plan(
        store: &BatchStore,
        product_id: &str,
        warehouse_id: &str,
        requested: Decimal,
        reserved: &HashMap<Uuid, Decimal>,
    ) -> stock_core::Result<Vec<AllocationLine>> {
        if requested <= Decimal::ZERO {
            return Err(StockError::InvalidRequest(format!(
                "分配數量必須為正數: {requested}"
            )));
        }

        let mut lines = Vec::new();
        let mut needed = requested;
        let mut available = Decimal::ZERO;

        // find_eligible 已依 FEFO 排序，貪婪取用即可
        for batch in store.find_eligible(product_id, warehouse_id) {
            let held = reserved.get(&batch.id).copied().unwrap_or(Decimal::ZERO);
            let free = batch.quantity_remaining - held;
            if free <= Decimal::ZERO {
                continue;
            }

            available += free;

            if needed > Decimal::ZERO {
                let take = free.min(needed);
                lines.push(AllocationLine::new(batch.id, take));
                needed -= take;
            }
        }

        if needed > Decimal::ZERO {
            return Err(StockError::InsufficientStock {
                product_id: product_id.to_string(),
                warehouse_id: warehouse_id.to_string(),
                requested,
                available,
            });
        }

        Ok(lines)
    }

    /// 計算可用量（剩餘量總和，不含預佔）
    pub fn available(store: &BatchStore, product_id: &str, warehouse_id: &str) -> Decimal {
        store
            .find_eligible(product_id, warehouse_id)
            .iter()
            .map(|b| b.quantity_remaining)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BatchCredit;
    use chrono::NaiveDate;
    use stock_core::BatchSource;

    fn seed(store: &mut BatchStore, source_ref: &str, qty: i64, expiry: Option<NaiveDate>) -> Uuid {
        store.credit(
            BatchCredit {
                product_id: "PROD-001".to_string(),
                warehouse_id: "WH-01".to_string(),
                source: BatchSource::StockIn,
                source_ref: source_ref.to_string(),
                expiry_date: expiry,
                date_in: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            },
            Decimal::from(qty),
        )
    }

    #[test]
    fn test_plan_takes_earliest_expiry_first() {
        // 批次 A 100 個（效期 2025-01-10）、批次 B 50 個（效期 2025-01-05），
        // 調撥 120 → (B, 50), (A, 70)
        let mut store = BatchStore::new();
        let a = seed(
            &mut store,
            "STK-IN-0001",
            100,
            NaiveDate::from_ymd_opt(2025, 1, 10),
        );
        let b = seed(
            &mut store,
            "STK-IN-0002",
            50,
            NaiveDate::from_ymd_opt(2025, 1, 5),
        );

        let plan =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(120), &HashMap::new())
                .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], AllocationLine::new(b, Decimal::from(50)));
        assert_eq!(plan[1], AllocationLine::new(a, Decimal::from(70)));
        // 規劃不改變存放區狀態
        assert_eq!(store.get(a).unwrap().quantity_remaining, Decimal::from(100));
        assert_eq!(store.get(b).unwrap().quantity_remaining, Decimal::from(50));
    }

    #[test]
    fn test_plan_insufficient_carries_availability() {
        let mut store = BatchStore::new();
        seed(&mut store, "STK-IN-0001", 100, NaiveDate::from_ymd_opt(2025, 1, 10));
        seed(&mut store, "STK-IN-0002", 50, NaiveDate::from_ymd_opt(2025, 1, 5));

        let err =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(200), &HashMap::new())
                .unwrap_err();

        match err {
            StockError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, Decimal::from(200));
                assert_eq!(available, Decimal::from(150));
            }
            other => panic!("預期 InsufficientStock，得到 {other:?}"),
        }
    }

    #[test]
    fn test_plan_rejects_non_positive_request() {
        let store = BatchStore::new();
        let err =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::ZERO, &HashMap::new())
                .unwrap_err();
        assert!(matches!(err, StockError::InvalidRequest(_)));

        let err =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(-5), &HashMap::new())
                .unwrap_err();
        assert!(matches!(err, StockError::InvalidRequest(_)));
    }

    #[test]
    fn test_plan_respects_reserved_overlay() {
        let mut store = BatchStore::new();
        let a = seed(&mut store, "STK-IN-0001", 100, None);

        // 先行明細已預佔 80，剩 20 可用
        let mut reserved = HashMap::new();
        reserved.insert(a, Decimal::from(80));

        let plan =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(20), &reserved)
                .unwrap();
        assert_eq!(plan, vec![AllocationLine::new(a, Decimal::from(20))]);

        let err =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(21), &reserved)
                .unwrap_err();
        match err {
            StockError::InsufficientStock { available, .. } => {
                assert_eq!(available, Decimal::from(20));
            }
            other => panic!("預期 InsufficientStock，得到 {other:?}"),
        }
    }

    #[test]
    fn test_plan_undated_batches_after_dated() {
        let mut store = BatchStore::new();
        let undated = seed(&mut store, "STK-IN-0001", 40, None);
        let dated = seed(
            &mut store,
            "STK-IN-0002",
            30,
            NaiveDate::from_ymd_opt(2025, 6, 1),
        );

        let plan =
            AllocationPlanner::plan(&store, "PROD-001", "WH-01", Decimal::from(50), &HashMap::new())
                .unwrap();

        // 有效期批次先耗盡，無效期批次補足
        assert_eq!(plan[0], AllocationLine::new(dated, Decimal::from(30)));
        assert_eq!(plan[1], AllocationLine::new(undated, Decimal::from(20)));
    }

    #[test]
    fn test_available() {
        let mut store = BatchStore::new();
        seed(&mut store, "STK-IN-0001", 100, None);
        seed(&mut store, "STK-IN-0002", 50, None);

        assert_eq!(
            AllocationPlanner::available(&store, "PROD-001", "WH-01"),
            Decimal::from(150)
        );
        assert_eq!(
            AllocationPlanner::available(&store, "PROD-404", "WH-01"),
            Decimal::ZERO
        );
    }
}
