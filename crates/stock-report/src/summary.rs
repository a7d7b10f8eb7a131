//! 彙總投影
//!
//! 自批次快照與已提交調撥單推導的讀取視圖，永不作為事實來源；
//! 可隨時重算，亦可交由 stock-cache 以版本號快取。

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stock_ledger::StockLedger;

use crate::expiry::{classify, ExpiryStatus, DEFAULT_EXPIRING_SOON_DAYS};

/// 彙總選項
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// 「即將到期」門檻（天）
    pub expiring_soon_threshold_days: i64,

    /// 低庫存門檻：(商品, 倉庫) 可用總量低於此值即計入
    pub low_stock_threshold: Decimal,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            expiring_soon_threshold_days: DEFAULT_EXPIRING_SOON_DAYS,
            low_stock_threshold: Decimal::from(10),
        }
    }
}

/// 庫存彙總
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    /// 可用總量（全部批次剩餘量之和）
    pub total_available: Decimal,

    /// 已過期批次數
    pub expired_batches: usize,

    /// 即將到期批次數
    pub expiring_soon_batches: usize,

    /// 低庫存品項數（依 (商品, 倉庫) 分組）
    pub low_stock_items: usize,
}

/// 單一商品的調撥總量（排行用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTransferTotal {
    /// 商品ID
    pub product_id: String,

    /// 窗口內調撥總量
    pub total_quantity: Decimal,
}

/// 彙總投影器
pub struct SummaryProjector;

impl SummaryProjector {
    /// 計算庫存彙總
    ///
    /// # 參數
    /// * `scope` - 倉庫過濾，None 表示全部倉庫
    pub fn project(
        ledger: &StockLedger,
        scope: Option<&str>,
        today: NaiveDate,
        opts: &SummaryOptions,
    ) -> StockSummary {
        let batches = match scope {
            Some(warehouse_id) => ledger.batches_in(warehouse_id),
            None => ledger.batches(),
        };

        let total_available: Decimal = batches
            .par_iter()
            .map(|b| b.quantity_remaining)
            .reduce(|| Decimal::ZERO, |a, b| a + b);

        let mut expired_batches = 0;
        let mut expiring_soon_batches = 0;
        for batch in batches.iter().filter(|b| b.is_eligible()) {
            if let Some(expiry) = batch.expiry_date {
                match classify(expiry, today, opts.expiring_soon_threshold_days) {
                    ExpiryStatus::Expired => expired_batches += 1,
                    ExpiryStatus::ExpiringSoon => expiring_soon_batches += 1,
                    ExpiryStatus::Warning => {}
                }
            }
        }

        // 低庫存：(商品, 倉庫) 可用總量低於門檻
        let mut totals: HashMap<(&str, &str), Decimal> = HashMap::new();
        for batch in &batches {
            *totals
                .entry((batch.product_id.as_str(), batch.warehouse_id.as_str()))
                .or_insert(Decimal::ZERO) += batch.quantity_remaining;
        }
        let low_stock_items = totals
            .values()
            .filter(|&&total| total < opts.low_stock_threshold)
            .count();

        StockSummary {
            total_available,
            expired_batches,
            expiring_soon_batches,
            low_stock_items,
        }
    }

    /// 熱門調撥商品排行：回溯窗口內依調撥總量取前 N 名
    ///
    /// 同量者依商品ID升冪決勝（輸出順序可重現）。
    pub fn most_transferred(
        ledger: &StockLedger,
        top_n: usize,
        window_days: i64,
        today: NaiveDate,
    ) -> Vec<ProductTransferTotal> {
        let cutoff = today - Duration::days(window_days);

        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for transfer in ledger.committed_transfers() {
            if transfer.date < cutoff || transfer.date > today {
                continue;
            }
            for line in &transfer.lines {
                *totals
                    .entry(line.product_id.clone())
                    .or_insert(Decimal::ZERO) += line.quantity;
            }
        }

        let mut ranked: Vec<ProductTransferTotal> = totals
            .into_iter()
            .map(|(product_id, total_quantity)| ProductTransferTotal {
                product_id,
                total_quantity,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(top_n);
        ranked
    }
}
