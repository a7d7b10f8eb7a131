//! 到期警示清單
//!
//! 自庫存帳快照推導：僅納入剩餘量 > 0 且有效期的批次；
//! 無效期批次不回報（回報路徑以可用性優先，不視為錯誤）。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stock_ledger::StockLedger;
use uuid::Uuid;

use crate::expiry::{classify, days_until, is_within_look_ahead, ExpiryStatus};

/// 單一批次的到期警示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryAlert {
    /// 批次ID
    pub batch_id: Uuid,

    /// 批次代碼
    pub batch_code: String,

    /// 商品ID
    pub product_id: String,

    /// 倉庫ID
    pub warehouse_id: String,

    /// 剩餘數量
    pub quantity_remaining: Decimal,

    /// 效期
    pub expiry_date: NaiveDate,

    /// 距到期天數（過期為負）
    pub days_until_expiry: i64,

    /// 警示狀態
    pub status: ExpiryStatus,
}

/// 列出前瞻窗口內的到期警示
///
/// # 參數
/// * `look_ahead_days` - 回報窗口（天）；已過期批次一律回報
/// * `scope` - 倉庫過濾，None 表示全部倉庫
///
/// 結果依效期升冪排序，同效期依批次ID決勝（輸出順序可重現）。
pub fn list_expiry_alerts(
    ledger: &StockLedger,
    today: NaiveDate,
    look_ahead_days: i64,
    expiring_soon_threshold_days: i64,
    scope: Option<&str>,
) -> Vec<ExpiryAlert> {
    let batches = match scope {
        Some(warehouse_id) => ledger.batches_in(warehouse_id),
        None => ledger.batches(),
    };

    let mut alerts: Vec<ExpiryAlert> = batches
        .into_iter()
        .filter(|b| b.is_eligible())
        .filter_map(|b| {
            let expiry = b.expiry_date?;
            let days = days_until(expiry, today);
            let status = classify(expiry, today, expiring_soon_threshold_days);
            if !is_within_look_ahead(status, days, look_ahead_days) {
                return None;
            }
            Some(ExpiryAlert {
                batch_id: b.id,
                batch_code: b.source_ref.clone(),
                product_id: b.product_id,
                warehouse_id: b.warehouse_id,
                quantity_remaining: b.quantity_remaining,
                expiry_date: expiry,
                days_until_expiry: days,
                status,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then_with(|| a.batch_id.cmp(&b.batch_id))
    });

    tracing::debug!(
        "到期警示：窗口 {} 天，範圍 {:?}，共 {} 筆",
        look_ahead_days,
        scope,
        alerts.len()
    );
    alerts
}
