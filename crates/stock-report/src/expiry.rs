//! 效期分級
//!
//! 純函數：由效期與參考日推導警示狀態與剩餘天數。
//! 日期為純日期（無時間成分），天數差即為整數，無截斷誤差。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 預設「即將到期」門檻（天）
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 7;

/// 效期警示狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryStatus {
    /// 已過期（效期早於今日）
    Expired,
    /// 即將到期（剩餘天數 <= 門檻；效期等於今日也屬此級）
    ExpiringSoon,
    /// 提醒
    Warning,
}

/// 距到期天數（效期 - 今日；過期為負值）
pub fn days_until(expiry_date: NaiveDate, today: NaiveDate) -> i64 {
    (expiry_date - today).num_days()
}

/// 效期分級
///
/// 效期早於今日 → Expired；剩餘天數 <= 門檻 → ExpiringSoon；否則 Warning。
/// 效期等於今日尚未過期，剩餘 0 天 → ExpiringSoon。
pub fn classify(
    expiry_date: NaiveDate,
    today: NaiveDate,
    expiring_soon_threshold_days: i64,
) -> ExpiryStatus {
    if expiry_date < today {
        ExpiryStatus::Expired
    } else if days_until(expiry_date, today) <= expiring_soon_threshold_days {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Warning
    }
}

/// 回報範圍過濾：批次是否進入指定前瞻窗口的警示清單
///
/// 已過期者一律回報；其餘依剩餘天數與前瞻天數比較。
/// 此為回報範圍決策，與上面的狀態分級互相獨立——
/// Warning 狀態的批次可能被 7 天窗口排除、卻被 30 天窗口納入。
pub fn is_within_look_ahead(status: ExpiryStatus, days_until_expiry: i64, look_ahead_days: i64) -> bool {
    match status {
        ExpiryStatus::Expired => true,
        _ => days_until_expiry <= look_ahead_days,
    }
}
