//! 彙總快取
//!
//! 以帳本版本號判斷失效：每個範圍保存上次投影結果與當時的版本號，
//! 版本未變直接回傳快取，版本變動才重新投影。

use std::collections::HashMap;

use chrono::NaiveDate;
use stock_ledger::StockLedger;
use stock_report::{StockSummary, SummaryOptions, SummaryProjector};

/// 快取項：投影結果與其對應的帳本版本
#[derive(Debug, Clone)]
struct CachedSummary {
    revision: u64,
    summary: StockSummary,
}

/// 範圍鍵（None 範圍以 "*" 表示）
fn scope_key(scope: Option<&str>) -> String {
    scope.unwrap_or("*").to_string()
}

/// 彙總快取
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: HashMap<String, CachedSummary>,
}

impl SummaryCache {
    /// 創建空的快取
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得彙總：版本未變時回傳快取，否則重新投影並更新快取
    pub fn get_or_project(
        &mut self,
        ledger: &StockLedger,
        scope: Option<&str>,
        today: NaiveDate,
        opts: &SummaryOptions,
    ) -> StockSummary {
        let revision = ledger.revision();
        let key = scope_key(scope);

        if let Some(cached) = self.entries.get(&key) {
            if cached.revision == revision {
                return cached.summary.clone();
            }
        }

        let summary = SummaryProjector::project(ledger, scope, today, opts);
        self.entries.insert(
            key,
            CachedSummary {
                revision,
                summary: summary.clone(),
            },
        );
        summary
    }

    /// 檢查指定範圍的快取是否仍新鮮
    pub fn is_fresh(&self, ledger: &StockLedger, scope: Option<&str>) -> bool {
        self.entries
            .get(&scope_key(scope))
            .is_some_and(|c| c.revision == ledger.revision())
    }

    /// 丟棄全部快取
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}
