//! 庫存帳操作
//!
//! 四種變動操作（入庫 / 調撥 / 退貨 / 沖銷）的唯一入口。
//! 所有狀態由單一 RwLock 保護：變動操作持寫鎖執行「整單規劃 → 整單提交」，
//! 即一次可序列化交易；鎖內不做任何外部 I/O。
//! 販賣機庫存為已提交單據的純投影，不另存餘額表。

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stock_core::{
    AllocationLine, Batch, BatchSource, ReceiveLine, RecordState, ReturnLine, ReturnRecord,
    ReturnRequestLine, ReturnSource, StockError, StockInLine, StockInRecord, TransferLine,
    TransferRecord, TransferRequestLine,
};
use uuid::Uuid;

use crate::planner::AllocationPlanner;
use crate::store::{BatchCredit, BatchStore};

/// 帳內狀態（整體受鎖保護）
#[derive(Debug, Default)]
struct LedgerState {
    store: BatchStore,
    stock_ins: HashMap<Uuid, StockInRecord>,
    transfers: HashMap<Uuid, TransferRecord>,
    returns: HashMap<Uuid, ReturnRecord>,
    stock_in_seq: u64,
    transfer_seq: u64,
    return_seq: u64,
    revision: u64,
}

impl LedgerState {
    /// 販賣機推導庫存 = 已提交調入總量 - 已提交退出總量
    fn machine_stock(&self, machine_id: &str, product_id: &str) -> Decimal {
        let transferred: Decimal = self
            .transfers
            .values()
            .filter(|t| t.to_machine_id == machine_id)
            .map(|t| t.quantity_of(product_id))
            .sum();

        let returned: Decimal = self
            .returns
            .values()
            .filter(|r| r.is_from_machine(machine_id))
            .map(|r| r.quantity_of(product_id))
            .sum();

        transferred - returned
    }
}

/// 庫存帳
///
/// 批次存放區與單據的單一事實來源；彙總/警示視圖皆由此推導。
#[derive(Debug, Default)]
pub struct StockLedger {
    state: RwLock<LedgerState>,
}

impl StockLedger {
    /// 創建空的庫存帳
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().expect("庫存帳鎖已中毒")
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().expect("庫存帳鎖已中毒")
    }

    /// 入庫（Stock-In）
    ///
    /// 每條明細入帳一個批次（同鍵批次合併）。除輸入驗證外不會失敗。
    pub fn receive(
        &self,
        warehouse_id: &str,
        date: NaiveDate,
        lines: Vec<ReceiveLine>,
    ) -> stock_core::Result<StockInRecord> {
        if lines.is_empty() {
            return Err(StockError::InvalidRequest("入庫明細不可為空".to_string()));
        }
        for line in &lines {
            validate_quantity(&line.product_id, line.quantity)?;
        }

        let mut state = self.write();
        state.stock_in_seq += 1;
        let code = format!("STK-IN-{:04}", state.stock_in_seq);

        let mut committed = Vec::with_capacity(lines.len());
        for line in lines {
            let batch_id = state.store.credit(
                BatchCredit {
                    product_id: line.product_id.clone(),
                    warehouse_id: warehouse_id.to_string(),
                    source: BatchSource::StockIn,
                    source_ref: code.clone(),
                    expiry_date: line.expiry_date,
                    date_in: date,
                },
                line.quantity,
            );
            committed.push(StockInLine {
                product_id: line.product_id,
                quantity: line.quantity,
                expiry_date: line.expiry_date,
                batch_id,
            });
        }

        let record = StockInRecord {
            id: Uuid::new_v4(),
            code: code.clone(),
            warehouse_id: warehouse_id.to_string(),
            date,
            lines: committed,
            state: RecordState::Committed,
        };
        state.stock_ins.insert(record.id, record.clone());
        state.revision += 1;

        tracing::info!(
            "入庫完成：{} @ {}，明細 {} 筆",
            code,
            warehouse_id,
            record.lines.len()
        );
        Ok(record)
    }

    /// 調撥出庫（倉庫 → 販賣機）
    ///
    /// 先對全部明細完成規劃，任一明細不足即整單失敗、零扣帳；
    /// 全部成功才逐筆扣帳並記錄分配明細（供精確沖銷）。
    pub fn transfer_out(
        &self,
        from_warehouse_id: &str,
        to_machine_id: &str,
        date: NaiveDate,
        lines: Vec<TransferRequestLine>,
    ) -> stock_core::Result<TransferRecord> {
        if lines.is_empty() {
            return Err(StockError::InvalidRequest("調撥明細不可為空".to_string()));
        }
        for line in &lines {
            validate_quantity(&line.product_id, line.quantity)?;
        }
        // 同商品多明細合併為一條，於單一一致快照上規劃
        let merged = merge_transfer_lines(lines);

        let mut state = self.write();

        // 規劃階段：零副作用
        let mut reserved: HashMap<Uuid, Decimal> = HashMap::new();
        let mut planned: Vec<(TransferRequestLine, Vec<AllocationLine>)> =
            Vec::with_capacity(merged.len());
        for line in merged {
            tracing::debug!(
                "規劃分配：{} x {} 自 {}",
                line.product_id,
                line.quantity,
                from_warehouse_id
            );
            let allocations = AllocationPlanner::plan(
                &state.store,
                &line.product_id,
                from_warehouse_id,
                line.quantity,
                &reserved,
            )?;
            for alloc in &allocations {
                *reserved.entry(alloc.batch_id).or_insert(Decimal::ZERO) += alloc.quantity;
            }
            planned.push((line, allocations));
        }

        // 提交階段：整單規劃已確認，逐筆扣帳
        state.transfer_seq += 1;
        let code = format!("TRF-{:04}", state.transfer_seq);

        let mut committed = Vec::with_capacity(planned.len());
        for (line, allocations) in planned {
            for alloc in &allocations {
                state.store.debit(alloc.batch_id, alloc.quantity)?;
            }
            committed.push(TransferLine {
                product_id: line.product_id,
                quantity: line.quantity,
                allocations,
            });
        }

        let record = TransferRecord {
            id: Uuid::new_v4(),
            code: code.clone(),
            from_warehouse_id: from_warehouse_id.to_string(),
            to_machine_id: to_machine_id.to_string(),
            date,
            lines: committed,
            state: RecordState::Committed,
        };
        state.transfers.insert(record.id, record.clone());
        state.revision += 1;

        tracing::info!(
            "調撥完成：{} {} → {}，明細 {} 筆",
            code,
            from_warehouse_id,
            to_machine_id,
            record.lines.len()
        );
        Ok(record)
    }

    /// 退貨入庫（販賣機/倉庫 → 倉庫）
    ///
    /// 來源為販賣機時，逐商品檢查其推導庫存是否足以涵蓋退貨總量，
    /// 不足則整單失敗、零入帳；倉庫來源無條件入帳（觀察到的既有政策）。
    pub fn return_in(
        &self,
        source: ReturnSource,
        to_warehouse_id: &str,
        date: NaiveDate,
        lines: Vec<ReturnRequestLine>,
    ) -> stock_core::Result<ReturnRecord> {
        if lines.is_empty() {
            return Err(StockError::InvalidRequest("退貨明細不可為空".to_string()));
        }
        for line in &lines {
            validate_quantity(&line.product_id, line.quantity)?;
        }
        let merged = merge_return_lines(lines);

        let mut state = self.write();

        if let Some(machine_id) = source.machine_id() {
            // 逐商品彙總後檢查推導庫存
            let mut per_product: HashMap<&str, Decimal> = HashMap::new();
            for line in &merged {
                *per_product
                    .entry(line.product_id.as_str())
                    .or_insert(Decimal::ZERO) += line.quantity;
            }
            for (product_id, requested) in per_product {
                let available = state.machine_stock(machine_id, product_id);
                if requested > available {
                    return Err(StockError::InsufficientSourceStock {
                        product_id: product_id.to_string(),
                        machine_id: machine_id.to_string(),
                        requested,
                        available,
                    });
                }
            }
        }

        state.return_seq += 1;
        let code = format!("RTN-{:04}", state.return_seq);

        let mut committed = Vec::with_capacity(merged.len());
        for line in merged {
            let batch_id = state.store.credit(
                BatchCredit {
                    product_id: line.product_id.clone(),
                    warehouse_id: to_warehouse_id.to_string(),
                    source: BatchSource::StockReturn,
                    source_ref: code.clone(),
                    expiry_date: line.expiry_date,
                    date_in: date,
                },
                line.quantity,
            );
            committed.push(ReturnLine {
                product_id: line.product_id,
                quantity: line.quantity,
                expiry_date: line.expiry_date,
                batch_id,
            });
        }

        let record = ReturnRecord {
            id: Uuid::new_v4(),
            code: code.clone(),
            source,
            warehouse_id: to_warehouse_id.to_string(),
            date,
            lines: committed,
            state: RecordState::Committed,
        };
        state.returns.insert(record.id, record.clone());
        state.revision += 1;

        tracing::info!(
            "退貨完成：{} → {}，明細 {} 筆",
            code,
            to_warehouse_id,
            record.lines.len()
        );
        Ok(record)
    }

    /// 沖銷調撥明細：回帳該商品當初取用的每一筆分配，並自單據移除明細
    ///
    /// 回帳不設上限，找到明細後不會失敗。
    pub fn remove_transfer_line(
        &self,
        transfer_id: Uuid,
        product_id: &str,
    ) -> stock_core::Result<TransferRecord> {
        let mut state = self.write();

        let allocations: Vec<AllocationLine> = {
            let record = state
                .transfers
                .get(&transfer_id)
                .ok_or(StockError::RecordNotFound(transfer_id))?;
            let line = record
                .find_line(product_id)
                .ok_or_else(|| StockError::LineNotFound {
                    record_id: transfer_id,
                    product_id: product_id.to_string(),
                })?;
            line.allocations.clone()
        };

        for alloc in &allocations {
            state.store.restore(alloc.batch_id, alloc.quantity)?;
        }

        let record = state
            .transfers
            .get_mut(&transfer_id)
            .ok_or(StockError::RecordNotFound(transfer_id))?;
        record.lines.retain(|l| l.product_id != product_id);
        if record.lines.is_empty() {
            record.state = RecordState::Reversed;
        }
        let snapshot = record.clone();
        state.revision += 1;

        tracing::info!(
            "沖銷調撥明細：{} 商品 {}，回帳 {} 筆分配",
            snapshot.code,
            product_id,
            allocations.len()
        );
        Ok(snapshot)
    }

    /// 沖銷退貨明細：自當初入帳的批次扣回退貨量，並自單據移除明細
    ///
    /// 該批次的入帳若已被後續操作消耗至不足，返回 `InsufficientQuantity`
    /// 且狀態完全不變（先整體檢查、後整體扣帳）。
    pub fn remove_return_line(
        &self,
        return_id: Uuid,
        product_id: &str,
    ) -> stock_core::Result<ReturnRecord> {
        let mut state = self.write();

        let to_debit: Vec<(Uuid, Decimal)> = {
            let record = state
                .returns
                .get(&return_id)
                .ok_or(StockError::RecordNotFound(return_id))?;
            let lines: Vec<_> = record
                .lines
                .iter()
                .filter(|l| l.product_id == product_id)
                .map(|l| (l.batch_id, l.quantity))
                .collect();
            if lines.is_empty() {
                return Err(StockError::LineNotFound {
                    record_id: return_id,
                    product_id: product_id.to_string(),
                });
            }
            lines
        };

        // 先檢查全部批次可扣，再執行扣帳（無部分沖銷）
        for &(batch_id, quantity) in &to_debit {
            let remaining = state
                .store
                .get(batch_id)
                .map(|b| b.quantity_remaining)
                .ok_or_else(|| StockError::InvalidRequest(format!("找不到批次: {batch_id}")))?;
            if quantity > remaining {
                return Err(StockError::InsufficientQuantity {
                    batch_id,
                    requested: quantity,
                    remaining,
                });
            }
        }
        for &(batch_id, quantity) in &to_debit {
            state.store.debit(batch_id, quantity)?;
        }

        let record = state
            .returns
            .get_mut(&return_id)
            .ok_or(StockError::RecordNotFound(return_id))?;
        record.lines.retain(|l| l.product_id != product_id);
        if record.lines.is_empty() {
            record.state = RecordState::Reversed;
        }
        let snapshot = record.clone();
        state.revision += 1;

        tracing::info!("沖銷退貨明細：{} 商品 {}", snapshot.code, product_id);
        Ok(snapshot)
    }

    /// 查詢倉庫可用量（剩餘量總和）
    pub fn available_stock(&self, product_id: &str, warehouse_id: &str) -> Decimal {
        AllocationPlanner::available(&self.read().store, product_id, warehouse_id)
    }

    /// 查詢販賣機推導庫存
    pub fn machine_stock(&self, machine_id: &str, product_id: &str) -> Decimal {
        self.read().machine_stock(machine_id, product_id)
    }

    /// 以ID查詢批次
    pub fn batch(&self, batch_id: Uuid) -> Option<Batch> {
        self.read().store.get(batch_id).cloned()
    }

    /// 全部批次快照（含歷史批次）
    pub fn batches(&self) -> Vec<Batch> {
        self.read().store.iter().cloned().collect()
    }

    /// 指定倉庫的批次快照
    pub fn batches_in(&self, warehouse_id: &str) -> Vec<Batch> {
        self.read()
            .store
            .iter()
            .filter(|b| b.warehouse_id == warehouse_id)
            .cloned()
            .collect()
    }

    /// 已提交調撥單快照
    pub fn committed_transfers(&self) -> Vec<TransferRecord> {
        self.read().transfers.values().cloned().collect()
    }

    /// 以ID查詢調撥單
    pub fn transfer(&self, transfer_id: Uuid) -> Option<TransferRecord> {
        self.read().transfers.get(&transfer_id).cloned()
    }

    /// 以ID查詢退貨單
    pub fn return_record(&self, return_id: Uuid) -> Option<ReturnRecord> {
        self.read().returns.get(&return_id).cloned()
    }

    /// 以ID查詢入庫單
    pub fn stock_in(&self, stock_in_id: Uuid) -> Option<StockInRecord> {
        self.read().stock_ins.get(&stock_in_id).cloned()
    }

    /// 版本號：每次成功變動遞增一次，快取層據此判斷失效
    pub fn revision(&self) -> u64 {
        self.read().revision
    }
}

fn validate_quantity(product_id: &str, quantity: Decimal) -> stock_core::Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::InvalidRequest(format!(
            "商品 {product_id} 的數量必須為正數: {quantity}"
        )));
    }
    Ok(())
}

/// 合併同商品的調撥明細（保持首見順序）
fn merge_transfer_lines(lines: Vec<TransferRequestLine>) -> Vec<TransferRequestLine> {
    let mut merged: Vec<TransferRequestLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }
    merged
}

/// 合併同 (商品, 效期) 的退貨明細（保持首見順序）
fn merge_return_lines(lines: Vec<ReturnRequestLine>) -> Vec<ReturnRequestLine> {
    let mut merged: Vec<ReturnRequestLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged
            .iter_mut()
            .find(|l| l.product_id == line.product_id && l.expiry_date == line.expiry_date)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }
    merged
}
