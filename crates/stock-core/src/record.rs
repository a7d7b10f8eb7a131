//! 單據模型（入庫 / 調撥 / 退貨）

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::AllocationLine;

/// 單據狀態
///
/// 單據建立即提交（無持久化的草稿態）；
/// 所有明細被移除後轉為 Reversed。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    /// 已提交
    Committed,
    /// 已全數沖銷
    Reversed,
}

/// 退貨來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnSource {
    /// 販賣機（退貨前檢查其推導庫存）
    VendingMachine(String),
    /// 倉庫（無條件入帳，政策缺口見設計文件）
    Warehouse(String),
}

impl ReturnSource {
    /// 若來源為販賣機則返回其ID
    pub fn machine_id(&self) -> Option<&str> {
        match self {
            ReturnSource::VendingMachine(id) => Some(id),
            ReturnSource::Warehouse(_) => None,
        }
    }

    /// 來源ID（不分類型）
    pub fn source_id(&self) -> &str {
        match self {
            ReturnSource::VendingMachine(id) | ReturnSource::Warehouse(id) => id,
        }
    }
}

/// 入庫請求明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveLine {
    /// 商品ID
    pub product_id: String,
    /// 入庫數量
    pub quantity: Decimal,
    /// 效期
    pub expiry_date: Option<NaiveDate>,
}

/// 調撥請求明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequestLine {
    /// 商品ID
    pub product_id: String,
    /// 調撥數量
    pub quantity: Decimal,
}

/// 退貨請求明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestLine {
    /// 商品ID
    pub product_id: String,
    /// 退貨數量
    pub quantity: Decimal,
    /// 效期
    pub expiry_date: Option<NaiveDate>,
}

/// 已提交的入庫明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInLine {
    pub product_id: String,
    pub quantity: Decimal,
    pub expiry_date: Option<NaiveDate>,
    /// 入帳的批次ID
    pub batch_id: Uuid,
}

/// 已提交的調撥明細（記錄分配結果以支持精確沖銷）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLine {
    pub product_id: String,
    pub quantity: Decimal,
    /// 提交時由分配規劃器產生的批次取用明細
    pub allocations: Vec<AllocationLine>,
}

/// 已提交的退貨明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLine {
    pub product_id: String,
    pub quantity: Decimal,
    pub expiry_date: Option<NaiveDate>,
    /// 入帳的批次ID（沖銷時據此扣回）
    pub batch_id: Uuid,
}

/// 入庫單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInRecord {
    /// 單據ID
    pub id: Uuid,

    /// 單據編號（如 STK-IN-0001）
    pub code: String,

    /// 目的倉庫
    pub warehouse_id: String,

    /// 入庫日期
    pub date: NaiveDate,

    /// 明細
    pub lines: Vec<StockInLine>,

    /// 單據狀態
    pub state: RecordState,
}

/// 調撥單（倉庫 → 販賣機）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    /// 單據ID
    pub id: Uuid,

    /// 單據編號（如 TRF-0001）
    pub code: String,

    /// 來源倉庫
    pub from_warehouse_id: String,

    /// 目的販賣機
    pub to_machine_id: String,

    /// 調撥日期
    pub date: NaiveDate,

    /// 明細
    pub lines: Vec<TransferLine>,

    /// 單據狀態
    pub state: RecordState,
}

/// 退貨單（販賣機/倉庫 → 倉庫）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// 單據ID
    pub id: Uuid,

    /// 單據編號（如 RTN-0001）
    pub code: String,

    /// 退貨來源
    pub source: ReturnSource,

    /// 目的倉庫
    pub warehouse_id: String,

    /// 退貨日期
    pub date: NaiveDate,

    /// 明細
    pub lines: Vec<ReturnLine>,

    /// 單據狀態
    pub state: RecordState,
}

impl TransferRecord {
    /// 查找指定商品的明細
    pub fn find_line(&self, product_id: &str) -> Option<&TransferLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// 指定商品的調撥總量
    pub fn quantity_of(&self, product_id: &str) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// 檢查是否已全數沖銷
    pub fn is_reversed(&self) -> bool {
        self.state == RecordState::Reversed
    }
}

impl ReturnRecord {
    /// 指定商品的退貨總量
    pub fn quantity_of(&self, product_id: &str) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// 檢查退貨來源是否為指定販賣機
    pub fn is_from_machine(&self, machine_id: &str) -> bool {
        self.source.machine_id() == Some(machine_id)
    }

    /// 檢查是否已全數沖銷
    pub fn is_reversed(&self) -> bool {
        self.state == RecordState::Reversed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_record() -> TransferRecord {
        TransferRecord {
            id: Uuid::new_v4(),
            code: "TRF-0001".to_string(),
            from_warehouse_id: "WH-01".to_string(),
            to_machine_id: "VM-01".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            lines: vec![TransferLine {
                product_id: "PROD-001".to_string(),
                quantity: Decimal::from(120),
                allocations: vec![
                    AllocationLine::new(Uuid::new_v4(), Decimal::from(50)),
                    AllocationLine::new(Uuid::new_v4(), Decimal::from(70)),
                ],
            }],
            state: RecordState::Committed,
        }
    }

    #[test]
    fn test_transfer_record_lookup() {
        let record = transfer_record();

        assert!(record.find_line("PROD-001").is_some());
        assert!(record.find_line("PROD-999").is_none());
        assert_eq!(record.quantity_of("PROD-001"), Decimal::from(120));
        assert_eq!(record.quantity_of("PROD-999"), Decimal::ZERO);
        assert!(!record.is_reversed());
    }

    #[test]
    fn test_return_source() {
        let machine = ReturnSource::VendingMachine("VM-01".to_string());
        let warehouse = ReturnSource::Warehouse("WH-02".to_string());

        assert_eq!(machine.machine_id(), Some("VM-01"));
        assert_eq!(warehouse.machine_id(), None);
        assert_eq!(machine.source_id(), "VM-01");
        assert_eq!(warehouse.source_id(), "WH-02");
    }

    #[test]
    fn test_return_record_from_machine() {
        let record = ReturnRecord {
            id: Uuid::new_v4(),
            code: "RTN-0001".to_string(),
            source: ReturnSource::VendingMachine("VM-01".to_string()),
            warehouse_id: "WH-01".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            lines: vec![ReturnLine {
                product_id: "PROD-001".to_string(),
                quantity: Decimal::from(15),
                expiry_date: None,
                batch_id: Uuid::new_v4(),
            }],
            state: RecordState::Committed,
        };

        assert!(record.is_from_machine("VM-01"));
        assert!(!record.is_from_machine("VM-02"));
        assert_eq!(record.quantity_of("PROD-001"), Decimal::from(15));
    }
}
