//! FEFO 分配完整範例
//!
//! 展示從入庫到調撥、退貨、沖銷與警示報表的完整帳務流程

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stock::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("===== FEFO Stock Ledger Example =====\n");

    let ledger = StockLedger::new();
    let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

    // 步驟 1: 入庫兩個批次（效期不同）
    println!("[1] Receive Stock");
    let rec_a = ledger.receive(
        "WH-01",
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        vec![ReceiveLine {
            product_id: "COLA-330".to_string(),
            quantity: Decimal::from(100),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 20),
        }],
    )?;
    let rec_b = ledger.receive(
        "WH-01",
        NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
        vec![ReceiveLine {
            product_id: "COLA-330".to_string(),
            quantity: Decimal::from(50),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 12),
        }],
    )?;
    println!("    {}: 100 cans, expiry 2025-01-20", rec_a.code);
    println!("    {}: 50 cans, expiry 2025-01-12\n", rec_b.code);

    // 步驟 2: 調撥 120 罐至販賣機（FEFO：先耗效期早的批次）
    println!("[2] Transfer to Vending Machine");
    let transfer = ledger.transfer_out(
        "WH-01",
        "VM-07",
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        vec![TransferRequestLine {
            product_id: "COLA-330".to_string(),
            quantity: Decimal::from(120),
        }],
    )?;
    for alloc in &transfer.lines[0].allocations {
        let batch = ledger.batch(alloc.batch_id).unwrap();
        println!(
            "    take {} from batch {} (expiry {:?})",
            alloc.quantity,
            batch.batch_code(),
            batch.expiry_date
        );
    }
    println!(
        "    warehouse remaining: {}\n",
        ledger.available_stock("COLA-330", "WH-01")
    );

    // 步驟 3: 機台退貨 10 罐
    println!("[3] Return from Machine");
    let returned = ledger.return_in(
        ReturnSource::VendingMachine("VM-07".to_string()),
        "WH-01",
        NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
        vec![ReturnRequestLine {
            product_id: "COLA-330".to_string(),
            quantity: Decimal::from(10),
            expiry_date: None,
        }],
    )?;
    println!(
        "    {}: machine stock now {}\n",
        returned.code,
        ledger.machine_stock("VM-07", "COLA-330")
    );

    // 步驟 4: 到期警示（7 天窗口）
    println!("[4] Expiry Alerts (30-day window)");
    for alert in list_expiry_alerts(&ledger, today, 30, 7, None) {
        println!(
            "    {:?}: batch {} of {} — {} left, {} day(s) to expiry",
            alert.status,
            alert.batch_code,
            alert.product_id,
            alert.quantity_remaining,
            alert.days_until_expiry
        );
    }
    println!();

    // 步驟 5: 彙總（經快取）
    println!("[5] Summary");
    let mut cache = SummaryCache::new();
    let summary = cache.get_or_project(&ledger, None, today, &SummaryOptions::default());
    println!("    total available: {}", summary.total_available);
    println!("    expiring soon batches: {}", summary.expiring_soon_batches);
    println!("    low stock items: {}\n", summary.low_stock_items);

    // 步驟 6: 沖銷調撥明細，批次數量精確回復
    println!("[6] Reverse the Transfer Line");
    ledger.remove_transfer_line(transfer.id, "COLA-330")?;
    println!(
        "    warehouse restored to: {}",
        ledger.available_stock("COLA-330", "WH-01")
    );

    Ok(())
}
