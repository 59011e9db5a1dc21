// ==========================================
// 地磅称重系统 - 演示数据初始化
// ==========================================
// 用法: seed_demo_data [db_path]
// 已存在的数据库先备份为 <db_path>.bak.<时间戳> 再重建
// ==========================================

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;

use truck_weighbridge::app::{get_default_db_path, AppState};
use truck_weighbridge::db::{DEFAULT_STOCK_LOCATION_ID, DEFAULT_SUPPLIER_LOCATION_ID};
use truck_weighbridge::domain::{
    Operator, OrderKind, OrderState, Partner, PickingState, PickingType, Product,
    ScaleConnection, StockLocation, StockMove, StockPicking, TradeOrder, TradeOrderLine, Truck,
    WeighingScale,
};
use truck_weighbridge::LocationUsage;

fn main() -> Result<(), Box<dyn Error>> {
    truck_weighbridge::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    seed(&state)?;

    eprintln!("演示数据已写入 {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed(state: &AppState) -> Result<(), Box<dyn Error>> {
    let now = Local::now().naive_local();

    // ===== 地磅与操作员 =====
    state.scale_repo.upsert_scale(&WeighingScale {
        scale_id: "SCALE-1".to_string(),
        name: "1号地磅（人工）".to_string(),
        enabled: true,
        connection: ScaleConnection::Manual { weight_kg: 0.0 },
    })?;
    state.scale_repo.upsert_scale(&WeighingScale {
        scale_id: "SCALE-2".to_string(),
        name: "2号地磅（TCP 仪表）".to_string(),
        enabled: true,
        connection: ScaleConnection::Tcp {
            host: "127.0.0.1".to_string(),
            port: 4001,
        },
    })?;
    state.scale_repo.upsert_operator(&Operator {
        user_id: "admin".to_string(),
        name: "磅房管理员".to_string(),
        default_scale_id: Some("SCALE-1".to_string()),
        assigned_scale_ids: vec!["SCALE-1".to_string(), "SCALE-2".to_string()],
    })?;

    // ===== 车辆 =====
    let trucks = vec![
        Truck {
            truck_id: "TRUCK-1".to_string(),
            plate_number: "粤B12345".to_string(),
            driver_name: Some("王师傅".to_string()),
            max_load_kg: Some(30000.0),
            active: true,
        },
        Truck {
            truck_id: "TRUCK-2".to_string(),
            plate_number: "粤B67890".to_string(),
            driver_name: Some("李师傅".to_string()),
            max_load_kg: Some(18000.0),
            active: true,
        },
    ];
    state.master_repo.batch_upsert_trucks(&trucks, None)?;

    // ===== 物料 / 伙伴 / 库位 =====
    for product in [
        Product {
            product_id: "ORE".to_string(),
            name: "铁矿石".to_string(),
            uom: "kg".to_string(),
            is_weighable: true,
        },
        Product {
            product_id: "COAL".to_string(),
            name: "动力煤".to_string(),
            uom: "kg".to_string(),
            is_weighable: true,
        },
        Product {
            product_id: "PALLET".to_string(),
            name: "托盘".to_string(),
            uom: "unit".to_string(),
            is_weighable: false,
        },
    ] {
        state.master_repo.upsert_product(&product)?;
    }

    state.master_repo.upsert_location(&StockLocation {
        location_id: "LOC-CUST-HUANAN".to_string(),
        name: "华南钢厂收货场".to_string(),
        usage: LocationUsage::Customer,
    })?;
    state.master_repo.upsert_partner(&Partner {
        partner_id: "SUP-1".to_string(),
        name: "北方矿业".to_string(),
        customer_location_id: None,
    })?;
    state.master_repo.upsert_partner(&Partner {
        partner_id: "CUS-1".to_string(),
        name: "华南钢厂".to_string(),
        customer_location_id: Some("LOC-CUST-HUANAN".to_string()),
    })?;

    // ===== 订单 =====
    state.order_repo.insert_with_lines(
        &TradeOrder {
            order_id: "PO-1".to_string(),
            order_no: "PO00001".to_string(),
            kind: OrderKind::Purchase,
            partner_id: Some("SUP-1".to_string()),
            state: OrderState::Confirmed,
            amount_total: 8400.0,
            created_at: now,
        },
        &[TradeOrderLine {
            line_id: "PO-1-L1".to_string(),
            order_id: "PO-1".to_string(),
            product_id: "ORE".to_string(),
            ordered_qty: 2800.0,
            processed_qty: 0.0,
        }],
    )?;
    state.order_repo.insert_with_lines(
        &TradeOrder {
            order_id: "SO-1".to_string(),
            order_no: "SO00001".to_string(),
            kind: OrderKind::Sale,
            partner_id: Some("CUS-1".to_string()),
            state: OrderState::Confirmed,
            amount_total: 12000.0,
            created_at: now,
        },
        &[
            TradeOrderLine {
                line_id: "SO-1-L1".to_string(),
                order_id: "SO-1".to_string(),
                product_id: "COAL".to_string(),
                ordered_qty: 5000.0,
                processed_qty: 0.0,
            },
            TradeOrderLine {
                line_id: "SO-1-L2".to_string(),
                order_id: "SO-1".to_string(),
                product_id: "PALLET".to_string(),
                ordered_qty: 10.0,
                processed_qty: 0.0,
            },
        ],
    )?;

    // ===== 独立入库单（不经订单） =====
    state.picking_repo.create_with_moves(
        &StockPicking {
            picking_id: "PICK-IN-DEMO".to_string(),
            name: "IN/DEMO".to_string(),
            picking_type: PickingType::Incoming,
            state: PickingState::Assigned,
            partner_id: Some("SUP-1".to_string()),
            origin: None,
            location_src_id: Some(DEFAULT_SUPPLIER_LOCATION_ID.to_string()),
            location_dest_id: Some(DEFAULT_STOCK_LOCATION_ID.to_string()),
            scheduled_date: Some(now),
            created_at: now,
        },
        &[StockMove {
            move_id: "MOVE-IN-DEMO".to_string(),
            picking_id: "PICK-IN-DEMO".to_string(),
            product_id: "ORE".to_string(),
            demand_qty: 12000.0,
            order_line_id: None,
        }],
        &[],
    )?;

    Ok(())
}
