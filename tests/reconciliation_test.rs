// ==========================================
// 净重回写集成测试
// ==========================================
// 测试范围:
// 1. 入库单: 新建明细 / 覆盖已有明细，单据状态推进
// 2. 超收 / 短缺 / 足额（容差）
// 3. 拒绝场景: 未关联单据、物料不在单据、单据已关闭
// 4. 中途失败时不留部分状态
// ==========================================


use test_helpers::*;
use truck_weighbridge::api::ApiError;
use truck_weighbridge::config::config_keys;
use truck_weighbridge::db::open_sqlite_connection;
use truck_weighbridge::domain::{
    ActionType, DeliveryStatus, PickingState, StockMoveLine, TargetType, WeighingState,
};

fn setup() -> TestEnv {
    truck_weighbridge::i18n::set_locale("en");
    TestEnv::new().expect("无法创建测试环境")
}

fn user_message(err: ApiError) -> String {
    match err {
        ApiError::UserError(msg) => msg,
        other => panic!("Expected UserError, got {:?}", other),
    }
}

/// 新建称重 → 关联单据 → 过磅
async fn weighed_against(env: &TestEnv, picking_id: &str, gross: f64, tare: f64) -> String {
    let record = create_weighing(env, Some(ORE)).unwrap();
    env.api()
        .select_picking(&record.weighing_id, picking_id, "operator")
        .unwrap();
    weigh(env, &record.weighing_id, gross, tare).await.unwrap();
    record.weighing_id
}

// ==========================================
// 入库单回写
// ==========================================

#[tokio::test]
async fn test_receipt_over_delivery() {
    let env = setup();
    let id = weighed_against(&env, RECEIPT, 5000.0, 2000.0).await;

    let result = env.api().update_inventory(&id, "operator").await.unwrap();
    assert_eq!(result.weighing.state, WeighingState::Done);
    assert_eq!(result.plan.status, DeliveryStatus::Over { delta_kg: 200.0 });
    assert_eq!(result.plan.demand, 2800.0);
    assert_eq!(result.plan.net_weight, 3000.0);

    // 单据: 状态保持 assigned，新建一条 3000 的明细
    let detail = env.state.picking_repo.find_detail(RECEIPT).unwrap().unwrap();
    assert_eq!(detail.picking.state, PickingState::Assigned);
    assert_eq!(detail.move_lines.len(), 1);
    assert_eq!(detail.move_lines[0].quantity, 3000.0);
    assert_eq!(detail.move_lines[0].move_id, "IN-1-M1");

    // 单据上的核对记录
    let notes = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, RECEIPT)
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].action_type, ActionType::QuantityUpdate.as_str());
    let text = notes[0].detail.clone().unwrap();
    assert!(text.contains("Received: 3000 KG of Iron Ore (Demand: 2800 KG)"));
    assert!(text.contains("Over-delivery: +200 KG"));
    assert!(text.contains("WGH/00001"));

    // 称重记录上的摘要
    let messages = env.api().list_messages(&id).unwrap();
    assert_eq!(messages[0].action_type, ActionType::UpdateInventory.as_str());
    assert_eq!(
        messages[0].detail.as_deref(),
        Some("Receipt updated: 3000 KG of Iron Ore")
    );
}

#[tokio::test]
async fn test_confirmed_receipt_becomes_assigned() {
    let env = setup();
    create_receipt(&env.state, "IN-2", PickingState::Confirmed, &[(ORE, 3000.0, None)]).unwrap();
    let id = weighed_against(&env, "IN-2", 5000.0, 2000.0).await;

    let result = env.api().update_inventory(&id, "operator").await.unwrap();
    assert_eq!(result.plan.status, DeliveryStatus::Exact);

    let picking = env.state.picking_repo.find_by_id("IN-2").unwrap().unwrap();
    assert_eq!(picking.state, PickingState::Assigned);
}

#[tokio::test]
async fn test_fractional_weights_match_demand_exactly() {
    let env = setup();
    create_receipt(&env.state, "IN-2", PickingState::Assigned, &[(ORE, 3000.2, None)]).unwrap();
    let id = weighed_against(&env, "IN-2", 5000.3, 2000.1).await;

    let result = env.api().update_inventory(&id, "operator").await.unwrap();
    assert_eq!(result.plan.status, DeliveryStatus::Exact);
    assert_eq!(result.weighing.net_weight, 3000.2);

    let detail = env.state.picking_repo.find_detail("IN-2").unwrap().unwrap();
    assert_eq!(detail.move_lines[0].quantity, 3000.2);

    let notes = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, "IN-2")
        .unwrap();
    let text = notes[0].detail.clone().unwrap();
    assert!(text.contains("Received: 3000.2 KG of Iron Ore (Demand: 3000.2 KG) - Exact delivery"));
}

#[tokio::test]
async fn test_existing_move_line_overwritten() {
    let env = setup();
    env.state
        .picking_repo
        .insert_move_line(&StockMoveLine {
            move_line_id: "IN-1-ML1".to_string(),
            move_id: "IN-1-M1".to_string(),
            picking_id: RECEIPT.to_string(),
            product_id: ORE.to_string(),
            quantity: 100.0,
            location_src_id: None,
            location_dest_id: None,
        })
        .unwrap();

    let id = weighed_against(&env, RECEIPT, 4800.0, 2000.0).await;
    env.api().update_inventory(&id, "operator").await.unwrap();

    let detail = env.state.picking_repo.find_detail(RECEIPT).unwrap().unwrap();
    assert_eq!(detail.move_lines.len(), 1);
    assert_eq!(detail.move_lines[0].move_line_id, "IN-1-ML1");
    assert_eq!(detail.move_lines[0].quantity, 2800.0);
}

#[tokio::test]
async fn test_tolerance_makes_small_difference_exact() {
    let env = setup();
    env.state
        .config_api
        .update_config(config_keys::RECONCILE_TOLERANCE_KG, "250", "admin")
        .unwrap();

    let id = weighed_against(&env, RECEIPT, 5000.0, 2000.0).await;
    let result = env.api().update_inventory(&id, "operator").await.unwrap();
    assert_eq!(result.plan.status, DeliveryStatus::Exact);

    let notes = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, RECEIPT)
        .unwrap();
    assert!(notes[0].detail.as_deref().unwrap().contains("Exact delivery"));
}

// ==========================================
// 出库单回写
// ==========================================

#[tokio::test]
async fn test_sale_delivery_under_delivery() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, None).unwrap();
    let record = api
        .select_order(&record.weighing_id, SALE_ORDER, "operator")
        .await
        .unwrap();
    assert_eq!(record.product_id.as_deref(), Some(ORE));
    weigh(&env, &record.weighing_id, 5000.0, 2000.0).await.unwrap();

    let result = api.update_inventory(&record.weighing_id, "operator").await.unwrap();
    assert_eq!(result.plan.status, DeliveryStatus::Under { delta_kg: 2000.0 });
    assert_eq!(result.plan.demand, 5000.0);

    let picking_id = record.picking_id.unwrap();
    let notes = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, &picking_id)
        .unwrap();
    let update = notes
        .iter()
        .find(|n| n.action_type == ActionType::QuantityUpdate.as_str())
        .unwrap();
    let text = update.detail.clone().unwrap();
    assert!(text.starts_with("Delivered: 3000 KG of Iron Ore (Demand: 5000 KG)"));
    assert!(text.contains("Under-delivery: -2000 KG"));

    let detail = env.state.picking_repo.find_detail(&picking_id).unwrap().unwrap();
    assert_eq!(detail.picking.state, PickingState::Assigned);
    let line = &detail.move_lines[0];
    assert_eq!(line.quantity, 3000.0);
    assert_eq!(line.location_dest_id.as_deref(), Some(CUSTOMER_LOCATION));
}

// ==========================================
// 拒绝场景
// ==========================================

#[tokio::test]
async fn test_update_without_picking_rejected() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    weigh(&env, &record.weighing_id, 5000.0, 2000.0).await.unwrap();

    let err = env
        .api()
        .update_inventory(&record.weighing_id, "operator")
        .await
        .unwrap_err();
    assert_eq!(user_message(err), "Please select a receipt first.");
    assert_eq!(
        env.api().get_weighing(&record.weighing_id).unwrap().state,
        WeighingState::Tare
    );
}

#[tokio::test]
async fn test_update_before_tare_rejected() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    env.api()
        .select_picking(&record.weighing_id, RECEIPT, "operator")
        .unwrap();

    let err = env
        .api()
        .update_inventory(&record.weighing_id, "operator")
        .await
        .unwrap_err();
    assert_eq!(
        user_message(err),
        "Cannot update inventory. Net weight must be positive."
    );
}

#[tokio::test]
async fn test_product_not_in_picking_rejected() {
    let env = setup();
    create_receipt(&env.state, "IN-2", PickingState::Assigned, &[(PALLET, 10.0, None)]).unwrap();
    let id = weighed_against(&env, "IN-2", 5000.0, 2000.0).await;

    let err = env.api().update_inventory(&id, "operator").await.unwrap_err();
    assert_eq!(
        user_message(err),
        "Product Iron Ore not found in WH/IN/IN-2."
    );

    let detail = env.state.picking_repo.find_detail("IN-2").unwrap().unwrap();
    assert!(detail.move_lines.is_empty());
    assert_eq!(
        env.api().get_weighing(&id).unwrap().state,
        WeighingState::Tare
    );
}

#[tokio::test]
async fn test_closed_picking_rejected() {
    let env = setup();
    let id = weighed_against(&env, RECEIPT, 5000.0, 2000.0).await;
    env.state
        .picking_repo
        .update_state(RECEIPT, PickingState::Done)
        .unwrap();

    let err = env.api().update_inventory(&id, "operator").await.unwrap_err();
    assert_eq!(user_message(err), "Document WH/IN/IN-1 is already closed.");
}

#[tokio::test]
async fn test_failed_writeback_leaves_no_partial_state() {
    let env = setup();
    create_receipt(&env.state, "IN-2", PickingState::Confirmed, &[(ORE, 3000.0, None)]).unwrap();
    let id = weighed_against(&env, "IN-2", 5000.0, 2000.0).await;

    // 明细写入时强制失败
    let conn = open_sqlite_connection(&env.db_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_move_line BEFORE INSERT ON stock_move_line
         BEGIN SELECT RAISE(ABORT, 'boom'); END;",
    )
    .unwrap();
    drop(conn);

    assert!(env.api().update_inventory(&id, "operator").await.is_err());

    let detail = env.state.picking_repo.find_detail("IN-2").unwrap().unwrap();
    assert_eq!(detail.picking.state, PickingState::Confirmed);
    assert!(detail.move_lines.is_empty());
    assert_eq!(
        env.api().get_weighing(&id).unwrap().state,
        WeighingState::Tare
    );
    let notes = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, "IN-2")
        .unwrap();
    assert!(notes.is_empty());
}
