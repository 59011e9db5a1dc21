// ==========================================
// 订单/单据关联集成测试
// ==========================================
// 测试范围:
// 1. 选择订单: 查找现有单据或生成新单据
// 2. 选择订单明细 / 单据 / 车辆
// 3. 查看关联单据
// 4. 已关闭记录不可再关联
// ==========================================


use test_helpers::*;
use truck_weighbridge::api::{ApiError, LinkedDocument};
use truck_weighbridge::db::{
    DEFAULT_CUSTOMER_LOCATION_ID, DEFAULT_STOCK_LOCATION_ID, DEFAULT_SUPPLIER_LOCATION_ID,
};
use truck_weighbridge::domain::{
    ActionType, OrderKind, Partner, PickingState, PickingType, TargetType, Truck,
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

// ==========================================
// 选择订单
// ==========================================

#[tokio::test]
async fn test_purchase_order_creates_receipt() {
    let env = setup();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    assert_eq!(record.order_kind, Some(OrderKind::Purchase));
    assert_eq!(record.order_id.as_deref(), Some(PURCHASE_ORDER));
    assert_eq!(record.order_line_id.as_deref(), Some("PO-1-L1"));
    assert_eq!(record.product_id.as_deref(), Some(ORE));
    assert_eq!(record.partner_id.as_deref(), Some(SUPPLIER));
    assert_eq!(
        record.location_dest_id.as_deref(),
        Some(DEFAULT_STOCK_LOCATION_ID)
    );

    let picking_id = record.picking_id.clone().unwrap();
    let detail = env.state.picking_repo.find_detail(&picking_id).unwrap().unwrap();
    assert_eq!(detail.picking.name, "WH/IN/00001");
    assert_eq!(detail.picking.picking_type, PickingType::Incoming);
    assert_eq!(detail.picking.state, PickingState::Confirmed);
    assert_eq!(detail.picking.origin.as_deref(), Some("PO00001"));
    assert_eq!(
        detail.picking.location_src_id.as_deref(),
        Some(DEFAULT_SUPPLIER_LOCATION_ID)
    );
    assert_eq!(detail.moves.len(), 1);
    assert_eq!(detail.moves[0].demand_qty, 2800.0);
    assert_eq!(detail.moves[0].order_line_id.as_deref(), Some("PO-1-L1"));

    // 生成单据与关联各有一条日志
    let picking_logs = env
        .state
        .action_log_repo
        .find_by_target(TargetType::Picking, &picking_id)
        .unwrap();
    assert_eq!(picking_logs.len(), 1);
    assert_eq!(picking_logs[0].action_type, ActionType::CreatePicking.as_str());
    assert_eq!(
        picking_logs[0].detail.as_deref(),
        Some("Draft WH/IN/00001 created from PO00001")
    );
    let messages = env.api().list_messages(&record.weighing_id).unwrap();
    assert_eq!(messages[0].action_type, ActionType::LinkDocument.as_str());
    assert_eq!(
        messages[0].detail.as_deref(),
        Some("Linked to PO00001 / WH/IN/00001")
    );
}

#[tokio::test]
async fn test_reselecting_other_order_clears_previous_line() {
    let env = setup();
    env.state
        .order_repo
        .insert_with_lines(
            &order("PO-2", "PO00002", OrderKind::Purchase, SUPPLIER, 50.0, now()),
            &[line("PO-2-L1", "PO-2", PALLET, 20.0)],
        )
        .unwrap();
    let api = env.api();
    let record = create_weighing(&env, None).unwrap();

    let first = api
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    assert_eq!(first.order_line_id.as_deref(), Some("PO-1-L1"));

    // PO-2 没有需要过磅的明细: 不得保留 PO-1 的明细与物料
    let second = api
        .select_order(&record.weighing_id, "PO-2", "operator")
        .await
        .unwrap();
    assert_eq!(second.order_id.as_deref(), Some("PO-2"));
    assert_eq!(second.order_line_id, None);
    assert_eq!(second.product_id, None);
    assert_ne!(second.picking_id, first.picking_id);

    let stored = api.get_weighing(&record.weighing_id).unwrap();
    assert_eq!(stored.order_line_id, None);
    assert_eq!(stored.product_id, None);
}

#[tokio::test]
async fn test_switching_picking_clears_previous_line() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, None).unwrap();
    api.select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();

    // IN-1 的移动不来自订单行
    let record = api
        .select_picking(&record.weighing_id, RECEIPT, "operator")
        .unwrap();
    assert_eq!(record.picking_id.as_deref(), Some(RECEIPT));
    assert_eq!(record.order_line_id, None);
    assert_eq!(record.product_id.as_deref(), Some(ORE));
}

#[tokio::test]
async fn test_existing_open_picking_reused() {
    let env = setup();
    let api = env.api();
    let first = create_weighing(&env, None).unwrap();
    let first = api
        .select_order(&first.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();

    let second = create_weighing(&env, None).unwrap();
    let second = api
        .select_order(&second.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();

    assert_eq!(first.picking_id, second.picking_id);
    // 未消耗第二个单据编号
    let picking = env
        .state
        .picking_repo
        .find_by_id(second.picking_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(picking.name, "WH/IN/00001");
}

#[tokio::test]
async fn test_sale_order_uses_customer_location() {
    let env = setup();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order(&record.weighing_id, SALE_ORDER, "operator")
        .await
        .unwrap();
    assert_eq!(record.order_kind, Some(OrderKind::Sale));
    // PALLET 不过磅，带出第二行的 ORE
    assert_eq!(record.product_id.as_deref(), Some(ORE));
    assert_eq!(record.order_line_id.as_deref(), Some("SO-1-L2"));
    assert_eq!(record.location_dest_id.as_deref(), Some(CUSTOMER_LOCATION));

    let detail = env
        .state
        .picking_repo
        .find_detail(record.picking_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(detail.picking.name, "WH/OUT/00001");
    assert_eq!(detail.picking.picking_type, PickingType::Outgoing);
    assert_eq!(
        detail.picking.location_src_id.as_deref(),
        Some(DEFAULT_STOCK_LOCATION_ID)
    );
    assert_eq!(detail.moves.len(), 2);
}

#[tokio::test]
async fn test_sale_partner_without_location_uses_default() {
    let env = setup();
    env.state
        .order_repo
        .insert_with_lines(
            &order("SO-2", "SO00002", OrderKind::Sale, SUPPLIER, 900.0, now()),
            &[line("SO-2-L1", "SO-2", ORE, 1000.0)],
        )
        .unwrap();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order(&record.weighing_id, "SO-2", "operator")
        .await
        .unwrap();
    assert_eq!(
        record.location_dest_id.as_deref(),
        Some(DEFAULT_CUSTOMER_LOCATION_ID)
    );
}

#[tokio::test]
async fn test_sale_partner_with_internal_location_uses_default() {
    let env = setup();
    env.state
        .master_repo
        .upsert_partner(&Partner {
            partner_id: "CUS-2".to_string(),
            name: "Customer Two".to_string(),
            customer_location_id: Some(DEFAULT_STOCK_LOCATION_ID.to_string()),
        })
        .unwrap();
    env.state
        .order_repo
        .insert_with_lines(
            &order("SO-3", "SO00003", OrderKind::Sale, "CUS-2", 500.0, now()),
            &[line("SO-3-L1", "SO-3", ORE, 700.0)],
        )
        .unwrap();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order(&record.weighing_id, "SO-3", "operator")
        .await
        .unwrap();
    assert_eq!(
        record.location_dest_id.as_deref(),
        Some(DEFAULT_CUSTOMER_LOCATION_ID)
    );
}

#[tokio::test]
async fn test_order_without_open_lines_creates_draft_picking() {
    let env = setup();
    let mut done_line = line("PO-2-L1", "PO-2", ORE, 1000.0);
    done_line.processed_qty = 1000.0;
    env.state
        .order_repo
        .insert_with_lines(
            &order("PO-2", "PO00002", OrderKind::Purchase, SUPPLIER, 3000.0, now()),
            &[done_line],
        )
        .unwrap();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order(&record.weighing_id, "PO-2", "operator")
        .await
        .unwrap();
    assert!(record.product_id.is_none());
    assert!(record.order_line_id.is_none());

    let detail = env
        .state
        .picking_repo
        .find_detail(record.picking_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(detail.picking.state, PickingState::Draft);
    assert!(detail.moves.is_empty());
}

// ==========================================
// 选择明细 / 单据 / 车辆
// ==========================================

#[tokio::test]
async fn test_select_order_line() {
    let env = setup();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_order_line(&record.weighing_id, "SO-1-L2", "operator")
        .unwrap();
    assert_eq!(record.order_id.as_deref(), Some(SALE_ORDER));
    assert_eq!(record.order_kind, Some(OrderKind::Sale));
    assert_eq!(record.product_id.as_deref(), Some(ORE));
    assert_eq!(record.partner_id.as_deref(), Some(CUSTOMER));
    assert!(record.picking_id.is_none());
}

#[tokio::test]
async fn test_select_picking_links_order_line() {
    let env = setup();
    create_receipt(
        &env.state,
        "IN-2",
        PickingState::Assigned,
        &[(PALLET, 5.0, None), (ORE, 2800.0, Some("PO-1-L1"))],
    )
    .unwrap();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_picking(&record.weighing_id, "IN-2", "operator")
        .unwrap();
    assert_eq!(record.picking_id.as_deref(), Some("IN-2"));
    assert_eq!(record.product_id.as_deref(), Some(ORE));
    assert_eq!(record.order_line_id.as_deref(), Some("PO-1-L1"));
    assert_eq!(record.order_id.as_deref(), Some(PURCHASE_ORDER));
    assert_eq!(record.order_kind, Some(OrderKind::Purchase));
    assert_eq!(record.partner_id.as_deref(), Some(SUPPLIER));
    assert_eq!(
        record.location_dest_id.as_deref(),
        Some(DEFAULT_STOCK_LOCATION_ID)
    );
}

#[tokio::test]
async fn test_select_truck() {
    let env = setup();
    env.state
        .master_repo
        .upsert_truck_by_plate(&Truck {
            truck_id: "TRUCK-2".to_string(),
            plate_number: "CD5678".to_string(),
            driver_name: Some("Li".to_string()),
            max_load_kg: None,
            active: true,
        })
        .unwrap();
    let record = create_weighing(&env, None).unwrap();

    let record = env
        .api()
        .select_truck(&record.weighing_id, "TRUCK-2", "operator")
        .unwrap();
    assert_eq!(record.truck_id, "TRUCK-2");
    assert_eq!(record.truck_plate.as_deref(), Some("CD5678"));
    assert_eq!(record.driver_name.as_deref(), Some("Li"));
}

// ==========================================
// 查看关联单据
// ==========================================

#[tokio::test]
async fn test_view_linked_documents() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, None).unwrap();

    let err = api.view_linked_order(&record.weighing_id).unwrap_err();
    assert_eq!(user_message(err), "No order is linked to this weighing.");
    let err = api.view_linked_picking(&record.weighing_id).unwrap_err();
    assert_eq!(
        user_message(err),
        "No receipt or delivery is linked to this weighing."
    );

    let record = api
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    assert_eq!(
        api.view_linked_order(&record.weighing_id).unwrap(),
        LinkedDocument {
            model: "purchase.order".to_string(),
            id: PURCHASE_ORDER.to_string(),
            name: "PO00001".to_string(),
        }
    );
    let picking = api.view_linked_picking(&record.weighing_id).unwrap();
    assert_eq!(picking.model, "stock.picking");
    assert_eq!(picking.name, "WH/IN/00001");
    assert_eq!(Some(picking.id), record.picking_id);
}

// ==========================================
// 已关闭记录
// ==========================================

#[tokio::test]
async fn test_linking_rejected_on_closed_weighing() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    api.cancel_weighing(&record.weighing_id, "operator").unwrap();

    let err = api
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap_err();
    assert!(user_message(err).contains("'cancel'"));
    assert!(api
        .select_picking(&record.weighing_id, RECEIPT, "operator")
        .is_err());
    assert!(api
        .select_truck(&record.weighing_id, TRUCK_ID, "operator")
        .is_err());

    // 未生成任何单据
    assert!(env
        .state
        .picking_repo
        .find_open_by_origin("PO00001", PickingType::Incoming)
        .unwrap()
        .is_none());
}
