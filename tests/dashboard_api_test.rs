// ==========================================
// DashboardApi 集成测试
// ==========================================
// 测试范围:
// 1. 状态计数 / 今日完成
// 2. 待称重清单（订单、单据）
// 3. 总览汇总
// 4. 订单 / 订单行 / 单据的称重汇总
// ==========================================


use chrono::{Duration, NaiveDate};
use test_helpers::*;
use truck_weighbridge::domain::{OrderKind, OrderState, PickingState};

fn setup() -> TestEnv {
    TestEnv::new().expect("无法创建测试环境")
}

fn today() -> NaiveDate {
    now().date()
}

// ==========================================
// 看板计数
// ==========================================

#[tokio::test]
async fn test_dashboard_counts_by_state() {
    let env = setup();
    let dashboard = &env.state.dashboard_api;

    let empty = dashboard.get_dashboard_data(today()).unwrap();
    assert_eq!(empty.draft_count, 0);
    assert_eq!(empty.done_today, 0);
    assert_eq!(empty.total_weight_today, 0.0);

    create_weighing(&env, Some(ORE)).unwrap();

    let gross = create_weighing(&env, Some(ORE)).unwrap();
    read_scale(&env, &gross.weighing_id, 5000.0).await.unwrap();
    env.api()
        .set_gross_from_live(&gross.weighing_id, "operator")
        .unwrap();

    let done = create_weighing(&env, Some(ORE)).unwrap();
    weigh(&env, &done.weighing_id, 5000.0, 2000.0).await.unwrap();
    env.api()
        .complete_weighing(&done.weighing_id, "operator")
        .unwrap();

    let tare = create_weighing(&env, Some(ORE)).unwrap();
    weigh(&env, &tare.weighing_id, 4000.0, 1500.0).await.unwrap();

    let data = dashboard.get_dashboard_data(today()).unwrap();
    assert_eq!(data.draft_count, 1);
    assert_eq!(data.gross_count, 1);
    assert_eq!(data.tare_count, 1);
    assert_eq!(data.done_today, 1);
    assert_eq!(data.total_weight_today, 3000.0);

    // 次日统计不含今天完成的记录
    let tomorrow = dashboard
        .get_dashboard_data(today() + Duration::days(1))
        .unwrap();
    assert_eq!(tomorrow.done_today, 0);
    assert_eq!(tomorrow.tare_count, 1);
}

// ==========================================
// 待称重清单
// ==========================================

#[tokio::test]
async fn test_pending_lists() {
    let env = setup();
    let dashboard = &env.state.dashboard_api;

    let pending = dashboard.get_pending_weighing().unwrap();
    assert_eq!(pending.purchases.len(), 1);
    assert_eq!(pending.purchases[0].order.order_id, PURCHASE_ORDER);
    assert_eq!(pending.sales.len(), 1);
    assert_eq!(pending.sales[0].order.order_id, SALE_ORDER);
    assert_eq!(pending.receipts.len(), 1);
    assert_eq!(pending.receipts[0].picking.picking_id, RECEIPT);
    assert_eq!(pending.receipts[0].total_demand, 2800.0);
    assert!(pending.deliveries.is_empty());

    // 关联后不再待称重；生成的入库单也已有称重记录
    let record = create_weighing(&env, None).unwrap();
    env.api()
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();

    let pending = dashboard.get_pending_weighing().unwrap();
    assert!(pending.purchases.is_empty());
    assert_eq!(pending.receipts.len(), 1);
    assert_eq!(pending.receipts[0].picking.picking_id, RECEIPT);
}

#[tokio::test]
async fn test_cancelled_weighing_returns_documents_to_pending() {
    let env = setup();
    let dashboard = &env.state.dashboard_api;

    let record = create_weighing(&env, None).unwrap();
    let linked = env
        .api()
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    let generated = linked.picking_id.clone().expect("应生成入库单");
    assert!(dashboard.list_purchases_to_weigh().unwrap().is_empty());

    env.api()
        .cancel_weighing(&record.weighing_id, "supervisor")
        .unwrap();

    // 已取消的称重不占用订单/单据
    let pending = dashboard.get_pending_weighing().unwrap();
    assert_eq!(pending.purchases.len(), 1);
    assert_eq!(pending.purchases[0].order.order_id, PURCHASE_ORDER);
    let mut receipts: Vec<String> = pending
        .receipts
        .iter()
        .map(|r| r.picking.picking_id.clone())
        .collect();
    receipts.sort();
    let mut expected = vec![RECEIPT.to_string(), generated];
    expected.sort();
    assert_eq!(receipts, expected);
}

#[tokio::test]
async fn test_pending_lists_skip_unweighable_and_unconfirmed() {
    let env = setup();

    // 仅含不过磅物料
    env.state
        .order_repo
        .insert_with_lines(
            &order("PO-2", "PO00002", OrderKind::Purchase, SUPPLIER, 50.0, now()),
            &[line("PO-2-L1", "PO-2", PALLET, 5.0)],
        )
        .unwrap();
    // 草稿订单
    let mut draft = order("PO-3", "PO00003", OrderKind::Purchase, SUPPLIER, 50.0, now());
    draft.state = OrderState::Draft;
    env.state
        .order_repo
        .insert_with_lines(&draft, &[line("PO-3-L1", "PO-3", ORE, 100.0)])
        .unwrap();
    // 草稿 / 已完成单据
    create_receipt(&env.state, "IN-2", PickingState::Draft, &[(ORE, 100.0, None)]).unwrap();
    create_receipt(&env.state, "IN-3", PickingState::Done, &[(ORE, 100.0, None)]).unwrap();
    create_receipt(&env.state, "IN-4", PickingState::Confirmed, &[(PALLET, 5.0, None)]).unwrap();

    let dashboard = &env.state.dashboard_api;
    let purchases = dashboard.list_purchases_to_weigh().unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].order.order_id, PURCHASE_ORDER);

    let receipts = dashboard.list_receipts_to_weigh().unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].picking.picking_id, RECEIPT);
}

// ==========================================
// 总览
// ==========================================

#[tokio::test]
async fn test_overview_data() {
    let env = setup();
    let overview = env.state.dashboard_api.get_overview_data(today()).unwrap();

    assert_eq!(overview.purchases.count, 1);
    assert_eq!(overview.purchases.total_amount, 8400.0);
    assert_eq!(overview.purchases.pending_qty, 2800.0);
    assert_eq!(overview.purchases.partners, vec!["Supplier One".to_string()]);

    assert_eq!(overview.sales.count, 1);
    assert_eq!(overview.sales.total_amount, 12000.0);
    assert_eq!(overview.sales.pending_qty, 5010.0);
    assert_eq!(overview.sales.partners, vec!["Customer One".to_string()]);

    assert_eq!(overview.receipts.count, 1);
    assert_eq!(overview.receipts.total_qty, 2800.0);
    assert_eq!(overview.receipts.urgent_count, 1);
    assert_eq!(overview.receipts.partners, vec!["Supplier One".to_string()]);

    assert_eq!(overview.deliveries.count, 0);
    assert!(overview.deliveries.partners.is_empty());

    // 计划日期在未来的单据不算紧急
    let yesterday = today() - Duration::days(1);
    let overview = env.state.dashboard_api.get_overview_data(yesterday).unwrap();
    assert_eq!(overview.receipts.urgent_count, 0);
}

// ==========================================
// 称重汇总
// ==========================================

#[tokio::test]
async fn test_order_and_picking_summaries() {
    let env = setup();
    let dashboard = &env.state.dashboard_api;
    let api = env.api();

    let record = create_weighing(&env, None).unwrap();
    let record = api
        .select_order(&record.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    weigh(&env, &record.weighing_id, 5000.0, 2000.0).await.unwrap();
    api.update_inventory(&record.weighing_id, "operator")
        .await
        .unwrap();

    // 已取消的记录不计入
    let cancelled = create_weighing(&env, None).unwrap();
    api.select_order(&cancelled.weighing_id, PURCHASE_ORDER, "operator")
        .await
        .unwrap();
    api.cancel_weighing(&cancelled.weighing_id, "operator")
        .unwrap();

    let order = dashboard.get_order_summary(PURCHASE_ORDER).unwrap();
    assert_eq!(order.weighing_count, 1);
    assert_eq!(order.total_net_weight, 3000.0);
    assert!(order.has_weighable_products);

    let line = dashboard.get_order_line_summary("PO-1-L1").unwrap();
    assert_eq!(line.weighing_count, 1);
    assert_eq!(line.total_processed_weight, 3000.0);

    let picking_id = record.picking_id.unwrap();
    let picking = dashboard.get_picking_summary(&picking_id).unwrap();
    assert_eq!(picking.weighing_count, 1);
    assert!(picking.has_weighable_products);

    let receipt = dashboard.get_picking_summary(RECEIPT).unwrap();
    assert_eq!(receipt.weighing_count, 0);
    assert!(receipt.has_weighable_products);
}
