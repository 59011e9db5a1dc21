// ==========================================
// 称重状态机集成测试
// ==========================================
// 测试范围:
// 1. 读数 → 毛重 → 皮重 → 净重
// 2. 拒绝场景不改变状态、不写日志
// 3. 完成 / 取消
// 4. 默认地磅选择、TCP 仪表读数
// ==========================================


use test_helpers::*;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use truck_weighbridge::api::ApiError;
use truck_weighbridge::domain::{
    ActionType, CreateWeighingRequest, ScaleConnection, WeighingFilter, WeighingScale,
    WeighingState,
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
// 正常流程
// ==========================================

#[tokio::test]
async fn test_gross_then_tare_gives_net_weight() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    assert_eq!(record.state, WeighingState::Draft);
    assert_eq!(record.reference, "WGH/00001");
    assert_eq!(record.truck_plate.as_deref(), Some("AB1234"));
    assert_eq!(record.driver_name.as_deref(), Some("Wang"));

    let record = weigh(&env, &record.weighing_id, 5000.0, 2000.0)
        .await
        .unwrap();
    assert_eq!(record.gross_weight, 5000.0);
    assert_eq!(record.tare_weight, 2000.0);
    assert_eq!(record.net_weight, 3000.0);
    assert_eq!(record.state, WeighingState::Tare);
    assert!(record.gross_date.is_some());
    assert!(record.tare_date.is_some());

    // 持久化后一致
    let stored = env.api().get_weighing(&record.weighing_id).unwrap();
    assert_eq!(stored.net_weight, 3000.0);
    assert_eq!(stored.state, WeighingState::Tare);

    // 日志: 新建、读数、毛重、读数、皮重（新 → 旧）
    let messages = env.api().list_messages(&record.weighing_id).unwrap();
    let actions: Vec<&str> = messages.iter().map(|m| m.action_type.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            ActionType::SetTare.as_str(),
            ActionType::FetchLiveWeight.as_str(),
            ActionType::SetGross.as_str(),
            ActionType::FetchLiveWeight.as_str(),
            ActionType::Create.as_str(),
        ]
    );
    assert_eq!(messages[0].detail.as_deref(), Some("Tare weight set: 2000 KG"));
    assert_eq!(
        messages[1].detail.as_deref(),
        Some("Live weight fetched from Scale 1: 2000 KG")
    );
}

#[tokio::test]
async fn test_fetch_live_weight_keeps_state() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();

    let first = read_scale(&env, &record.weighing_id, 4200.0).await.unwrap();
    let second = read_scale(&env, &record.weighing_id, 4300.0).await.unwrap();
    assert_eq!(first.state, WeighingState::Draft);
    assert_eq!(second.state, WeighingState::Draft);
    assert_eq!(second.live_weight, 4300.0);
    assert_eq!(second.gross_weight, 0.0);
}

#[tokio::test]
async fn test_gross_can_be_recaptured_before_tare() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    let id = record.weighing_id.as_str();

    read_scale(&env, id, 5000.0).await.unwrap();
    api.set_gross_from_live(id, "operator").unwrap();
    read_scale(&env, id, 5100.0).await.unwrap();
    let record = api.set_gross_from_live(id, "operator").unwrap();

    assert_eq!(record.state, WeighingState::Gross);
    assert_eq!(record.gross_weight, 5100.0);
    assert_eq!(record.net_weight, 0.0);
}

// ==========================================
// 拒绝场景
// ==========================================

#[tokio::test]
async fn test_gross_without_live_weight_rejected() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();

    let err = env
        .api()
        .set_gross_from_live(&record.weighing_id, "operator")
        .unwrap_err();
    assert_eq!(user_message(err), "Please fetch live weight first.");

    let stored = env.api().get_weighing(&record.weighing_id).unwrap();
    assert_eq!(stored.state, WeighingState::Draft);
    assert_eq!(env.api().list_messages(&record.weighing_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_tare_not_less_than_gross_rejected() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    let id = record.weighing_id.as_str();

    read_scale(&env, id, 5000.0).await.unwrap();
    api.set_gross_from_live(id, "operator").unwrap();
    read_scale(&env, id, 5000.0).await.unwrap();

    let err = api.set_tare_from_live(id, "operator").unwrap_err();
    assert_eq!(
        user_message(err),
        "Tare weight must be less than gross weight."
    );

    let stored = api.get_weighing(id).unwrap();
    assert_eq!(stored.state, WeighingState::Gross);
    assert_eq!(stored.tare_weight, 0.0);
    assert_eq!(stored.net_weight, 0.0);
}

#[tokio::test]
async fn test_tare_from_draft_rejected() {
    let env = setup();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    read_scale(&env, &record.weighing_id, 2000.0).await.unwrap();

    let err = env
        .api()
        .set_tare_from_live(&record.weighing_id, "operator")
        .unwrap_err();
    assert!(user_message(err).contains("'draft'"));
}

#[tokio::test]
async fn test_fetch_requires_enabled_scale() {
    let env = setup();
    let api = env.api();
    let record = api
        .create_weighing(
            CreateWeighingRequest {
                truck_id: TRUCK_ID.to_string(),
                scale_id: Some(DISABLED_SCALE_ID.to_string()),
                ..Default::default()
            },
            "operator",
        )
        .unwrap();

    let err = api
        .fetch_live_weight(&record.weighing_id, "operator")
        .await
        .unwrap_err();
    assert_eq!(user_message(err), "Weighing scale Old Scale is disabled.");
    assert_eq!(api.list_messages(&record.weighing_id).unwrap().len(), 1);
}

// ==========================================
// 完成 / 取消
// ==========================================

#[tokio::test]
async fn test_complete_requires_product() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, None).unwrap();
    weigh(&env, &record.weighing_id, 5000.0, 2000.0).await.unwrap();

    let err = api.complete_weighing(&record.weighing_id, "operator").unwrap_err();
    assert_eq!(user_message(err), "Product is required.");
    assert_eq!(
        api.get_weighing(&record.weighing_id).unwrap().state,
        WeighingState::Tare
    );
}

#[tokio::test]
async fn test_complete_before_tare_rejected() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    read_scale(&env, &record.weighing_id, 5000.0).await.unwrap();
    api.set_gross_from_live(&record.weighing_id, "operator").unwrap();

    let err = api.complete_weighing(&record.weighing_id, "operator").unwrap_err();
    assert_eq!(
        user_message(err),
        "Cannot complete weighing. Net weight must be positive."
    );
}

#[tokio::test]
async fn test_complete_weighing() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    weigh(&env, &record.weighing_id, 5000.0, 2000.0).await.unwrap();

    let done = api.complete_weighing(&record.weighing_id, "operator").unwrap();
    assert_eq!(done.state, WeighingState::Done);
    assert_eq!(done.net_weight, 3000.0);

    let messages = api.list_messages(&record.weighing_id).unwrap();
    assert_eq!(messages[0].action_type, ActionType::Complete.as_str());
    assert_eq!(
        messages[0].detail.as_deref(),
        Some("Weighing completed: 3000 KG of Iron Ore")
    );

    // 完成后不再接受读数与取消
    assert!(api
        .fetch_live_weight(&record.weighing_id, "operator")
        .await
        .is_err());
    assert!(api.cancel_weighing(&record.weighing_id, "operator").is_err());
}

#[tokio::test]
async fn test_cancel_weighing() {
    let env = setup();
    let api = env.api();
    let record = create_weighing(&env, Some(ORE)).unwrap();
    read_scale(&env, &record.weighing_id, 5000.0).await.unwrap();
    api.set_gross_from_live(&record.weighing_id, "operator").unwrap();

    let cancelled = api.cancel_weighing(&record.weighing_id, "operator").unwrap();
    assert_eq!(cancelled.state, WeighingState::Cancel);
    assert_eq!(cancelled.gross_weight, 5000.0);

    let err = api.cancel_weighing(&record.weighing_id, "operator").unwrap_err();
    assert!(user_message(err).contains("'cancel'"));

    let listed = api
        .list_weighings(&WeighingFilter {
            state: Some(WeighingState::Cancel),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(listed.len(), 1);
}

// ==========================================
// 地磅
// ==========================================

#[tokio::test]
async fn test_default_scale_selection() {
    let env = setup();
    let api = env.api();
    let req = CreateWeighingRequest {
        truck_id: TRUCK_ID.to_string(),
        ..Default::default()
    };

    // 操作员默认地磅
    let record = api.create_weighing(req.clone(), "operator").unwrap();
    assert_eq!(record.scale_id.as_deref(), Some(SCALE_ID));

    // 无操作员配置: 首个启用地磅
    let record = api.create_weighing(req, "someone-else").unwrap();
    assert_eq!(record.scale_id.as_deref(), Some(SCALE_ID));
    assert_eq!(record.reference, "WGH/00002");
}

#[tokio::test]
async fn test_fetch_from_tcp_indicator() {
    let env = setup();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"ST,GS,+005000kg\r\n").await.unwrap();
    });

    env.state
        .scale_repo
        .upsert_scale(&WeighingScale {
            scale_id: "SCALE-TCP".to_string(),
            name: "Indicator".to_string(),
            enabled: true,
            connection: ScaleConnection::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            },
        })
        .unwrap();

    let api = env.api();
    let record = api
        .create_weighing(
            CreateWeighingRequest {
                truck_id: TRUCK_ID.to_string(),
                scale_id: Some("SCALE-TCP".to_string()),
                ..Default::default()
            },
            "operator",
        )
        .unwrap();

    let record = api
        .fetch_live_weight(&record.weighing_id, "operator")
        .await
        .unwrap();
    assert_eq!(record.live_weight, 5000.0);
    assert_eq!(record.state, WeighingState::Draft);
}

#[tokio::test]
async fn test_slow_indicator_does_not_revert_cancel() {
    let env = setup();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        socket.write_all(b"ST,GS,+005000kg\r\n").await.unwrap();
    });

    env.state
        .scale_repo
        .upsert_scale(&WeighingScale {
            scale_id: "SCALE-TCP".to_string(),
            name: "Indicator".to_string(),
            enabled: true,
            connection: ScaleConnection::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            },
        })
        .unwrap();

    let api = env.api();
    let record = api
        .create_weighing(
            CreateWeighingRequest {
                truck_id: TRUCK_ID.to_string(),
                scale_id: Some("SCALE-TCP".to_string()),
                ..Default::default()
            },
            "operator",
        )
        .unwrap();
    let id = record.weighing_id.clone();

    // 仪表回数前取消
    let (fetched, cancelled) = tokio::join!(api.fetch_live_weight(&id, "operator"), async {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        api.cancel_weighing(&id, "supervisor")
    });
    assert_eq!(cancelled.unwrap().state, WeighingState::Cancel);
    assert_eq!(
        user_message(fetched.unwrap_err()),
        "This action is not allowed while the weighing is in state 'cancel'."
    );

    let stored = api.get_weighing(&id).unwrap();
    assert_eq!(stored.state, WeighingState::Cancel);
    assert_eq!(stored.live_weight, 0.0);

    let actions: Vec<String> = api
        .list_messages(&id)
        .unwrap()
        .into_iter()
        .map(|log| log.action_type)
        .collect();
    assert_eq!(actions, vec!["Cancel".to_string(), "Create".to_string()]);
}

#[tokio::test]
async fn test_tcp_indicator_unreachable_reports_error() {
    let env = setup();
    // 绑定后立即释放端口，连接会被拒绝
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    env.state
        .scale_repo
        .upsert_scale(&WeighingScale {
            scale_id: "SCALE-TCP".to_string(),
            name: "Indicator".to_string(),
            enabled: true,
            connection: ScaleConnection::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            },
        })
        .unwrap();

    let api = env.api();
    let record = api
        .create_weighing(
            CreateWeighingRequest {
                truck_id: TRUCK_ID.to_string(),
                scale_id: Some("SCALE-TCP".to_string()),
                ..Default::default()
            },
            "operator",
        )
        .unwrap();

    let err = api
        .fetch_live_weight(&record.weighing_id, "operator")
        .await
        .unwrap_err();
    assert!(user_message(err).starts_with("Error: "));

    let stored = api.get_weighing(&record.weighing_id).unwrap();
    assert_eq!(stored.live_weight, 0.0);
}
