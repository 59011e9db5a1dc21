// ==========================================
// 地磅称重系统 - 称重操作 API
// ==========================================
// 职责: 操作员触发的称重动作（读数、毛重、皮重、完成、回写库存、取消、关联单据）
// 红线: 每个被接受的动作都在同一事务内写操作日志；被拒绝的动作不改变任何状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::WeighbridgeConfigReader;
use crate::db::{SEQ_PICKING_INCOMING, SEQ_PICKING_OUTGOING, SEQ_TRUCK_WEIGHING};
use crate::domain::action_log::{ActionLog, ActionType, TargetType};
use crate::domain::master_data::WeighingScale;
use crate::domain::order::OrderWithLines;
use crate::domain::types::{LocationUsage, OrderKind, PickingType};
use crate::domain::weighing::{
    CreateWeighingRequest, WeighingFilter, WeighingRecord, NEW_REFERENCE,
};
use crate::engine::{
    OrderLinker, PickingLocations, ReconciliationEngine, ReconciliationPlan, WeighingError,
    WeighingLifecycleEngine,
};
use crate::i18n::{format_kg, t, t_with_args};
use crate::repository::{
    ActionLogRepository, MasterDataRepository, OrderRepository, PickingRepository,
    RepositoryError, ScaleRepository, SequenceRepository, WeighingRepository,
};
use crate::scale::ScaleReader;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 返回类型
// ==========================================

/// 关联单据（用于界面跳转）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedDocument {
    pub model: String, // purchase.order / sale.order / stock.picking
    pub id: String,
    pub name: String,
}

/// 回写库存结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub weighing: WeighingRecord,
    pub plan: ReconciliationPlan,
}

// ==========================================
// WeighingApi
// ==========================================
pub struct WeighingApi {
    weighing_repo: Arc<WeighingRepository>,
    scale_repo: Arc<ScaleRepository>,
    master_repo: Arc<MasterDataRepository>,
    order_repo: Arc<OrderRepository>,
    picking_repo: Arc<PickingRepository>,
    sequence_repo: Arc<SequenceRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<dyn WeighbridgeConfigReader>,
    scale_reader: Arc<dyn ScaleReader>,
    lifecycle: WeighingLifecycleEngine,
    linker: OrderLinker,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn config_error(err: Box<dyn Error>) -> ApiError {
    ApiError::InternalError(format!("配置读取失败: {}", err))
}

/// 拒绝: 记录告警后转为 API 错误
fn reject(weighing_id: &str, action: ActionType, err: WeighingError) -> ApiError {
    tracing::warn!(
        weighing_id = %weighing_id,
        action = action.as_str(),
        reason = %err,
        "称重操作被拒绝"
    );
    err.into()
}

/// 并发修改: 落库时状态已不是动作开始时的状态
fn stale(weighing_id: &str, action: ActionType, err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::StaleState { .. } => reject(weighing_id, action, WeighingError::Stale),
        other => other.into(),
    }
}

impl WeighingApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        weighing_repo: Arc<WeighingRepository>,
        scale_repo: Arc<ScaleRepository>,
        master_repo: Arc<MasterDataRepository>,
        order_repo: Arc<OrderRepository>,
        picking_repo: Arc<PickingRepository>,
        sequence_repo: Arc<SequenceRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<dyn WeighbridgeConfigReader>,
        scale_reader: Arc<dyn ScaleReader>,
    ) -> Self {
        Self {
            weighing_repo,
            scale_repo,
            master_repo,
            order_repo,
            picking_repo,
            sequence_repo,
            action_log_repo,
            config,
            scale_reader,
            lifecycle: WeighingLifecycleEngine::new(),
            linker: OrderLinker::new(),
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load(&self, weighing_id: &str) -> ApiResult<WeighingRecord> {
        self.weighing_repo
            .find_by_id(weighing_id)?
            .ok_or_else(|| ApiError::NotFound(format!("称重记录(id={})不存在", weighing_id)))
    }

    /// 已关闭的记录不接受关联变更
    fn load_open(&self, weighing_id: &str, action: ActionType) -> ApiResult<WeighingRecord> {
        let record = self.load(weighing_id)?;
        if record.state.is_final() {
            return Err(reject(
                weighing_id,
                action,
                WeighingError::InvalidState {
                    state: record.state,
                },
            ));
        }
        Ok(record)
    }

    fn weighing_log(
        record: &WeighingRecord,
        action: ActionType,
        actor: &str,
        now: NaiveDateTime,
        detail: String,
    ) -> ActionLog {
        ActionLog::new(TargetType::Weighing, &record.weighing_id, action, actor, now)
            .with_payload(&serde_json::json!({
                "state": record.state.as_str(),
                "live_weight": record.live_weight,
                "gross_weight": record.gross_weight,
                "tare_weight": record.tare_weight,
                "net_weight": record.net_weight,
            }))
            .with_detail(detail)
    }

    fn product_name(&self, product_id: Option<&str>) -> ApiResult<String> {
        let name = match product_id {
            Some(id) => self.master_repo.find_product(id)?.map(|p| p.name),
            None => None,
        };
        Ok(name.unwrap_or_else(|| t("common.unknown_product")))
    }

    /// 需要过磅的物料集合
    fn weighable_products<'a>(
        &self,
        product_ids: impl IntoIterator<Item = &'a str>,
    ) -> ApiResult<HashSet<String>> {
        let mut weighable = HashSet::new();
        for id in product_ids {
            if weighable.contains(id) {
                continue;
            }
            if let Some(product) = self.master_repo.find_product(id)? {
                if product.is_weighable {
                    weighable.insert(product.product_id);
                }
            }
        }
        Ok(weighable)
    }

    /// 默认地磅: 显式指定 → 操作员默认 → 操作员首个授权 → 首个启用
    fn resolve_scale(&self, explicit: Option<&str>, actor: &str) -> ApiResult<Option<WeighingScale>> {
        if let Some(scale_id) = explicit {
            return self
                .scale_repo
                .find_scale(scale_id)?
                .map(Some)
                .ok_or_else(|| ApiError::NotFound(format!("地磅(id={})不存在", scale_id)));
        }

        if let Some(operator) = self.scale_repo.find_operator(actor)? {
            let preferred = operator
                .default_scale_id
                .iter()
                .chain(operator.assigned_scale_ids.iter());
            for scale_id in preferred {
                if let Some(scale) = self.scale_repo.find_scale(scale_id)? {
                    return Ok(Some(scale));
                }
            }
        }

        Ok(self.scale_repo.list_enabled_scales()?.into_iter().next())
    }

    /// 状态迁移通用流程: 载入 → 引擎校验/修改 → 记录 + 日志同事务落库
    fn transition<F>(
        &self,
        weighing_id: &str,
        actor: &str,
        action: ActionType,
        apply: F,
    ) -> ApiResult<WeighingRecord>
    where
        F: FnOnce(&mut WeighingRecord, NaiveDateTime) -> ApiResult<String>,
    {
        let mut record = self.load(weighing_id)?;
        let from = record.state;
        let ts = now();
        let detail = apply(&mut record, ts)?;

        let log = Self::weighing_log(&record, action, actor, ts, detail);
        self.weighing_repo
            .update_with_log(&record, from, &log)
            .map_err(|e| stale(weighing_id, action, e))?;

        tracing::info!(
            weighing_id = %record.weighing_id,
            reference = %record.reference,
            action = action.as_str(),
            from = %from,
            to = %record.state,
            actor = %actor,
            "称重状态变更"
        );
        Ok(record)
    }

    // ==========================================
    // 新建
    // ==========================================

    /// 新建称重记录（draft）
    pub fn create_weighing(
        &self,
        req: CreateWeighingRequest,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        if req.truck_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("车辆不能为空".to_string()));
        }
        let truck = self
            .master_repo
            .find_truck(&req.truck_id)?
            .ok_or_else(|| ApiError::NotFound(format!("车辆(id={})不存在", req.truck_id)))?;
        let scale = self.resolve_scale(req.scale_id.as_deref(), actor)?;

        let reference = self
            .sequence_repo
            .next_by_code(SEQ_TRUCK_WEIGHING)?
            .unwrap_or_else(|| NEW_REFERENCE.to_string());

        let ts = now();
        let mut record = WeighingRecord::new_draft(
            uuid::Uuid::new_v4().to_string(),
            reference,
            truck.truck_id.clone(),
            actor.to_string(),
            ts,
        );
        self.linker.link_truck(&mut record, &truck, ts);
        record.scale_id = scale.map(|s| s.scale_id);
        record.product_id = req.product_id;
        record.partner_id = req.partner_id;
        record.notes = req.notes;

        let detail = t_with_args("weighing.created", &[("reference", record.reference.as_str())]);
        let log = Self::weighing_log(&record, ActionType::Create, actor, ts, detail);
        self.weighing_repo.insert_with_log(&record, &log)?;

        tracing::info!(
            weighing_id = %record.weighing_id,
            reference = %record.reference,
            truck = %truck.plate_number,
            scale_id = ?record.scale_id,
            "新建称重记录"
        );
        Ok(record)
    }

    // ==========================================
    // 读数 / 毛重 / 皮重
    // ==========================================

    /// 读取地磅实时重量（不改变状态）
    pub async fn fetch_live_weight(
        &self,
        weighing_id: &str,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        let record = self.load(weighing_id)?;
        let action = ActionType::FetchLiveWeight;
        if record.state.is_final() {
            return Err(reject(
                weighing_id,
                action,
                WeighingError::InvalidState {
                    state: record.state,
                },
            ));
        }

        let found = match record.scale_id.as_deref() {
            Some(id) => self.scale_repo.find_scale(id)?,
            None => None,
        };
        let scale = self
            .lifecycle
            .require_scale(found.as_ref())
            .map_err(|e| reject(weighing_id, action, e))?;

        let weight = match self.scale_reader.read_weight(scale).await {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(
                    weighing_id = %weighing_id,
                    scale = %scale.name,
                    error = %e,
                    "地磅读数失败"
                );
                return Err(e.into());
            }
        };

        // 读数期间记录可能已被其他动作修改: 重新载入，只写实时重量
        let mut record = self.load(weighing_id)?;
        let expected = record.state;
        let ts = now();
        self.lifecycle
            .capture_live(&mut record, weight, ts)
            .map_err(|e| reject(weighing_id, action, e))?;

        let weight_text = format_kg(weight);
        let detail = t_with_args(
            "weighing.live_fetched",
            &[("scale", scale.name.as_str()), ("weight", weight_text.as_str())],
        );
        let log = Self::weighing_log(&record, action, actor, ts, detail);
        self.weighing_repo
            .update_live_weight_with_log(weighing_id, record.live_weight, &ts, expected, &log)
            .map_err(|e| stale(weighing_id, action, e))?;

        tracing::debug!(weighing_id = %weighing_id, scale = %scale.name, weight, "实时重量已读取");
        Ok(record)
    }

    /// 人工/模拟仪表设定读数
    pub fn set_manual_scale_weight(&self, scale_id: &str, weight_kg: f64) -> ApiResult<()> {
        if weight_kg < 0.0 {
            return Err(ApiError::InvalidInput(format!("读数不能为负: {}", weight_kg)));
        }
        self.scale_repo.set_manual_reading(scale_id, weight_kg)?;
        Ok(())
    }

    /// 以实时重量作为毛重
    pub fn set_gross_from_live(&self, weighing_id: &str, actor: &str) -> ApiResult<WeighingRecord> {
        let action = ActionType::SetGross;
        self.transition(weighing_id, actor, action, |record, ts| {
            self.lifecycle
                .capture_gross(record, ts)
                .map_err(|e| reject(weighing_id, action, e))?;
            let weight = format_kg(record.gross_weight);
            Ok(t_with_args("weighing.gross_set", &[("weight", weight.as_str())]))
        })
    }

    /// 以实时重量作为皮重
    pub fn set_tare_from_live(&self, weighing_id: &str, actor: &str) -> ApiResult<WeighingRecord> {
        let action = ActionType::SetTare;
        self.transition(weighing_id, actor, action, |record, ts| {
            self.lifecycle
                .capture_tare(record, ts)
                .map_err(|e| reject(weighing_id, action, e))?;
            let weight = format_kg(record.tare_weight);
            Ok(t_with_args("weighing.tare_set", &[("weight", weight.as_str())]))
        })
    }

    // ==========================================
    // 完成 / 回写库存 / 取消
    // ==========================================

    /// 完成称重（不回写库存单据）
    pub fn complete_weighing(&self, weighing_id: &str, actor: &str) -> ApiResult<WeighingRecord> {
        let action = ActionType::Complete;
        self.transition(weighing_id, actor, action, |record, ts| {
            self.lifecycle
                .complete(record, ts)
                .map_err(|e| reject(weighing_id, action, e))?;
            let weight = format_kg(record.net_weight);
            let product = self.product_name(record.product_id.as_deref())?;
            Ok(t_with_args(
                "weighing.completed",
                &[("weight", weight.as_str()), ("product", product.as_str())],
            ))
        })
    }

    /// 净重回写入库单/出库单并完成称重
    ///
    /// 单据状态推进、明细数量、核对日志、称重状态在同一事务提交
    pub async fn update_inventory(
        &self,
        weighing_id: &str,
        actor: &str,
    ) -> ApiResult<InventoryUpdate> {
        let action = ActionType::UpdateInventory;
        let mut record = self.load(weighing_id)?;
        let expected = record.state;

        let tolerance = self
            .config
            .get_reconcile_tolerance_kg()
            .await
            .map_err(config_error)?;

        let detail = match record.picking_id.as_deref() {
            Some(id) => self.picking_repo.find_detail(id)?,
            None => None,
        };
        let product = self.product_name(record.product_id.as_deref())?;

        let ts = now();
        let plan = ReconciliationEngine::new(tolerance)
            .plan(
                &mut record,
                detail.as_ref(),
                &product,
                uuid::Uuid::new_v4().to_string(),
                ts,
            )
            .map_err(|e| reject(weighing_id, action, e))?;

        let payload = serde_json::json!({
            "picking": plan.picking_name,
            "net_weight": plan.net_weight,
            "demand": plan.demand,
            "status": plan.status,
        });
        let logs = vec![
            Self::weighing_log(&record, action, actor, ts, plan.weighing_note.clone()),
            ActionLog::new(
                TargetType::Picking,
                &plan.writeback.picking_id,
                ActionType::QuantityUpdate,
                actor,
                ts,
            )
            .with_payload(&payload)
            .with_detail(plan.picking_note.clone()),
        ];
        self.picking_repo
            .apply_writeback(&plan.writeback, &record, expected, &logs)
            .map_err(|e| stale(weighing_id, action, e))?;

        tracing::info!(
            weighing_id = %record.weighing_id,
            reference = %record.reference,
            picking = %plan.picking_name,
            net = plan.net_weight,
            demand = plan.demand,
            status = plan.status.as_str(),
            "净重已回写库存单据"
        );
        Ok(InventoryUpdate {
            weighing: record,
            plan,
        })
    }

    /// 取消称重
    pub fn cancel_weighing(&self, weighing_id: &str, actor: &str) -> ApiResult<WeighingRecord> {
        let action = ActionType::Cancel;
        self.transition(weighing_id, actor, action, |record, ts| {
            self.lifecycle
                .cancel(record, ts)
                .map_err(|e| reject(weighing_id, action, e))?;
            Ok(t("weighing.cancelled"))
        })
    }

    // ==========================================
    // 关联单据
    // ==========================================

    /// 新建单据的来源/目的库位
    ///
    /// 销售出库的目的库位优先取客户专属库位
    async fn picking_locations(&self, order: &OrderWithLines) -> ApiResult<PickingLocations> {
        match order.order.kind {
            OrderKind::Purchase => Ok(PickingLocations {
                src: self
                    .config
                    .get_incoming_src_location()
                    .await
                    .map_err(config_error)?,
                dest: self
                    .config
                    .get_incoming_dest_location()
                    .await
                    .map_err(config_error)?,
            }),
            OrderKind::Sale => {
                let src = self
                    .config
                    .get_outgoing_src_location()
                    .await
                    .map_err(config_error)?;
                let customer_location = match order.order.partner_id.as_deref() {
                    Some(id) => self
                        .master_repo
                        .find_partner(id)?
                        .and_then(|p| p.customer_location_id),
                    None => None,
                };
                // 仅接受客户类库位，否则回落到默认客户库位
                let customer_location = match customer_location {
                    Some(loc) => match self.master_repo.find_location(&loc)? {
                        Some(l) if l.usage == LocationUsage::Customer => Some(loc),
                        _ => {
                            tracing::warn!(location_id = %loc, "伙伴库位不是客户库位，使用默认客户库位");
                            None
                        }
                    },
                    None => None,
                };
                let dest = match customer_location {
                    Some(loc) => loc,
                    None => self
                        .config
                        .get_default_customer_location()
                        .await
                        .map_err(config_error)?,
                };
                Ok(PickingLocations { src, dest })
            }
        }
    }

    /// 选择订单: 带出客户/供应商、首个待称重明细，并查找或生成对应的入库/出库单
    pub async fn select_order(
        &self,
        weighing_id: &str,
        order_id: &str,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        let action = ActionType::LinkDocument;
        let mut record = self.load_open(weighing_id, action)?;
        let expected = record.state;
        let order = self
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))?;

        let weighable =
            self.weighable_products(order.lines.iter().map(|l| l.product_id.as_str()))?;
        let ts = now();
        self.linker.link_order(&mut record, &order, &weighable, ts);

        let picking_type = order.order.kind.picking_type();
        let existing = self
            .picking_repo
            .find_open_by_origin(&order.order.order_no, picking_type)?;

        if let Some(picking) = existing {
            self.linker.attach_picking(&mut record, &picking);
            let document = format!("{} / {}", order.order.order_no, picking.name);
            let detail = t_with_args("weighing.linked", &[("document", document.as_str())]);
            let log = Self::weighing_log(&record, action, actor, ts, detail);
            self.weighing_repo
            .update_with_log(&record, expected, &log)
            .map_err(|e| stale(weighing_id, action, e))?;

            tracing::info!(
                weighing_id = %weighing_id,
                order = %order.order.order_no,
                picking = %picking.name,
                "称重记录已关联订单及现有单据"
            );
            return Ok(record);
        }

        let locations = self.picking_locations(&order).await?;
        let seq_code = match picking_type {
            PickingType::Incoming => SEQ_PICKING_INCOMING,
            PickingType::Outgoing => SEQ_PICKING_OUTGOING,
        };
        let picking_id = uuid::Uuid::new_v4().to_string();
        let name = match self.sequence_repo.next_by_code(seq_code)? {
            Some(name) => name,
            None => format!("{}/{}", picking_type.name_prefix(), &picking_id[..8]),
        };
        let (picking, moves) = self.linker.build_picking_from_order(
            &order,
            picking_id,
            name,
            &locations,
            ts,
            || uuid::Uuid::new_v4().to_string(),
        );
        self.linker.attach_picking(&mut record, &picking);

        let created_note = t_with_args(
            "picking.created_from_order",
            &[
                ("picking", picking.name.as_str()),
                ("order", order.order.order_no.as_str()),
            ],
        );
        let document = format!("{} / {}", order.order.order_no, picking.name);
        let linked_note = t_with_args("weighing.linked", &[("document", document.as_str())]);
        let logs = vec![
            ActionLog::new(
                TargetType::Picking,
                &picking.picking_id,
                ActionType::CreatePicking,
                actor,
                ts,
            )
            .with_payload(&serde_json::json!({
                "origin": order.order.order_no,
                "moves": moves.len(),
                "state": picking.state.as_str(),
            }))
            .with_detail(created_note),
            Self::weighing_log(&record, action, actor, ts, linked_note),
        ];
        self.picking_repo
            .create_for_weighing(&picking, &moves, &record, expected, &logs)
            .map_err(|e| stale(weighing_id, action, e))?;

        tracing::info!(
            weighing_id = %weighing_id,
            order = %order.order.order_no,
            picking = %picking.name,
            moves = moves.len(),
            "由订单生成单据并关联称重记录"
        );
        Ok(record)
    }

    /// 选择订单明细: 带出物料与订单
    pub fn select_order_line(
        &self,
        weighing_id: &str,
        line_id: &str,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        let action = ActionType::LinkDocument;
        let mut record = self.load_open(weighing_id, action)?;
        let expected = record.state;
        let line = self
            .order_repo
            .find_line(line_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单明细(id={})不存在", line_id)))?;
        let order = self
            .order_repo
            .find_by_id(&line.order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", line.order_id)))?;

        let ts = now();
        self.linker
            .link_order_line(&mut record, &line, order.order.kind, ts);
        if record.partner_id.is_none() {
            record.partner_id = order.order.partner_id.clone();
        }

        let detail = t_with_args(
            "weighing.linked",
            &[("document", order.order.order_no.as_str())],
        );
        let log = Self::weighing_log(&record, action, actor, ts, detail);
        self.weighing_repo
            .update_with_log(&record, expected, &log)
            .map_err(|e| stale(weighing_id, action, e))?;
        Ok(record)
    }

    /// 选择入库单/出库单: 带出客户、目的库位、首个需过磅物料及其订单明细
    pub fn select_picking(
        &self,
        weighing_id: &str,
        picking_id: &str,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        let action = ActionType::LinkDocument;
        let mut record = self.load_open(weighing_id, action)?;
        let expected = record.state;
        let detail = self
            .picking_repo
            .find_detail(picking_id)?
            .ok_or_else(|| ApiError::NotFound(format!("库存单据(id={})不存在", picking_id)))?;

        let weighable =
            self.weighable_products(detail.moves.iter().map(|m| m.product_id.as_str()))?;
        let line = match self
            .linker
            .first_weighable_move(&detail, &weighable)
            .and_then(|m| m.order_line_id.as_deref())
        {
            Some(line_id) => self.order_repo.find_line(line_id)?,
            None => None,
        };

        let ts = now();
        self.linker
            .link_picking(&mut record, &detail, &weighable, line.as_ref(), ts);

        let note = t_with_args(
            "weighing.linked",
            &[("document", detail.picking.name.as_str())],
        );
        let log = Self::weighing_log(&record, action, actor, ts, note);
        self.weighing_repo
            .update_with_log(&record, expected, &log)
            .map_err(|e| stale(weighing_id, action, e))?;
        Ok(record)
    }

    /// 选择车辆: 带出车牌与司机
    pub fn select_truck(
        &self,
        weighing_id: &str,
        truck_id: &str,
        actor: &str,
    ) -> ApiResult<WeighingRecord> {
        let action = ActionType::LinkDocument;
        let mut record = self.load_open(weighing_id, action)?;
        let expected = record.state;
        let truck = self
            .master_repo
            .find_truck(truck_id)?
            .ok_or_else(|| ApiError::NotFound(format!("车辆(id={})不存在", truck_id)))?;

        let ts = now();
        self.linker.link_truck(&mut record, &truck, ts);
        let detail = t_with_args(
            "weighing.linked",
            &[("document", truck.plate_number.as_str())],
        );
        let log = Self::weighing_log(&record, action, actor, ts, detail);
        self.weighing_repo
            .update_with_log(&record, expected, &log)
            .map_err(|e| stale(weighing_id, action, e))?;
        Ok(record)
    }

    // ==========================================
    // 查看关联单据
    // ==========================================

    pub fn view_linked_order(&self, weighing_id: &str) -> ApiResult<LinkedDocument> {
        let record = self.load(weighing_id)?;
        let order_id = record
            .order_id
            .as_deref()
            .ok_or_else(|| ApiError::from(WeighingError::NoOrderLinked))?;
        let order = self
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))?;

        let model = match order.order.kind {
            OrderKind::Purchase => "purchase.order",
            OrderKind::Sale => "sale.order",
        };
        Ok(LinkedDocument {
            model: model.to_string(),
            id: order.order.order_id,
            name: order.order.order_no,
        })
    }

    pub fn view_linked_picking(&self, weighing_id: &str) -> ApiResult<LinkedDocument> {
        let record = self.load(weighing_id)?;
        let picking_id = record
            .picking_id
            .as_deref()
            .ok_or_else(|| ApiError::from(WeighingError::NoPickingLinked))?;
        let picking = self
            .picking_repo
            .find_by_id(picking_id)?
            .ok_or_else(|| ApiError::NotFound(format!("库存单据(id={})不存在", picking_id)))?;

        Ok(LinkedDocument {
            model: "stock.picking".to_string(),
            id: picking.picking_id,
            name: picking.name,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_weighing(&self, weighing_id: &str) -> ApiResult<WeighingRecord> {
        self.load(weighing_id)
    }

    pub fn list_weighings(&self, filter: &WeighingFilter) -> ApiResult<Vec<WeighingRecord>> {
        Ok(self.weighing_repo.list(filter)?)
    }

    /// 称重记录的操作日志（新 → 旧）
    pub fn list_messages(&self, weighing_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self
            .action_log_repo
            .find_by_target(TargetType::Weighing, weighing_id)?)
    }
}
