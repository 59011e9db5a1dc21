// ==========================================
// 地磅称重系统 - 收发货数量核对引擎
// ==========================================
// 净重 → 入库单/出库单明细数量，并与需求数量比对
// 红线: 引擎只生成回写计划，不拼 SQL；提交由仓储层单事务完成
// ==========================================
// 输入: WeighingRecord (tare 状态) + PickingDetail
// 输出: ReconciliationPlan (QuantityWriteback + 核对结果 + 日志正文)
// ==========================================

use crate::domain::inventory::{PickingDetail, QuantityWriteback, StockMoveLine};
use crate::domain::types::{DeliveryStatus, PickingType, WeighingState};
use crate::domain::weighing::{round_kg, WeighingRecord};
use crate::engine::error::{WeighingError, WeighingResult};
use crate::i18n::{format_kg, t, t_with_args};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 净重与需求数量比对（差值按 0.001 KG 取整后比较）
///
/// - 净重 - 需求 > 容差 → Over
/// - 需求 - 净重 > 容差 → Under
/// - 其他 → Exact
pub fn classify_delivery(net: f64, demand: f64, tolerance: f64) -> DeliveryStatus {
    let delta = round_kg(net - demand);
    if delta > tolerance {
        DeliveryStatus::Over { delta_kg: delta }
    } else if -delta > tolerance {
        DeliveryStatus::Under { delta_kg: -delta }
    } else {
        DeliveryStatus::Exact
    }
}

/// 核对结果文本（随当前语言）
pub fn status_text(status: &DeliveryStatus) -> String {
    match status {
        DeliveryStatus::Over { delta_kg } => {
            t_with_args("status.over", &[("delta", format_kg(*delta_kg).as_str())])
        }
        DeliveryStatus::Under { delta_kg } => {
            t_with_args("status.under", &[("delta", format_kg(*delta_kg).as_str())])
        }
        DeliveryStatus::Exact => t("status.exact"),
    }
}

// ==========================================
// ReconciliationPlan - 回写计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub writeback: QuantityWriteback,
    pub picking_type: PickingType,
    pub picking_name: String,
    pub demand: f64,
    pub net_weight: f64,
    pub status: DeliveryStatus,
    pub picking_note: String,  // 记在入库单/出库单上
    pub weighing_note: String, // 记在称重记录上
}

// ==========================================
// ReconciliationEngine - 核对引擎
// ==========================================
pub struct ReconciliationEngine {
    tolerance_kg: f64,
}

impl ReconciliationEngine {
    pub fn new(tolerance_kg: f64) -> Self {
        Self {
            tolerance_kg: tolerance_kg.max(0.0),
        }
    }

    /// 生成回写计划
    ///
    /// 前置条件（按顺序）:
    /// 1) state = tare 且净重 > 0
    /// 2) 已选择物料
    /// 3) 已关联单据，且单据未关闭
    /// 4) 单据中存在该物料的库存移动
    ///
    /// 全部通过后才把 record 置为 done；任何拒绝都不修改 record
    #[instrument(skip_all, fields(weighing_id = %record.weighing_id))]
    pub fn plan(
        &self,
        record: &mut WeighingRecord,
        picking: Option<&PickingDetail>,
        product_name: &str,
        new_line_id: String,
        now: NaiveDateTime,
    ) -> WeighingResult<ReconciliationPlan> {
        if record.state != WeighingState::Tare || record.net_weight <= 0.0 {
            return Err(WeighingError::CannotUpdateInventory {
                state: record.state,
                net: record.net_weight,
            });
        }
        let product_id = record
            .product_id
            .clone()
            .ok_or(WeighingError::ProductRequired)?;

        let expected_type = if record.is_sale() {
            PickingType::Outgoing
        } else {
            PickingType::Incoming
        };
        let detail = match (picking, record.picking_id.as_deref()) {
            (Some(d), Some(id)) if d.picking.picking_id == id => d,
            _ => {
                return Err(WeighingError::PickingRequired {
                    picking_type: expected_type,
                })
            }
        };
        if !detail.picking.state.is_open() {
            return Err(WeighingError::PickingClosed {
                picking: detail.picking.name.clone(),
            });
        }

        let stock_move = detail.move_for_product(&product_id).ok_or_else(|| {
            WeighingError::ProductNotInPicking {
                product: product_name.to_string(),
                picking: detail.picking.name.clone(),
            }
        })?;

        // 已有明细全部覆盖；没有明细则新建一条
        let existing: Vec<String> = detail
            .lines_of_move(&stock_move.move_id)
            .iter()
            .map(|l| l.move_line_id.clone())
            .collect();
        let net = record.net_weight;
        let new_line = if existing.is_empty() {
            Some(StockMoveLine {
                move_line_id: new_line_id,
                move_id: stock_move.move_id.clone(),
                picking_id: detail.picking.picking_id.clone(),
                product_id: product_id.clone(),
                quantity: net,
                location_src_id: detail.picking.location_src_id.clone(),
                location_dest_id: detail.picking.location_dest_id.clone(),
            })
        } else {
            None
        };

        let demand = stock_move.demand_qty;
        let status = classify_delivery(net, demand, self.tolerance_kg);
        let picking_type = detail.picking.picking_type;

        let args = [
            ("net", format_kg(net)),
            ("product", product_name.to_string()),
            ("demand", format_kg(demand)),
            ("status", status_text(&status)),
            ("reference", record.reference.clone()),
        ];
        let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let weight = format_kg(net);
        let summary = [("weight", weight.as_str()), ("product", product_name)];
        let (picking_note, weighing_note) = match picking_type {
            PickingType::Incoming => (
                t_with_args("picking.received", &args),
                t_with_args("weighing.receipt_updated", &summary),
            ),
            PickingType::Outgoing => (
                t_with_args("picking.delivered", &args),
                t_with_args("weighing.delivery_updated", &summary),
            ),
        };

        let writeback = QuantityWriteback {
            picking_id: detail.picking.picking_id.clone(),
            picking_state: detail.picking.state.ready_for_quantities(),
            move_id: stock_move.move_id.clone(),
            quantity: net,
            update_line_ids: existing,
            new_line,
        };

        tracing::debug!(
            picking = %detail.picking.name,
            net = net,
            demand = demand,
            status = status.as_str(),
            "生成净重回写计划"
        );

        record.state = WeighingState::Done;
        record.updated_at = now;

        Ok(ReconciliationPlan {
            writeback,
            picking_type,
            picking_name: detail.picking.name.clone(),
            demand,
            net_weight: net,
            status,
            picking_note,
            weighing_note,
        })
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(0.0)
    }
}
