// ==========================================
// 地磅称重系统 - 订单/单据关联引擎
// ==========================================
// 选择订单、订单行、单据、车辆时自动带出关联字段
// 订单没有未完成单据时，按剩余数量生成草稿单据并确认
// ==========================================
// 红线: 引擎不拼 SQL；查找/落库由 API 层通过仓储完成
// ==========================================

use crate::domain::inventory::{PickingDetail, StockMove, StockPicking};
use crate::domain::master_data::Truck;
use crate::domain::order::{OrderWithLines, TradeOrderLine};
use crate::domain::types::{OrderKind, PickingState, PickingType};
use crate::domain::weighing::WeighingRecord;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// 新建单据的库位
#[derive(Debug, Clone, PartialEq)]
pub struct PickingLocations {
    pub src: String,
    pub dest: String,
}

// ==========================================
// OrderLinker - 关联引擎
// ==========================================
pub struct OrderLinker {}

impl OrderLinker {
    pub fn new() -> Self {
        Self {}
    }

    /// 选择订单: 带出伙伴，并选中首个有剩余数量的过磅物料行
    ///
    /// 已关联的订单行不属于该订单时，连同它带出的物料一起清除。
    /// 单据由调用方查找或生成后再通过 attach_picking 关联
    pub fn link_order(
        &self,
        record: &mut WeighingRecord,
        order: &OrderWithLines,
        weighable: &HashSet<String>,
        now: NaiveDateTime,
    ) {
        let line_in_order = record
            .order_line_id
            .as_deref()
            .map_or(true, |id| order.lines.iter().any(|l| l.line_id == id));
        if !line_in_order {
            record.order_line_id = None;
            record.product_id = None;
        }

        record.order_kind = Some(order.order.kind);
        record.order_id = Some(order.order.order_id.clone());
        record.partner_id = order.order.partner_id.clone();

        if let Some(line) = self.first_open_weighable_line(order, weighable) {
            record.order_line_id = Some(line.line_id.clone());
            record.product_id = Some(line.product_id.clone());
        }
        record.updated_at = now;
    }

    /// 首个剩余数量 > 0 的过磅物料行
    pub fn first_open_weighable_line<'a>(
        &self,
        order: &'a OrderWithLines,
        weighable: &HashSet<String>,
    ) -> Option<&'a TradeOrderLine> {
        order
            .lines
            .iter()
            .filter(|l| weighable.contains(&l.product_id))
            .find(|l| l.remaining_qty() > 0.0)
    }

    /// 关联单据（查找到的或新生成的）
    pub fn attach_picking(&self, record: &mut WeighingRecord, picking: &StockPicking) {
        record.picking_id = Some(picking.picking_id.clone());
        if picking.location_dest_id.is_some() {
            record.location_dest_id = picking.location_dest_id.clone();
        }
    }

    /// 由订单生成单据: 每个剩余数量 > 0 的订单行一个库存移动（需求 = 剩余数量）
    ///
    /// 有移动时确认单据 (draft → confirmed)，否则保持草稿
    pub fn build_picking_from_order(
        &self,
        order: &OrderWithLines,
        picking_id: String,
        name: String,
        locations: &PickingLocations,
        now: NaiveDateTime,
        mut next_move_id: impl FnMut() -> String,
    ) -> (StockPicking, Vec<StockMove>) {
        let moves: Vec<StockMove> = order
            .lines
            .iter()
            .filter(|l| l.remaining_qty() > 0.0)
            .map(|l| StockMove {
                move_id: next_move_id(),
                picking_id: picking_id.clone(),
                product_id: l.product_id.clone(),
                demand_qty: l.remaining_qty(),
                order_line_id: Some(l.line_id.clone()),
            })
            .collect();

        let state = if moves.is_empty() {
            PickingState::Draft
        } else {
            PickingState::Confirmed
        };

        let picking = StockPicking {
            picking_id,
            name,
            picking_type: order.order.kind.picking_type(),
            state,
            partner_id: order.order.partner_id.clone(),
            origin: Some(order.order.order_no.clone()),
            location_src_id: Some(locations.src.clone()),
            location_dest_id: Some(locations.dest.clone()),
            scheduled_date: Some(now),
            created_at: now,
        };
        (picking, moves)
    }

    /// 选择订单行: 带出物料与订单
    pub fn link_order_line(
        &self,
        record: &mut WeighingRecord,
        line: &TradeOrderLine,
        kind: OrderKind,
        now: NaiveDateTime,
    ) {
        record.order_line_id = Some(line.line_id.clone());
        record.order_id = Some(line.order_id.clone());
        record.order_kind = Some(kind);
        record.product_id = Some(line.product_id.clone());
        record.updated_at = now;
    }

    /// 单据中首个过磅物料的库存移动
    pub fn first_weighable_move<'a>(
        &self,
        detail: &'a PickingDetail,
        weighable: &HashSet<String>,
    ) -> Option<&'a StockMove> {
        detail
            .moves
            .iter()
            .find(|m| weighable.contains(&m.product_id))
    }

    /// 选择单据: 带出伙伴、目的库位、物料；移动来自订单行时一并带出订单
    ///
    /// 换到另一张单据时，先清除上一张单据带出的订单行与物料
    pub fn link_picking(
        &self,
        record: &mut WeighingRecord,
        detail: &PickingDetail,
        weighable: &HashSet<String>,
        line: Option<&TradeOrderLine>,
        now: NaiveDateTime,
    ) {
        let picking = &detail.picking;
        let switched = record
            .picking_id
            .as_deref()
            .map_or(false, |id| id != picking.picking_id);
        if switched {
            record.order_line_id = None;
            record.product_id = None;
        }
        self.attach_picking(record, picking);
        record.partner_id = picking.partner_id.clone();
        record.order_kind = Some(match picking.picking_type {
            PickingType::Incoming => OrderKind::Purchase,
            PickingType::Outgoing => OrderKind::Sale,
        });

        if let Some(m) = self.first_weighable_move(detail, weighable) {
            record.product_id = Some(m.product_id.clone());
            if let Some(line) = line.filter(|l| m.order_line_id.as_deref() == Some(l.line_id.as_str())) {
                record.order_line_id = Some(line.line_id.clone());
                record.order_id = Some(line.order_id.clone());
            }
        }
        record.updated_at = now;
    }

    /// 选择车辆: 带出车牌与司机
    pub fn link_truck(&self, record: &mut WeighingRecord, truck: &Truck, now: NaiveDateTime) {
        record.truck_id = truck.truck_id.clone();
        record.truck_plate = Some(truck.plate_number.clone());
        if truck.driver_name.is_some() {
            record.driver_name = truck.driver_name.clone();
        }
        record.updated_at = now;
    }
}

impl Default for OrderLinker {
    fn default() -> Self {
        Self::new()
    }
}
