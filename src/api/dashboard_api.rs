// ==========================================
// 地磅称重系统 - 看板 API
// ==========================================
// 职责: 只读聚合（状态计数、今日完成、待称重单据、单据称重汇总）
// 红线: 不修改任何数据
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::inventory::PickingToWeigh;
use crate::domain::order::OrderWithLines;
use crate::domain::types::{OrderKind, PickingType, WeighingState};
use crate::repository::{
    MasterDataRepository, OrderRepository, PickingRepository, WeighingRepository,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// ==========================================
// 返回类型
// ==========================================

/// 看板计数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardData {
    pub draft_count: i64,
    pub gross_count: i64,
    pub tare_count: i64,
    pub done_today: i64,
    pub total_weight_today: f64,
}

/// 待称重清单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingWeighing {
    pub purchases: Vec<OrderWithLines>,
    pub receipts: Vec<PickingToWeigh>,
    pub sales: Vec<OrderWithLines>,
    pub deliveries: Vec<PickingToWeigh>,
}

/// 订单类汇总（采购 / 销售）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderOverview {
    pub count: usize,
    pub total_amount: f64,
    pub pending_qty: f64,
    pub partners: Vec<String>,
}

/// 单据类汇总（入库 / 出库）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickingOverview {
    pub count: usize,
    pub total_qty: f64,
    pub urgent_count: usize, // 计划日期不晚于今天
    pub partners: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewData {
    pub dashboard: DashboardData,
    pub purchases: OrderOverview,
    pub receipts: PickingOverview,
    pub sales: OrderOverview,
    pub deliveries: PickingOverview,
}

/// 订单称重汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderWeighingSummary {
    pub order_id: String,
    pub weighing_count: i64,
    pub total_net_weight: f64,
    pub has_weighable_products: bool,
}

/// 订单明细称重汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineWeighingSummary {
    pub line_id: String,
    pub weighing_count: i64,
    pub total_processed_weight: f64,
}

/// 库存单据称重汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickingWeighingSummary {
    pub picking_id: String,
    pub weighing_count: i64,
    pub has_weighable_products: bool,
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    weighing_repo: Arc<WeighingRepository>,
    order_repo: Arc<OrderRepository>,
    picking_repo: Arc<PickingRepository>,
    master_repo: Arc<MasterDataRepository>,
}

impl DashboardApi {
    pub fn new(
        weighing_repo: Arc<WeighingRepository>,
        order_repo: Arc<OrderRepository>,
        picking_repo: Arc<PickingRepository>,
        master_repo: Arc<MasterDataRepository>,
    ) -> Self {
        Self {
            weighing_repo,
            order_repo,
            picking_repo,
            master_repo,
        }
    }

    /// 状态计数 + 今日完成（weighing_date >= today 00:00）
    pub fn get_dashboard_data(&self, today: NaiveDate) -> ApiResult<DashboardData> {
        let since = today.and_time(NaiveTime::MIN);
        let done = self.weighing_repo.done_stats_since(&since)?;

        let data = DashboardData {
            draft_count: self.weighing_repo.count_by_state(WeighingState::Draft)?,
            gross_count: self.weighing_repo.count_by_state(WeighingState::Gross)?,
            tare_count: self.weighing_repo.count_by_state(WeighingState::Tare)?,
            done_today: done.count,
            total_weight_today: done.total_net_weight,
        };
        tracing::debug!(?data, "看板计数");
        Ok(data)
    }

    // ==========================================
    // 待称重清单
    // ==========================================

    /// 已确认、含需过磅物料、尚无称重记录的采购单
    pub fn list_purchases_to_weigh(&self) -> ApiResult<Vec<OrderWithLines>> {
        Ok(self.order_repo.list_to_weigh(OrderKind::Purchase)?)
    }

    pub fn list_sales_to_weigh(&self) -> ApiResult<Vec<OrderWithLines>> {
        Ok(self.order_repo.list_to_weigh(OrderKind::Sale)?)
    }

    /// 已确认/可用、含需过磅物料、尚无称重记录的入库单
    pub fn list_receipts_to_weigh(&self) -> ApiResult<Vec<PickingToWeigh>> {
        Ok(self.picking_repo.list_to_weigh(PickingType::Incoming)?)
    }

    pub fn list_deliveries_to_weigh(&self) -> ApiResult<Vec<PickingToWeigh>> {
        Ok(self.picking_repo.list_to_weigh(PickingType::Outgoing)?)
    }

    pub fn get_pending_weighing(&self) -> ApiResult<PendingWeighing> {
        Ok(PendingWeighing {
            purchases: self.list_purchases_to_weigh()?,
            receipts: self.list_receipts_to_weigh()?,
            sales: self.list_sales_to_weigh()?,
            deliveries: self.list_deliveries_to_weigh()?,
        })
    }

    // ==========================================
    // 总览
    // ==========================================

    pub fn get_overview_data(&self, today: NaiveDate) -> ApiResult<OverviewData> {
        let pending = self.get_pending_weighing()?;
        Ok(OverviewData {
            dashboard: self.get_dashboard_data(today)?,
            purchases: self.order_overview(&pending.purchases)?,
            receipts: self.picking_overview(&pending.receipts, today)?,
            sales: self.order_overview(&pending.sales)?,
            deliveries: self.picking_overview(&pending.deliveries, today)?,
        })
    }

    fn order_overview(&self, orders: &[OrderWithLines]) -> ApiResult<OrderOverview> {
        let partners =
            self.partner_names(orders.iter().filter_map(|o| o.order.partner_id.as_deref()))?;
        Ok(OrderOverview {
            count: orders.len(),
            total_amount: orders.iter().map(|o| o.order.amount_total).sum(),
            pending_qty: orders.iter().map(|o| o.pending_qty()).sum(),
            partners,
        })
    }

    fn picking_overview(
        &self,
        pickings: &[PickingToWeigh],
        today: NaiveDate,
    ) -> ApiResult<PickingOverview> {
        let partners = self.partner_names(
            pickings
                .iter()
                .filter_map(|p| p.picking.partner_id.as_deref()),
        )?;
        let urgent_count = pickings
            .iter()
            .filter(|p| {
                p.picking
                    .scheduled_date
                    .map(|d| d.date() <= today)
                    .unwrap_or(false)
            })
            .count();
        Ok(PickingOverview {
            count: pickings.len(),
            total_qty: pickings.iter().map(|p| p.total_demand).sum(),
            urgent_count,
            partners,
        })
    }

    /// 去重后的伙伴名称（按名称排序）
    fn partner_names<'a>(&self, ids: impl Iterator<Item = &'a str>) -> ApiResult<Vec<String>> {
        let ids: BTreeSet<&str> = ids.collect();
        let mut names = BTreeSet::new();
        for id in ids {
            let name = self
                .master_repo
                .find_partner(id)?
                .map(|p| p.name)
                .unwrap_or_else(|| id.to_string());
            names.insert(name);
        }
        Ok(names.into_iter().collect())
    }

    // ==========================================
    // 单据称重汇总
    // ==========================================

    pub fn get_order_summary(&self, order_id: &str) -> ApiResult<OrderWeighingSummary> {
        let stats = self.weighing_repo.done_stats_by_order(order_id)?;
        Ok(OrderWeighingSummary {
            order_id: order_id.to_string(),
            weighing_count: stats.count,
            total_net_weight: stats.total_net_weight,
            has_weighable_products: self.order_repo.has_weighable_lines(order_id)?,
        })
    }

    pub fn get_order_line_summary(&self, line_id: &str) -> ApiResult<OrderLineWeighingSummary> {
        let stats = self.weighing_repo.done_stats_by_order_line(line_id)?;
        Ok(OrderLineWeighingSummary {
            line_id: line_id.to_string(),
            weighing_count: stats.count,
            total_processed_weight: stats.total_net_weight,
        })
    }

    pub fn get_picking_summary(&self, picking_id: &str) -> ApiResult<PickingWeighingSummary> {
        Ok(PickingWeighingSummary {
            picking_id: picking_id.to_string(),
            weighing_count: self.weighing_repo.count_by_picking(picking_id)?,
            has_weighable_products: self.picking_repo.has_weighable_moves(picking_id)?,
        })
    }
}
