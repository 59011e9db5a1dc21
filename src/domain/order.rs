// ==========================================
// 地磅称重系统 - 采购/销售订单领域模型
// ==========================================
// 采购单与销售单共用一套结构，按 OrderKind 区分
// processed_qty: 采购=已收数量，销售=已发数量
// ==========================================

use crate::domain::types::{OrderKind, OrderState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// TradeOrder - 订单头
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOrder {
    pub order_id: String,
    pub order_no: String,
    pub kind: OrderKind,
    pub partner_id: Option<String>,
    pub state: OrderState,
    pub amount_total: f64,
    pub created_at: NaiveDateTime,
}

// ==========================================
// TradeOrderLine - 订单行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOrderLine {
    pub line_id: String,
    pub order_id: String,
    pub product_id: String,
    pub ordered_qty: f64,
    pub processed_qty: f64,
}

impl TradeOrderLine {
    /// 剩余未收/未发数量
    pub fn remaining_qty(&self) -> f64 {
        self.ordered_qty - self.processed_qty
    }
}

// ==========================================
// OrderWithLines - 订单 + 订单行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    pub order: TradeOrder,
    pub lines: Vec<TradeOrderLine>,
}

impl OrderWithLines {
    /// 剩余数量合计（仅统计正数）
    pub fn pending_qty(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.remaining_qty())
            .filter(|q| *q > 0.0)
            .sum()
    }
}
